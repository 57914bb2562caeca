use async_trait::async_trait;
use log::info;

use crate::errors::DdlError;
use crate::models::connections::{platform_from_url, ConnectionConfig};
use crate::models::schema::Reference;

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySqlSource;
pub use postgres::PostgresSource;
pub use sqlite::SqliteSource;

/// A column as the catalog reports it, before type mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    /// Native type name without size arguments, e.g. `varchar`.
    pub type_name: String,
    pub size: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: bool,
    pub default: Option<String>,
    pub auto_increment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawForeignKey {
    /// `None` when the database keeps no constraint names, e.g. SQLite.
    pub name: Option<String>,
    pub foreign_table: String,
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIndex {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

/// Catalog access of one live database.
///
/// Every call runs its own queries on pooled connections, which go back to the
/// pool when the call returns, on success and on error alike.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>, DdlError>;
    async fn columns(&self, table: &str) -> Result<Vec<RawColumn>, DdlError>;
    /// Primary key column names in key order; empty when the table has none.
    async fn primary_key(&self, table: &str) -> Result<Vec<String>, DdlError>;
    async fn foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>, DdlError>;
    /// Indexes other than the primary key index.
    async fn indexes(&self, table: &str) -> Result<Vec<RawIndex>, DdlError>;
    /// Runs `query` with `name` bound to its single parameter; true when it returns a row.
    async fn name_exists(&self, query: &str, name: &str) -> Result<bool, DdlError>;
    async fn execute(&self, statement: &str) -> Result<(), DdlError>;
    async fn close(&self);
}

/// Opens the metadata source matching the scheme of `config.database_url`.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn MetadataSource>, DdlError> {
    let driver = platform_from_url(&config.database_url)?;
    info!("Connecting {} metadata source", driver);
    let source: Box<dyn MetadataSource> = match driver {
        "postgresql" => Box::new(
            PostgresSource::connect(&config.database_url, config.schema.clone()).await?,
        ),
        "mysql" => Box::new(
            MySqlSource::connect(&config.database_url, config.schema.clone()).await?,
        ),
        "sqlite" => Box::new(SqliteSource::connect(&config.database_url).await?),
        other => {
            return Err(DdlError::Config(format!(
                "no metadata source for {}",
                other
            )))
        }
    };
    Ok(source)
}

/// One catalog row per foreign key column pair.
#[derive(Debug, Clone)]
pub(crate) struct ForeignKeyRow {
    pub key: String,
    pub name: Option<String>,
    pub foreign_table: String,
    pub local: String,
    pub foreign: String,
}

/// Groups rows by constraint, keeping the order in which constraints first appear.
pub(crate) fn group_foreign_keys(rows: Vec<ForeignKeyRow>) -> Vec<RawForeignKey> {
    let mut keys: Vec<String> = Vec::new();
    let mut grouped: Vec<RawForeignKey> = Vec::new();
    for row in rows {
        let reference = Reference {
            local: row.local,
            foreign: row.foreign,
        };
        match keys.iter().position(|k| *k == row.key) {
            Some(i) => grouped[i].references.push(reference),
            None => {
                keys.push(row.key);
                grouped.push(RawForeignKey {
                    name: row.name,
                    foreign_table: row.foreign_table,
                    references: vec![reference],
                });
            }
        }
    }
    grouped
}

/// Groups `(index, unique, column)` rows by index, keeping first-appearance order.
pub(crate) fn group_indexes(rows: Vec<(String, bool, String)>) -> Vec<RawIndex> {
    let mut grouped: Vec<RawIndex> = Vec::new();
    for (name, unique, column) in rows {
        match grouped.iter_mut().find(|index| index.name == name) {
            Some(index) => index.columns.push(column),
            None => grouped.push(RawIndex {
                name,
                unique,
                columns: vec![column],
            }),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, local: &str, foreign: &str) -> ForeignKeyRow {
        ForeignKeyRow {
            key: key.to_string(),
            name: Some(key.to_string()),
            foreign_table: "ORDERS".to_string(),
            local: local.to_string(),
            foreign: foreign.to_string(),
        }
    }

    #[test]
    fn test_group_foreign_keys_keeps_pair_order() {
        let grouped = group_foreign_keys(vec![
            row("fk_b", "order_id", "id"),
            row("fk_a", "tenant", "tenant"),
            row("fk_a", "order_no", "no"),
        ]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].name.as_deref(), Some("fk_b"));
        let locals: Vec<&str> = grouped[1].references.iter().map(|r| r.local.as_str()).collect();
        assert_eq!(locals, vec!["tenant", "order_no"]);
    }

    #[test]
    fn test_group_indexes() {
        let grouped = group_indexes(vec![
            ("idx_name".to_string(), false, "last".to_string()),
            ("idx_name".to_string(), false, "first".to_string()),
            ("uq_email".to_string(), true, "email".to_string()),
        ]);
        assert_eq!(
            grouped,
            vec![
                RawIndex {
                    name: "idx_name".to_string(),
                    unique: false,
                    columns: vec!["last".to_string(), "first".to_string()],
                },
                RawIndex {
                    name: "uq_email".to_string(),
                    unique: true,
                    columns: vec!["email".to_string()],
                },
            ]
        );
    }
}
