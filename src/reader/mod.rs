use std::collections::HashSet;

use log::{debug, info, warn};

use crate::db::{MetadataSource, RawColumn, RawIndex};
use crate::errors::DdlError;
use crate::models::schema::{Column, Database, ForeignKey, Index, NameCase, Table};
use crate::models::types::ColumnType;
use crate::platform::Platform;

/// Tables to read. An empty `include` list means every table.
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl TableFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: tables.into_iter().map(Into::into).collect(),
            exclude: Vec::new(),
        }
    }

    pub fn excluding<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(tables.into_iter().map(Into::into));
        self
    }

    pub fn accepts(&self, table: &str, case: NameCase) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|t| case.eq(t, table));
        included && !self.exclude.iter().any(|t| case.eq(t, table))
    }
}

/// A model read from a live database plus the tables that could not be read.
#[derive(Debug)]
pub struct ReadOutcome {
    pub database: Database,
    /// One `DdlError::MetadataRead` per failed table.
    pub errors: Vec<DdlError>,
}

impl ReadOutcome {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Builds schema models from the catalog of one database, applying the
/// platform's type map, name rules and table exclusions.
pub struct ModelReader<'a> {
    platform: &'a Platform,
    source: &'a dyn MetadataSource,
}

impl<'a> ModelReader<'a> {
    pub fn new(platform: &'a Platform, source: &'a dyn MetadataSource) -> Self {
        Self { platform, source }
    }

    /// Reads every accepted table into a database named `name`.
    ///
    /// Failing to list the tables is fatal; a table that fails to read is
    /// reported in [`ReadOutcome::errors`] and left out of the model.
    pub async fn read_database(
        &self,
        name: &str,
        filter: &TableFilter,
    ) -> Result<ReadOutcome, DdlError> {
        let (tables, errors) = self.read_tables(filter).await?;
        let mut database = Database {
            name: name.to_string(),
            tables,
        };
        self.prune_dangling_foreign_keys(&mut database);
        self.platform.validate(&database)?;
        info!(
            "Read {} tables from {} ({} failed)",
            database.tables.len(),
            self.platform.name(),
            errors.len()
        );
        Ok(ReadOutcome { database, errors })
    }

    pub async fn read_tables(
        &self,
        filter: &TableFilter,
    ) -> Result<(Vec<Table>, Vec<DdlError>), DdlError> {
        let case = self.platform.name_case();
        let names = self.source.list_tables().await?;

        let mut tables = Vec::new();
        let mut errors = Vec::new();
        for name in names.iter().filter(|name| filter.accepts(name, case)) {
            match self.read_table(name).await {
                Ok(Some(table)) => tables.push(table),
                Ok(None) => {}
                Err(e) => {
                    warn!("Skipping table {}: {}", name, e);
                    errors.push(match e {
                        DdlError::MetadataRead { .. } => e,
                        other => DdlError::metadata_read(name.as_str(), other.to_string()),
                    });
                }
            }
        }
        Ok((tables, errors))
    }

    /// Reads one table; `None` when the platform excludes it.
    pub async fn read_table(&self, name: &str) -> Result<Option<Table>, DdlError> {
        if self.is_table_excluded(name).await? {
            debug!("Table {} excluded by {}", name, self.platform.name());
            return Ok(None);
        }

        let case = self.platform.name_case();
        let columns = self.read_columns(name).await?;
        let mut primary_key = Vec::new();
        for key in self.read_primary_key(name).await? {
            let column = columns.iter().find(|c| case.eq(&c.name, &key)).ok_or_else(|| {
                DdlError::metadata_read(name, format!("primary key column {} not found", key))
            })?;
            primary_key.push(column.name.clone());
        }
        let foreign_keys = self.read_foreign_keys(name).await?;
        let indexes = self.read_indexes(name, &foreign_keys).await?;

        let mut table = Table {
            name: name.to_string(),
            columns,
            primary_key: Vec::new(),
            foreign_keys,
            indexes,
        };
        table.set_primary_key(primary_key, case);
        Ok(Some(table))
    }

    /// System catalogs by name, or tables sitting in the recycle bin.
    pub async fn is_table_excluded(&self, name: &str) -> Result<bool, DdlError> {
        let dialect = self.platform.dialect();
        if (dialect.is_table_excluded)(name) {
            return Ok(true);
        }
        match dialect.recycle_bin_query {
            Some(query) => self.source.name_exists(query, name).await,
            None => Ok(false),
        }
    }

    pub async fn read_columns(&self, table: &str) -> Result<Vec<Column>, DdlError> {
        self.source
            .columns(table)
            .await?
            .into_iter()
            .map(|raw| self.to_column(table, raw))
            .collect()
    }

    fn to_column(&self, table: &str, raw: RawColumn) -> Result<Column, DdlError> {
        let dialect = self.platform.dialect();
        let raw = (dialect.normalize_column)(raw);
        let logical = dialect.type_map.logical_type(&raw.type_name).ok_or_else(|| {
            DdlError::metadata_read(
                table,
                format!("unknown native type {} of column {}", raw.type_name, raw.name),
            )
        })?;
        let column_type = ColumnType {
            logical,
            size: raw.size,
            scale: raw.scale,
        };
        Ok(Column {
            name: raw.name,
            column_type: column_type.normalized(),
            nullable: raw.nullable,
            default: raw.default,
            auto_increment: raw.auto_increment,
            primary_key: false,
        })
    }

    pub async fn read_primary_key(&self, table: &str) -> Result<Vec<String>, DdlError> {
        self.source.primary_key(table).await
    }

    pub async fn read_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>, DdlError> {
        Ok(self
            .source
            .foreign_keys(table)
            .await?
            .into_iter()
            .map(|raw| ForeignKey {
                name: raw.name,
                foreign_table: raw.foreign_table,
                references: raw.references,
            })
            .collect())
    }

    /// Indexes of `table`, without those the database keeps for its foreign keys.
    pub async fn read_indexes(
        &self,
        table: &str,
        foreign_keys: &[ForeignKey],
    ) -> Result<Vec<Index>, DdlError> {
        let case = self.platform.name_case();
        let indexes = self.source.indexes(table).await?;
        Ok(indexes
            .into_iter()
            .filter(|index| {
                !foreign_keys
                    .iter()
                    .filter_map(|fk| fk.name.as_deref())
                    .any(|fk| case.eq(fk, &index.name))
            })
            .map(|RawIndex { name, unique, columns }| Index {
                name: Some(name),
                columns,
                unique,
            })
            .collect())
    }

    /// Drops foreign keys whose referenced table or columns were not read.
    fn prune_dangling_foreign_keys(&self, database: &mut Database) {
        let case = self.platform.name_case();
        let mut known: HashSet<(String, String)> = HashSet::new();
        for table in &database.tables {
            for column in &table.columns {
                known.insert((case.key(&table.name), case.key(&column.name)));
            }
        }
        for table in &mut database.tables {
            let table_name = table.name.clone();
            table.foreign_keys.retain(|fk| {
                let resolved = fk
                    .references
                    .iter()
                    .all(|r| known.contains(&(case.key(&fk.foreign_table), case.key(&r.foreign))));
                if !resolved {
                    warn!(
                        "Dropping foreign key {} of {}: {} was not read",
                        fk.display_name(),
                        table_name,
                        fk.foreign_table
                    );
                }
                resolved
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::sink::Statements;
    use crate::db::{RawColumn, RawForeignKey, RawIndex};
    use crate::models::schema::Reference;
    use crate::models::types::LogicalType;
    use crate::platform::{PlatformConfig, PlatformRegistry};
    use async_trait::async_trait;
    use mockall::{mock, predicate};

    mock! {
        pub Source {}

        #[async_trait]
        impl MetadataSource for Source {
            async fn list_tables(&self) -> Result<Vec<String>, DdlError>;
            async fn columns(&self, table: &str) -> Result<Vec<RawColumn>, DdlError>;
            async fn primary_key(&self, table: &str) -> Result<Vec<String>, DdlError>;
            async fn foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>, DdlError>;
            async fn indexes(&self, table: &str) -> Result<Vec<RawIndex>, DdlError>;
            async fn name_exists(&self, query: &str, name: &str) -> Result<bool, DdlError>;
            async fn execute(&self, statement: &str) -> Result<(), DdlError>;
            async fn close(&self);
        }
    }

    fn raw(name: &str, type_name: &str, size: Option<u32>, default: Option<&str>) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            type_name: type_name.to_string(),
            size,
            scale: None,
            nullable: true,
            default: default.map(str::to_string),
            auto_increment: false,
        }
    }

    fn platform(name: &str) -> std::sync::Arc<Platform> {
        PlatformRegistry::with_builtins(PlatformConfig::default())
            .lookup(name)
            .unwrap()
    }

    /// USERS(id, email) and ORDERS(id, user_id -> USERS.id) as PostgreSQL reports them.
    fn shop_source() -> MockSource {
        let mut source = MockSource::new();
        source
            .expect_list_tables()
            .returning(|| Ok(vec!["ORDERS".to_string(), "USERS".to_string()]));
        source.expect_columns().returning(|table| {
            Ok(match table {
                "USERS" => vec![
                    raw("id", "integer", None, Some("nextval('users_id_seq'::regclass)")),
                    raw("email", "character varying", Some(255), Some("''::character varying")),
                ],
                _ => vec![
                    raw("id", "integer", None, None),
                    raw("user_id", "integer", None, None),
                ],
            })
        });
        source
            .expect_primary_key()
            .returning(|_| Ok(vec!["id".to_string()]));
        source.expect_foreign_keys().returning(|table| {
            Ok(match table {
                "ORDERS" => vec![RawForeignKey {
                    name: Some("fk_user".to_string()),
                    foreign_table: "USERS".to_string(),
                    references: vec![Reference {
                        local: "user_id".to_string(),
                        foreign: "id".to_string(),
                    }],
                }],
                _ => Vec::new(),
            })
        });
        source.expect_indexes().returning(|table| {
            Ok(match table {
                "USERS" => vec![RawIndex {
                    name: "idx_email".to_string(),
                    unique: true,
                    columns: vec!["email".to_string()],
                }],
                _ => vec![RawIndex {
                    name: "fk_user".to_string(),
                    unique: false,
                    columns: vec!["user_id".to_string()],
                }],
            })
        });
        source
    }

    #[tokio::test]
    async fn test_read_database_normalizes_postgres_columns() {
        let platform = platform("postgresql");
        let source = shop_source();
        let outcome = platform
            .reader(&source)
            .read_database("shop", &TableFilter::all())
            .await
            .unwrap();

        assert!(outcome.is_complete());
        let users = outcome.database.find_table("USERS").unwrap();
        let id = users.find_column("id").unwrap();
        assert!(id.primary_key && id.auto_increment && !id.nullable);
        assert_eq!(id.default, None);

        let email = users.find_column("email").unwrap();
        assert_eq!(email.column_type, ColumnType::sized(LogicalType::VarChar, 255));
        assert_eq!(email.default.as_deref(), Some("''"));
        assert_eq!(
            users.indexes,
            vec![Index::new(["email"]).named("idx_email").unique()]
        );

        let orders = outcome.database.find_table("ORDERS").unwrap();
        assert_eq!(orders.foreign_keys.len(), 1);
        assert!(orders.indexes.is_empty());
    }

    #[tokio::test]
    async fn test_table_filter() {
        let platform = platform("postgresql");
        let source = shop_source();
        let outcome = platform
            .reader(&source)
            .read_database("shop", &TableFilter::all().excluding(["users"]))
            .await
            .unwrap();

        let names: Vec<&str> = outcome.database.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ORDERS"]);
        // The foreign key to the unread USERS table is pruned.
        assert!(outcome.database.tables[0].foreign_keys.is_empty());

        assert!(TableFilter::only(["USERS"]).accepts("users", NameCase::Insensitive));
        assert!(!TableFilter::only(["USERS"]).accepts("users", NameCase::Sensitive));
    }

    #[tokio::test]
    async fn test_recycle_bin_table_is_absent() {
        let platform = platform("oracle10");
        let mut source = MockSource::new();
        source
            .expect_name_exists()
            .with(
                predicate::eq("SELECT OBJECT_NAME FROM RECYCLEBIN WHERE OBJECT_NAME = ?"),
                predicate::always(),
            )
            .returning(|_, name| Ok(name == "OLD_ORDERS"));
        source
            .expect_columns()
            .with(predicate::eq("ORDERS"))
            .returning(|_| {
                Ok(vec![
                    raw("ID", "NUMBER", Some(10), None),
                    raw("NOTE", "VARCHAR2", Some(200), None),
                ])
            });
        source
            .expect_primary_key()
            .returning(|_| Ok(vec!["ID".to_string()]));
        source.expect_foreign_keys().returning(|_| Ok(Vec::new()));
        source.expect_indexes().returning(|_| Ok(Vec::new()));

        let reader = platform.reader(&source);
        assert!(reader.read_table("OLD_ORDERS").await.unwrap().is_none());

        let orders = reader.read_table("ORDERS").await.unwrap().unwrap();
        assert_eq!(orders.columns[0].column_type, ColumnType::new(LogicalType::Integer));
        assert_eq!(
            orders.columns[1].column_type,
            ColumnType::sized(LogicalType::VarChar, 200)
        );
        assert_eq!(orders.primary_key_names(), vec!["ID"]);
    }

    #[tokio::test]
    async fn test_composite_primary_key_keeps_key_order() {
        let platform = platform("postgresql");
        let mut source = MockSource::new();
        source.expect_columns().returning(|_| {
            Ok(vec![
                raw("a", "integer", None, None),
                raw("b", "integer", None, None),
                raw("note", "text", None, None),
            ])
        });
        source
            .expect_primary_key()
            .returning(|_| Ok(vec!["B".to_string(), "A".to_string()]));
        source.expect_foreign_keys().returning(|_| Ok(Vec::new()));
        source.expect_indexes().returning(|_| Ok(Vec::new()));

        let table = platform.reader(&source).read_table("T").await.unwrap().unwrap();
        assert_eq!(table.primary_key_names(), vec!["b", "a"]);
        assert!(table.columns[0].primary_key && !table.columns[0].nullable);
        assert!(!table.columns[2].primary_key);

        let mut sink = Statements::default();
        platform.builder(&mut sink).create_table(&table).unwrap();
        assert!(sink.as_slice()[0].contains("PRIMARY KEY (\"b\", \"a\")"));
    }

    #[tokio::test]
    async fn test_recycle_bin_only_checked_on_oracle10() {
        let platform = platform("oracle9");
        let mut source = MockSource::new();
        source.expect_name_exists().never();
        source.expect_columns().returning(|_| Ok(Vec::new()));
        source.expect_primary_key().returning(|_| Ok(Vec::new()));
        source.expect_foreign_keys().returning(|_| Ok(Vec::new()));
        source.expect_indexes().returning(|_| Ok(Vec::new()));

        let reader = platform.reader(&source);
        assert!(reader.read_table("OLD_ORDERS").await.unwrap().is_some());
        assert!(reader.read_table("BIN$abc==$0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_table_does_not_stop_siblings() {
        let platform = platform("sqlite");
        let mut source = MockSource::new();
        source.expect_list_tables().returning(|| {
            Ok(vec![
                "BROKEN".to_string(),
                "ORDERS".to_string(),
                "sqlite_sequence".to_string(),
            ])
        });
        source.expect_columns().returning(|table| match table {
            "BROKEN" => Err(DdlError::Connection("connection reset".to_string())),
            _ => Ok(vec![
                raw("id", "INTEGER", None, None),
                raw("broken_id", "INTEGER", None, None),
            ]),
        });
        source
            .expect_primary_key()
            .returning(|_| Ok(vec!["id".to_string()]));
        source.expect_foreign_keys().returning(|_| {
            Ok(vec![RawForeignKey {
                name: None,
                foreign_table: "BROKEN".to_string(),
                references: vec![Reference {
                    local: "broken_id".to_string(),
                    foreign: "id".to_string(),
                }],
            }])
        });
        source.expect_indexes().returning(|_| Ok(Vec::new()));

        let outcome = platform
            .reader(&source)
            .read_database("shop", &TableFilter::all())
            .await
            .unwrap();

        assert_eq!(outcome.database.tables.len(), 1);
        assert!(outcome.database.tables[0].foreign_keys.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        match &outcome.errors[0] {
            DdlError::MetadataRead { table, message } => {
                assert_eq!(table, "BROKEN");
                assert!(message.contains("connection reset"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_native_type_fails_the_table() {
        let platform = platform("postgresql");
        let mut source = MockSource::new();
        source
            .expect_columns()
            .returning(|_| Ok(vec![raw("doc", "tsvector", None, None)]));

        match platform.reader(&source).read_table("DOCS").await {
            Err(DdlError::MetadataRead { table, message }) => {
                assert_eq!(table, "DOCS");
                assert!(message.contains("tsvector"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let platform = platform("mysql");
        let mut source = MockSource::new();
        source
            .expect_list_tables()
            .returning(|| Err(DdlError::Connection("refused".to_string())));

        let result = platform
            .reader(&source)
            .read_database("shop", &TableFilter::all())
            .await;
        assert!(matches!(result, Err(DdlError::Connection(_))));
    }
}
