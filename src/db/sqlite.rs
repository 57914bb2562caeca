use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, Executor, Row, SqlitePool};

use crate::errors::DdlError;
use crate::models::schema::Reference;
use crate::platform::typemap::parse_type_declaration;

use super::{group_indexes, MetadataSource, RawColumn, RawForeignKey, RawIndex};

/// Reads `sqlite_master` and the table-valued pragmas of one SQLite database.
pub struct SqliteSource {
    pub pool: SqlitePool,
}

impl SqliteSource {
    pub async fn connect(database_url: &str) -> Result<Self, DdlError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .map_err(|e| DdlError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Only a table declared with `AUTOINCREMENT` keeps a monotonic row id.
    async fn declares_autoincrement(&self, table: &str) -> Result<bool, DdlError> {
        let sql = sqlx::query_scalar::<_, Option<String>>(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await
        .map_err(DdlError::Sqlx)?
        .flatten();
        Ok(sql
            .map(|sql| sql.to_ascii_uppercase().contains("AUTOINCREMENT"))
            .unwrap_or(false))
    }
}

#[async_trait]
impl MetadataSource for SqliteSource {
    async fn list_tables(&self) -> Result<Vec<String>, DdlError> {
        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(DdlError::Sqlx)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(DdlError::Sqlx))
            .collect()
    }

    async fn columns(&self, table: &str) -> Result<Vec<RawColumn>, DdlError> {
        let rows = sqlx::query(
            r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(DdlError::Sqlx)?;

        let key_columns = rows
            .iter()
            .filter(|row| row.try_get::<i64, _>("pk").unwrap_or(0) > 0)
            .count();
        let autoincrement = key_columns == 1 && self.declares_autoincrement(table).await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let declared: String = row.try_get("type")?;
            let (type_name, size, scale) = parse_type_declaration(&declared);
            let in_key = row.try_get::<i64, _>("pk")? > 0;
            columns.push(RawColumn {
                name: row.try_get("name")?,
                auto_increment: autoincrement && in_key && type_name.eq_ignore_ascii_case("INTEGER"),
                type_name,
                size,
                scale,
                nullable: row.try_get::<i64, _>("notnull")? == 0,
                default: row.try_get("dflt_value")?,
            });
        }
        Ok(columns)
    }

    async fn primary_key(&self, table: &str) -> Result<Vec<String>, DdlError> {
        let rows = sqlx::query("SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk")
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(DdlError::Sqlx)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(DdlError::Sqlx))
            .collect()
    }

    /// SQLite keeps no foreign key names; a missing referenced column means the referenced primary key.
    async fn foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>, DdlError> {
        let rows = sqlx::query(
            r#"SELECT id, seq, "table", "from", "to" FROM pragma_foreign_key_list(?1) ORDER BY id, seq"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(DdlError::Sqlx)?;

        let mut ids: Vec<i64> = Vec::new();
        let mut foreign_keys: Vec<RawForeignKey> = Vec::new();
        for row in &rows {
            let id: i64 = row.try_get("id")?;
            let seq: i64 = row.try_get("seq")?;
            let foreign_table: String = row.try_get("table")?;
            let foreign = match row.try_get::<Option<String>, _>("to")? {
                Some(column) => column,
                None => self
                    .primary_key(&foreign_table)
                    .await?
                    .into_iter()
                    .nth(usize::try_from(seq).unwrap_or(0))
                    .unwrap_or_default(),
            };
            let reference = Reference {
                local: row.try_get("from")?,
                foreign,
            };
            match ids.iter().position(|known| *known == id) {
                Some(i) => foreign_keys[i].references.push(reference),
                None => {
                    ids.push(id);
                    foreign_keys.push(RawForeignKey {
                        name: None,
                        foreign_table,
                        references: vec![reference],
                    });
                }
            }
        }
        Ok(foreign_keys)
    }

    /// Explicitly created indexes; those backing primary keys and unique constraints are skipped.
    async fn indexes(&self, table: &str) -> Result<Vec<RawIndex>, DdlError> {
        let rows = sqlx::query(
            r#"
            SELECT il.name AS index_name, il."unique" AS is_unique, ii.name AS column_name
            FROM pragma_index_list(?1) AS il
            JOIN pragma_index_info(il.name) AS ii
            WHERE il.origin = 'c'
            ORDER BY il.name, ii.seqno
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(DdlError::Sqlx)?;

        let mut index_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let Some(column) = row.try_get::<Option<String>, _>("column_name")? else {
                continue;
            };
            index_rows.push((
                row.try_get::<String, _>("index_name")?,
                row.try_get::<i64, _>("is_unique")? != 0,
                column,
            ));
        }
        Ok(group_indexes(index_rows))
    }

    async fn name_exists(&self, query: &str, name: &str) -> Result<bool, DdlError> {
        let row = sqlx::query(query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(DdlError::Sqlx)?;
        Ok(row.is_some())
    }

    async fn execute(&self, statement: &str) -> Result<(), DdlError> {
        self.pool.execute(statement).await.map_err(DdlError::Sqlx)?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
