use async_trait::async_trait;
use sqlx::{mysql::MySqlPoolOptions, Executor, MySqlPool, Row};

use crate::errors::DdlError;
use crate::platform::typemap::parse_type_declaration;

use super::{
    group_foreign_keys, group_indexes, ForeignKeyRow, MetadataSource, RawColumn, RawForeignKey,
    RawIndex,
};

/// Reads `information_schema` of one MySQL/MariaDB database, the connection's
/// current database unless another one is configured.
pub struct MySqlSource {
    pub pool: MySqlPool,
    schema: Option<String>,
}

impl MySqlSource {
    pub async fn connect(database_url: &str, schema: Option<String>) -> Result<Self, DdlError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
            .map_err(|e| DdlError::Connection(e.to_string()))?;

        Ok(Self { pool, schema })
    }
}

/// MySQL reports string and date defaults unquoted; expression defaults are flagged in `EXTRA`.
fn quote_default(data_type: &str, extra: &str, value: String) -> String {
    let literal = matches!(
        data_type.to_ascii_lowercase().as_str(),
        "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "date" | "time"
            | "datetime" | "timestamp"
    );
    let generated = extra.to_ascii_uppercase().contains("DEFAULT_GENERATED")
        || value.to_ascii_uppercase().starts_with("CURRENT_TIMESTAMP");
    if literal && !generated && !value.starts_with('\'') {
        format!("'{}'", value.replace('\'', "''"))
    } else {
        value
    }
}

#[async_trait]
impl MetadataSource for MySqlSource {
    async fn list_tables(&self) -> Result<Vec<String>, DdlError> {
        let query = r#"
            SELECT CAST(TABLE_NAME AS CHAR) AS table_name
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;
        let rows = sqlx::query(query)
            .bind(self.schema.as_deref())
            .fetch_all(&self.pool)
            .await
            .map_err(DdlError::Sqlx)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("table_name").map_err(DdlError::Sqlx))
            .collect()
    }

    async fn columns(&self, table: &str) -> Result<Vec<RawColumn>, DdlError> {
        let query = r#"
            SELECT CAST(COLUMN_NAME AS CHAR) AS column_name,
                   CAST(COLUMN_TYPE AS CHAR) AS column_type,
                   CAST(DATA_TYPE AS CHAR) AS data_type,
                   CAST(IS_NULLABLE AS CHAR) AS is_nullable,
                   CAST(COLUMN_DEFAULT AS CHAR) AS column_default,
                   CAST(EXTRA AS CHAR) AS extra
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;
        let rows = sqlx::query(query)
            .bind(self.schema.as_deref())
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(DdlError::Sqlx)?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let column_type: String = row.try_get("column_type")?;
            let data_type: String = row.try_get("data_type")?;
            let extra: String = row.try_get::<Option<String>, _>("extra")?.unwrap_or_default();
            let (type_name, size, scale) = parse_type_declaration(&column_type);
            let suffix = column_type
                .rsplit_once(')')
                .map(|(_, rest)| rest.trim())
                .unwrap_or_default();
            let type_name = if suffix.is_empty() {
                type_name
            } else {
                format!("{} {}", type_name, suffix)
            };
            columns.push(RawColumn {
                name: row.try_get("column_name")?,
                type_name,
                size,
                scale,
                nullable: row.try_get::<String, _>("is_nullable")? == "YES",
                default: row
                    .try_get::<Option<String>, _>("column_default")?
                    .map(|value| quote_default(&data_type, &extra, value)),
                auto_increment: extra.to_ascii_lowercase().contains("auto_increment"),
            });
        }
        Ok(columns)
    }

    async fn primary_key(&self, table: &str) -> Result<Vec<String>, DdlError> {
        let query = r#"
            SELECT CAST(COLUMN_NAME AS CHAR) AS column_name
            FROM information_schema.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ?
              AND CONSTRAINT_NAME = 'PRIMARY'
            ORDER BY ORDINAL_POSITION
        "#;
        let rows = sqlx::query(query)
            .bind(self.schema.as_deref())
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(DdlError::Sqlx)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("column_name").map_err(DdlError::Sqlx))
            .collect()
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>, DdlError> {
        let query = r#"
            SELECT CAST(CONSTRAINT_NAME AS CHAR) AS name,
                   CAST(REFERENCED_TABLE_NAME AS CHAR) AS foreign_table,
                   CAST(COLUMN_NAME AS CHAR) AS local_column,
                   CAST(REFERENCED_COLUMN_NAME AS CHAR) AS foreign_column
            FROM information_schema.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ?
              AND REFERENCED_TABLE_NAME IS NOT NULL
            ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION
        "#;
        let rows = sqlx::query(query)
            .bind(self.schema.as_deref())
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(DdlError::Sqlx)?;

        let mut fk_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get("name")?;
            fk_rows.push(ForeignKeyRow {
                key: name.clone(),
                name: Some(name),
                foreign_table: row.try_get("foreign_table")?,
                local: row.try_get("local_column")?,
                foreign: row.try_get("foreign_column")?,
            });
        }
        Ok(group_foreign_keys(fk_rows))
    }

    async fn indexes(&self, table: &str) -> Result<Vec<RawIndex>, DdlError> {
        let query = r#"
            SELECT CAST(INDEX_NAME AS CHAR) AS index_name,
                   CAST(NON_UNIQUE AS SIGNED) AS non_unique,
                   CAST(COLUMN_NAME AS CHAR) AS column_name
            FROM information_schema.STATISTICS
            WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ?
              AND INDEX_NAME <> 'PRIMARY'
            ORDER BY INDEX_NAME, SEQ_IN_INDEX
        "#;
        let rows = sqlx::query(query)
            .bind(self.schema.as_deref())
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(DdlError::Sqlx)?;

        let mut index_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            // Functional key parts have no column name.
            let Some(column) = row.try_get::<Option<String>, _>("column_name")? else {
                continue;
            };
            index_rows.push((
                row.try_get::<String, _>("index_name")?,
                row.try_get::<i64, _>("non_unique")? == 0,
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
