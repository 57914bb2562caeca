use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Executor, PgPool, Row};

use crate::errors::DdlError;

use super::{
    group_foreign_keys, group_indexes, ForeignKeyRow, MetadataSource, RawColumn, RawForeignKey,
    RawIndex,
};

const DEFAULT_SCHEMA: &str = "public";

/// Reads PostgreSQL catalogs of one schema.
pub struct PostgresSource {
    pub pool: PgPool,
    schema: String,
}

impl PostgresSource {
    pub async fn connect(database_url: &str, schema: Option<String>) -> Result<Self, DdlError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
            .map_err(|e| DdlError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            schema: schema.unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
        })
    }
}

#[async_trait]
impl MetadataSource for PostgresSource {
    async fn list_tables(&self) -> Result<Vec<String>, DdlError> {
        let query = r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = $1 AND table_type = 'BASE TABLE'
            ORDER BY table_name
        "#;
        let rows = sqlx::query(query)
            .bind(&self.schema)
            .fetch_all(&self.pool)
            .await
            .map_err(DdlError::Sqlx)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("table_name").map_err(DdlError::Sqlx))
            .collect()
    }

    async fn columns(&self, table: &str) -> Result<Vec<RawColumn>, DdlError> {
        let query = r#"
            SELECT column_name::text AS column_name,
                   CASE WHEN data_type = 'USER-DEFINED' THEN udt_name::text
                        ELSE data_type::text END AS data_type,
                   COALESCE(character_maximum_length,
                            CASE WHEN data_type IN ('numeric', 'decimal')
                                 THEN numeric_precision END)::int4 AS size,
                   CASE WHEN data_type IN ('numeric', 'decimal')
                        THEN numeric_scale END::int4 AS scale,
                   is_nullable::text AS is_nullable,
                   column_default::text AS column_default,
                   is_identity::text AS is_identity
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
        "#;
        let rows = sqlx::query(query)
            .bind(&self.schema)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(DdlError::Sqlx)?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            columns.push(RawColumn {
                name: row.try_get("column_name")?,
                type_name: row.try_get("data_type")?,
                size: row
                    .try_get::<Option<i32>, _>("size")?
                    .and_then(|v| u32::try_from(v).ok()),
                scale: row
                    .try_get::<Option<i32>, _>("scale")?
                    .and_then(|v| u32::try_from(v).ok()),
                nullable: row.try_get::<String, _>("is_nullable")? == "YES",
                default: row.try_get("column_default")?,
                auto_increment: row.try_get::<Option<String>, _>("is_identity")?.as_deref()
                    == Some("YES"),
            });
        }
        Ok(columns)
    }

    async fn primary_key(&self, table: &str) -> Result<Vec<String>, DdlError> {
        let query = r#"
            SELECT a.attname::text AS column_name
            FROM pg_catalog.pg_index i
            JOIN pg_catalog.pg_class t ON t.oid = i.indrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
            CROSS JOIN LATERAL unnest(i.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
            JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
            WHERE i.indisprimary AND n.nspname = $1 AND t.relname = $2
            ORDER BY k.ord
        "#;
        let rows = sqlx::query(query)
            .bind(&self.schema)
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
            SELECT c.conname::text AS name,
                   ft.relname::text AS foreign_table,
                   la.attname::text AS local_column,
                   fa.attname::text AS foreign_column
            FROM pg_catalog.pg_constraint c
            JOIN pg_catalog.pg_class t ON t.oid = c.conrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_catalog.pg_class ft ON ft.oid = c.confrelid
            CROSS JOIN LATERAL unnest(c.conkey, c.confkey)
                WITH ORDINALITY AS k(local_attnum, foreign_attnum, ord)
            JOIN pg_catalog.pg_attribute la
                ON la.attrelid = c.conrelid AND la.attnum = k.local_attnum
            JOIN pg_catalog.pg_attribute fa
                ON fa.attrelid = c.confrelid AND fa.attnum = k.foreign_attnum
            WHERE c.contype = 'f' AND n.nspname = $1 AND t.relname = $2
            ORDER BY c.conname, k.ord
        "#;
        let rows = sqlx::query(query)
            .bind(&self.schema)
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
            SELECT ic.relname::text AS index_name,
                   i.indisunique AS is_unique,
                   a.attname::text AS column_name
            FROM pg_catalog.pg_index i
            JOIN pg_catalog.pg_class t ON t.oid = i.indrelid
            JOIN pg_catalog.pg_class ic ON ic.oid = i.indexrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
            CROSS JOIN LATERAL unnest(i.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
            JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
            WHERE NOT i.indisprimary AND n.nspname = $1 AND t.relname = $2
            ORDER BY ic.relname, k.ord
        "#;
        let rows = sqlx::query(query)
            .bind(&self.schema)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(DdlError::Sqlx)?;

        let mut index_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            index_rows.push((
                row.try_get::<String, _>("index_name")?,
                row.try_get::<bool, _>("is_unique")?,
                row.try_get::<String, _>("column_name")?,
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
