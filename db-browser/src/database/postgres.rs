//! PostgreSQL database provider implementation
//!
//! Row statements have the server render each row with `row_to_json`, so every
//! column type (numerics, network addresses, money, ranges, arrays, composites)
//! arrives as the server prints it and numerics keep all of their digits.

use crate::database::codec::BindValue;
use crate::database::export::CsvSink;
use crate::database::identifier::TableRef;
use crate::database::statement::{self, Statement};
use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::schema::{ColumnInfo, Row};
use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{PgPool, Row as _};

/// PostgreSQL database provider
pub struct PostgresProvider {
    pool: PgPool,
}

impl PostgresProvider {
    /// Create a new PostgreSQL provider
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Column names of a table in declaration order
    async fn column_names(&self, table: &TableRef) -> Result<Vec<String>, DatabaseError> {
        let query = r#"
            SELECT a.attname::text
            FROM pg_catalog.pg_attribute a
            JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            WHERE n.nspname = $1
              AND c.relname = $2
              AND a.attnum > 0
              AND NOT a.attisdropped
            ORDER BY a.attnum
        "#;

        let names = sqlx::query_scalar(query)
            .bind(&table.schema)
            .bind(&table.table)
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    /// Attach every parameter of a built statement to a query
    ///
    /// Not kept in the connection's statement cache: a cached plan outlives
    /// `ALTER TABLE` and fails with "cached plan must not change result type".
    fn bind_statement(statement: &Statement) -> Query<'_, Postgres, PgArguments> {
        statement.parameters.iter().fold(
            sqlx::query(&statement.sql).persistent(false),
            |query, value| match value {
                BindValue::Integer(integer) => query.bind(*integer),
                BindValue::Field(document) => query.bind(Json(document)),
            },
        )
    }

    /// The JSON object the server rendered for a row, keyed in column order
    fn row_to_json(row: &PgRow) -> Result<Row, sqlx::Error> {
        let Json(document) = row.try_get::<Json<Row>, _>(0)?;
        Ok(document)
    }
}

#[async_trait]
impl DatabaseProvider for PostgresProvider {
    async fn list_schemas(&self) -> Result<Vec<String>, DatabaseError> {
        let query = r#"
            SELECT schema_name::text
            FROM information_schema.schemata
            ORDER BY schema_name
        "#;

        let schemas = sqlx::query_scalar(query).fetch_all(&self.pool).await?;
        Ok(schemas)
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, DatabaseError> {
        let query = r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = $1
            ORDER BY table_name
        "#;

        let tables = sqlx::query_scalar(query)
            .bind(schema)
            .fetch_all(&self.pool)
            .await?;
        Ok(tables)
    }

    async fn list_columns(&self, table: &TableRef) -> Result<Vec<ColumnInfo>, DatabaseError> {
        // Primary key membership comes from the PRIMARY KEY constraint only, so a
        // column that is also part of a foreign key or unique constraint appears once.
        let query = r#"
            SELECT
                c.column_name::text AS column_name,
                c.data_type::text AS data_type,
                c.is_nullable::text AS is_nullable,
                c.column_default::text AS column_default,
                EXISTS (
                    SELECT 1
                    FROM information_schema.table_constraints tc
                    JOIN information_schema.key_column_usage kcu
                      ON tc.constraint_name = kcu.constraint_name
                      AND tc.table_schema = kcu.table_schema
                      AND tc.table_name = kcu.table_name
                    WHERE tc.constraint_type = 'PRIMARY KEY'
                      AND kcu.table_schema = c.table_schema
                      AND kcu.table_name = c.table_name
                      AND kcu.column_name = c.column_name
                ) AS is_primary_key
            FROM information_schema.columns c
            WHERE c.table_schema = $1
              AND c.table_name = $2
            ORDER BY c.ordinal_position
        "#;

        let rows = sqlx::query(query)
            .bind(&table.schema)
            .bind(&table.table)
            .fetch_all(&self.pool)
            .await?;

        let columns = rows
            .iter()
            .map(|row| {
                let is_nullable: String = row.try_get("is_nullable")?;

                Ok(ColumnInfo {
                    name: row.try_get("column_name")?,
                    data_type: row.try_get("data_type")?,
                    is_nullable: is_nullable == "YES",
                    default_expression: row.try_get("column_default")?,
                    is_primary_key: row.try_get("is_primary_key")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(columns)
    }

    async fn list_rows(
        &self,
        table: &TableRef,
        page: u64,
        limit: u64,
    ) -> Result<Vec<Row>, DatabaseError> {
        let statement = statement::select_page(table, page, limit)?;
        tracing::debug!(sql = %statement.sql, "listing rows");

        let rows = Self::bind_statement(&statement)
            .fetch_all(&self.pool)
            .await?;

        let rows = rows
            .iter()
            .map(Self::row_to_json)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn insert_row(&self, table: &TableRef, row: Row) -> Result<Row, DatabaseError> {
        let statement = statement::insert(table, &row)?;
        tracing::debug!(sql = %statement.sql, "inserting row");

        let inserted = Self::bind_statement(&statement)
            .fetch_optional(&self.pool)
            .await?;

        match inserted {
            Some(inserted) => Ok(Self::row_to_json(&inserted)?),
            None => Ok(row),
        }
    }

    async fn update_row(
        &self,
        table: &TableRef,
        primary_key_column: &str,
        primary_key_value: Value,
        row: Row,
    ) -> Result<Row, DatabaseError> {
        let statement = statement::update(table, primary_key_column, &primary_key_value, &row)?;
        tracing::debug!(sql = %statement.sql, "updating row");

        let updated = Self::bind_statement(&statement)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(updated) => Ok(Self::row_to_json(&updated)?),
            None => Ok(row),
        }
    }

    async fn delete_row(
        &self,
        table: &TableRef,
        primary_key_column: &str,
        primary_key_value: Value,
    ) -> Result<(), DatabaseError> {
        let statement = statement::delete(table, primary_key_column, &primary_key_value)?;
        tracing::debug!(sql = %statement.sql, "deleting row");

        let result = Self::bind_statement(&statement)
            .execute(&self.pool)
            .await?;
        tracing::debug!(rows_affected = result.rows_affected(), "row delete finished");

        Ok(())
    }

    async fn export_rows(&self, table: &TableRef, sink: &mut CsvSink) -> Result<(), DatabaseError> {
        let sql = statement::select_all(table)?;
        tracing::debug!(sql = %sql, "exporting rows");

        let mut rows = sqlx::query(&sql).persistent(false).fetch(&self.pool);

        match rows.try_next().await? {
            Some(first) => {
                let first = Self::row_to_json(&first)?;
                sink.write_header(first.keys()).await?;
                sink.write_row(first.values()).await?;
            }
            None => {
                // Empty table: the header comes from the catalog
                drop(rows);
                let columns = self.column_names(table).await?;
                return sink.write_header(columns.iter()).await;
            }
        }

        while let Some(row) = rows.try_next().await? {
            sink.write_row(Self::row_to_json(&row)?.values()).await?;
        }

        Ok(())
    }

    async fn execute_query(&self, sql: &str) -> Result<(), DatabaseError> {
        sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(())
    }
}
