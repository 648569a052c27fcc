//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient`
//! trait for SQLite database files using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{
    Column, ColumnInfo, DatabaseBackend, DatabaseClient, ForeignKey, QueryResult, Row, Schema,
    Table, Value, MAX_ROWS, QUERY_TIMEOUT_SECS, SAMPLE_ROWS,
};
use crate::error::{Result, SqlChatError};
use crate::statement::{self, StatementShape};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens an existing database file and validates it with `SELECT 1`.
    ///
    /// A missing file is a connection error rather than an empty new database.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        if config.database.trim().is_empty() {
            return Err(SqlChatError::config("Database file path is required"));
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.database)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| {
                SqlChatError::connection(format!(
                    "Cannot open database file '{}': {e}",
                    config.database
                ))
            })?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| SqlChatError::connection(e.to_string()))?;

        info!("Connected to {}", config.display_string());
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        let table_names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SqlChatError::query(format!("Failed to fetch tables: {e}")))?;

        let mut tables = Vec::with_capacity(table_names.len());
        let mut foreign_keys = Vec::new();

        for name in table_names {
            let (columns, primary_key) = self.fetch_columns(&name).await?;
            foreign_keys.extend(self.fetch_foreign_keys(&name).await?);
            let sample_rows = self.fetch_sample_rows(&name, &primary_key).await?;

            tables.push(Table {
                name,
                columns,
                primary_key,
                sample_rows,
            });
        }

        Ok(Schema {
            tables,
            foreign_keys,
        })
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();
        let timeout = Duration::from_secs(QUERY_TIMEOUT_SECS);
        let shape = statement::classify(sql, DatabaseBackend::Sqlite);
        debug!("Executing {shape} statement");

        if shape == StatementShape::Effect {
            warn!("Executing statement that modifies the database: {sql}");
            let done = tokio::time::timeout(timeout, sqlx::query(sql).execute(&self.pool))
                .await
                .map_err(|_| timed_out())?
                .map_err(|e| SqlChatError::query(format_query_error(e)))?;

            return Ok(QueryResult::affected(done.rows_affected())
                .with_execution_time(start.elapsed()));
        }

        let result = tokio::time::timeout(timeout, sqlx::query(sql).fetch_all(&self.pool))
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| SqlChatError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        let columns = match result.first() {
            Some(first_row) => column_info(first_row.columns()),
            None => match (&self.pool).describe(sql).await {
                Ok(described) => column_info(described.columns()),
                Err(_) => Vec::new(),
            },
        };

        let total_rows = result.len();
        let was_truncated = total_rows > MAX_ROWS;

        if was_truncated {
            warn!(
                "Query returned {} rows, truncating to {} rows",
                total_rows, MAX_ROWS
            );
        }

        let rows: Vec<Row> = result.iter().take(MAX_ROWS).map(convert_row).collect();
        let row_count = rows.len();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            row_count,
            total_rows: Some(total_rows),
            was_truncated,
            rows_affected: None,
        })
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteClient {
    /// Fetches columns and primary key columns for a table.
    async fn fetch_columns(&self, table_name: &str) -> Result<(Vec<Column>, Vec<String>)> {
        let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid"#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            SqlChatError::query(format!("Failed to fetch columns for {table_name}: {e}"))
        })?;

        let mut pk: Vec<(i64, String)> = rows
            .iter()
            .filter(|(_, _, _, _, pk)| *pk > 0)
            .map(|(name, _, _, _, pk)| (*pk, name.clone()))
            .collect();
        pk.sort();

        let columns = rows
            .into_iter()
            .map(|(name, data_type, not_null, default, _)| Column {
                name,
                data_type,
                is_nullable: not_null == 0,
                default,
            })
            .collect();

        Ok((columns, pk.into_iter().map(|(_, name)| name).collect()))
    }

    /// Fetches the outgoing foreign keys of a table.
    async fn fetch_foreign_keys(&self, table_name: &str) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(i64, String, String, Option<String>)> = sqlx::query_as(
            r#"SELECT id, "table", "from", "to" FROM pragma_foreign_key_list(?) ORDER BY id, seq"#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            SqlChatError::query(format!("Failed to fetch foreign keys for {table_name}: {e}"))
        })?;

        let mut grouped: Vec<(i64, ForeignKey)> = Vec::new();
        for (id, to_table, from_column, to_column) in rows {
            // A missing target column refers to the target's primary key
            let to_column = to_column.unwrap_or_default();
            match grouped.last_mut() {
                Some((last_id, fk)) if *last_id == id => {
                    fk.from_columns.push(from_column);
                    fk.to_columns.push(to_column);
                }
                _ => grouped.push((
                    id,
                    ForeignKey::new(table_name, vec![from_column], to_table, vec![to_column]),
                )),
            }
        }

        Ok(grouped.into_iter().map(|(_, fk)| fk).collect())
    }

    /// Reads the first few rows of a table, in primary key order when it has one.
    async fn fetch_sample_rows(
        &self,
        table_name: &str,
        primary_key: &[String],
    ) -> Result<Vec<Row>> {
        let sql = sample_rows_sql(table_name, primary_key);

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                SqlChatError::query(format!("Failed to fetch sample rows for {table_name}: {e}"))
            })?;

        Ok(rows.iter().map(convert_row).collect())
    }
}

/// Quotes a SQLite identifier with double quotes.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sample_rows_sql(table_name: &str, primary_key: &[String]) -> String {
    let order_by = if primary_key.is_empty() {
        String::new()
    } else {
        let columns: Vec<String> = primary_key.iter().map(|c| quote_identifier(c)).collect();
        format!(" ORDER BY {}", columns.join(", "))
    };
    format!(
        "SELECT * FROM {}{order_by} LIMIT {SAMPLE_ROWS}",
        quote_identifier(table_name)
    )
}

fn timed_out() -> SqlChatError {
    SqlChatError::query(format!(
        "Query timed out after {QUERY_TIMEOUT_SECS} seconds"
    ))
}

fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => format!("ERROR: {}", db_error.message()),
        None => error.to_string(),
    }
}

fn column_info<C: SqlxColumn>(columns: &[C]) -> Vec<ColumnInfo> {
    columns
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect()
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.len()).map(|i| convert_value(row, i)).collect()
}

/// Converts a single value by its runtime storage class.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    let value = match storage_class.as_str() {
        "INTEGER" => row.try_get_unchecked::<i64, _>(index).ok().map(Value::Int),
        "REAL" => row.try_get_unchecked::<f64, _>(index).ok().map(Value::Float),
        "BLOB" => row.try_get_unchecked::<Vec<u8>, _>(index).ok().map(Value::Bytes),
        _ => row
            .try_get_unchecked::<String, _>(index)
            .ok()
            .map(Value::String),
    };

    value.unwrap_or(Value::Null)
}
