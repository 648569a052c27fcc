//! MySQL database client implementation.
//!
//! Provides the `MySqlClient` struct that implements the `DatabaseClient` trait
//! for MySQL and MariaDB databases using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{
    Column, ColumnInfo, DatabaseBackend, DatabaseClient, ForeignKey, QueryResult, Row, Schema,
    Table, Value, MAX_ROWS, QUERY_TIMEOUT_SECS, SAMPLE_ROWS,
};
use crate::error::{Result, SqlChatError};
use crate::statement::{self, StatementShape};
use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlDatabaseError, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::{Column as SqlxColumn, Decode, Executor, Row as SqlxRow, Type, TypeInfo};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// MySQL database client.
#[derive(Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
}

impl MySqlClient {
    /// Opens a pool for the given configuration and validates it with `SELECT 1`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        debug!("Connecting to {}", config.display_string());

        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        info!("Connected to {}", config.display_string());
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        let tables = self.fetch_tables().await?;
        let foreign_keys = self.fetch_foreign_keys().await?;

        Ok(Schema {
            tables,
            foreign_keys,
        })
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();
        let timeout = Duration::from_secs(QUERY_TIMEOUT_SECS);
        let shape = statement::classify(sql, DatabaseBackend::MySql);
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

        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => column_info(first_row.columns()),
            None => self.describe_columns(sql).await,
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

impl MySqlClient {
    /// Column metadata for a statement that returned no rows.
    async fn describe_columns(&self, sql: &str) -> Vec<ColumnInfo> {
        match (&self.pool).describe(sql).await {
            Ok(described) => column_info(described.columns()),
            Err(e) => {
                debug!("Could not describe empty result: {e}");
                Vec::new()
            }
        }
    }

    /// Fetches all base tables of the current database.
    async fn fetch_tables(&self) -> Result<Vec<Table>> {
        let table_names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT CAST(table_name AS CHAR)
            FROM information_schema.tables
            WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SqlChatError::query(format!("Failed to fetch tables: {e}")))?;

        let mut tables = Vec::with_capacity(table_names.len());

        for table_name in table_names {
            let columns = self.fetch_columns(&table_name).await?;
            let primary_key = self.fetch_primary_key(&table_name).await?;
            let sample_rows = self.fetch_sample_rows(&table_name, &primary_key).await?;

            tables.push(Table {
                name: table_name,
                columns,
                primary_key,
                sample_rows,
            });
        }

        Ok(tables)
    }

    /// Fetches columns for a specific table.
    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<Column>> {
        let rows: Vec<(String, String, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT
                CAST(column_name AS CHAR),
                CAST(column_type AS CHAR),
                CAST(is_nullable AS CHAR),
                CAST(column_default AS CHAR)
            FROM information_schema.columns
            WHERE table_schema = DATABASE() AND table_name = ?
            ORDER BY ordinal_position
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            SqlChatError::query(format!("Failed to fetch columns for {table_name}: {e}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type, is_nullable, default)| Column {
                name,
                data_type,
                is_nullable: is_nullable == "YES",
                default,
            })
            .collect())
    }

    /// Fetches primary key columns for a specific table.
    async fn fetch_primary_key(&self, table_name: &str) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT CAST(column_name AS CHAR)
            FROM information_schema.key_column_usage
            WHERE table_schema = DATABASE()
                AND table_name = ?
                AND constraint_name = 'PRIMARY'
            ORDER BY ordinal_position
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            SqlChatError::query(format!("Failed to fetch primary key for {table_name}: {e}"))
        })
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

    /// Fetches all foreign key relationships of the current database.
    async fn fetch_foreign_keys(&self) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT
                CAST(table_name AS CHAR),
                CAST(constraint_name AS CHAR),
                CAST(column_name AS CHAR),
                CAST(referenced_table_name AS CHAR),
                CAST(referenced_column_name AS CHAR)
            FROM information_schema.key_column_usage
            WHERE table_schema = DATABASE()
                AND referenced_table_name IS NOT NULL
            ORDER BY table_name, constraint_name, ordinal_position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SqlChatError::query(format!("Failed to fetch foreign keys: {e}")))?;

        Ok(group_foreign_keys(rows))
    }
}

/// Groups ordered key-column rows into one foreign key per constraint.
fn group_foreign_keys(rows: Vec<(String, String, String, String, String)>) -> Vec<ForeignKey> {
    let mut grouped: Vec<(String, ForeignKey)> = Vec::new();

    for (from_table, constraint, from_column, to_table, to_column) in rows {
        match grouped.last_mut() {
            Some((name, fk)) if *name == constraint && fk.from_table == from_table => {
                fk.from_columns.push(from_column);
                fk.to_columns.push(to_column);
            }
            _ => grouped.push((
                constraint,
                ForeignKey::new(from_table, vec![from_column], to_table, vec![to_column]),
            )),
        }
    }

    grouped.into_iter().map(|(_, fk)| fk).collect()
}

/// Quotes a MySQL identifier with backticks.
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
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

fn column_info<C: SqlxColumn>(columns: &[C]) -> Vec<ColumnInfo> {
    columns
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect()
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

fn get<'r, T>(row: &'r MySqlRow, index: usize) -> Option<T>
where
    T: Decode<'r, MySql> + Type<MySql>,
{
    row.try_get::<Option<T>, _>(index).ok().flatten()
}

fn get_unchecked<'r, T>(row: &'r MySqlRow, index: usize) -> Option<T>
where
    T: Decode<'r, MySql>,
{
    row.try_get_unchecked::<Option<T>, _>(index).ok().flatten()
}

/// Converts a single column value from a MySqlRow to our Value type.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    let type_name = type_name.to_uppercase();

    let value = match type_name.as_str() {
        "NULL" => None,

        "BOOLEAN" => get::<bool>(row, index).map(Value::Bool),

        t if t.ends_with(" UNSIGNED") => get_unchecked::<u64>(row, index)
            .map(|v| i64::try_from(v).map(Value::Int).unwrap_or(Value::UInt(v))),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            get_unchecked::<i64>(row, index).map(Value::Int)
        }

        "YEAR" => get_unchecked::<u16>(row, index).map(|v| Value::Int(i64::from(v))),

        "FLOAT" => get_unchecked::<f32>(row, index).map(|v| Value::Float(f64::from(v))),

        "DOUBLE" => get_unchecked::<f64>(row, index).map(Value::Float),

        // Exact decimals are kept as text to avoid float rounding
        "DECIMAL" => get_unchecked::<String>(row, index).map(Value::String),

        "DATE" => get::<NaiveDate>(row, index).map(|v| Value::String(v.to_string())),

        "TIME" => get::<NaiveTime>(row, index).map(|v| Value::String(v.to_string())),

        "DATETIME" => {
            get::<NaiveDateTime>(row, index).map(|v| Value::String(v.to_string()))
        }

        "TIMESTAMP" => get::<DateTime<Utc>>(row, index)
            .map(|v| Value::String(v.naive_utc().to_string())),

        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            get::<Vec<u8>>(row, index).map(Value::Bytes)
        }

        _ => get_unchecked::<String>(row, index)
            .map(Value::String)
            .or_else(|| get_unchecked::<Vec<u8>>(row, index).map(Value::Bytes)),
    };

    value.unwrap_or(Value::Null)
}

/// Wraps a sqlx connection error, prefixing the driver message with a short hint.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> SqlChatError {
    let message = error.to_string();
    let lower = message.to_lowercase();

    let hint = if lower.contains("access denied") {
        format!("Authentication failed for user '{}'", config.user)
    } else if lower.contains("unknown database") {
        format!("Database '{}' does not exist", config.database)
    } else {
        format!("Cannot connect to {}:{}", config.host, config.port)
    };

    SqlChatError::connection(format!("{hint}: {message}"))
}

/// Formats a query error with the server's error number when available.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => match db_error.try_downcast_ref::<MySqlDatabaseError>() {
            Some(mysql_error) => format!(
                "ERROR {}: {}",
                mysql_error.number(),
                mysql_error.message()
            ),
            None => format!("ERROR: {}", db_error.message()),
        },
        None => error.to_string(),
    }
}
