//! Mock database clients for testing.
//!
//! Provides in-memory database implementations for tests that should not
//! depend on a running server.

use super::{ColumnInfo, DatabaseClient, QueryResult, Schema, Value};
use crate::error::{Result, SqlChatError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock database client that returns predefined results.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    schema: Schema,
    results: HashMap<String, QueryResult>,
    executed: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new mock database client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// Registers the result returned for an exact SQL string.
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.results.insert(sql.into(), result);
        self
    }

    /// Returns a shared log of every executed SQL string.
    pub fn executed(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.executed)
    }

    /// Returns a shared flag set when the client is closed.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SqlChatError::connection("Connection is closed"));
        }
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SqlChatError::connection("Connection is closed"));
        }

        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }

        if let Some(result) = self.results.get(sql) {
            return Ok(result.clone());
        }

        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            let columns = vec![ColumnInfo::new("result", "TEXT")];
            let rows = vec![vec![Value::String(format!("Mock result for: {sql}"))]];
            Ok(QueryResult::with_data(columns, rows).with_execution_time(Duration::from_millis(1)))
        } else {
            Ok(QueryResult::affected(0).with_execution_time(Duration::from_millis(1)))
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A database client whose every operation fails with the given error kind.
#[derive(Debug, Clone)]
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a client that fails with a query error carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Err(SqlChatError::connection(self.message.clone()))
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(SqlChatError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Table;

    #[tokio::test]
    async fn test_mock_introspect_schema() {
        let schema = Schema {
            tables: vec![Table::new("users")],
            foreign_keys: vec![],
        };
        let client = MockDatabaseClient::with_schema(schema);

        let result = client.introspect_schema().await.unwrap();
        assert_eq!(result.tables.len(), 1);
        assert_eq!(result.tables[0].name, "users");
    }

    #[tokio::test]
    async fn test_mock_registered_result_and_log() {
        let expected = QueryResult::with_data(
            vec![ColumnInfo::new("n", "INTEGER")],
            vec![vec![Value::Int(5)]],
        );
        let client = MockDatabaseClient::new().with_result("SELECT COUNT(*) AS n FROM t", expected);
        let log = client.executed();

        let result = client
            .execute_query("SELECT COUNT(*) AS n FROM t")
            .await
            .unwrap();

        assert_eq!(result.rows, vec![vec![Value::Int(5)]]);
        assert_eq!(*log.lock().unwrap(), vec!["SELECT COUNT(*) AS n FROM t"]);
    }

    #[tokio::test]
    async fn test_mock_closed_client_fails() {
        let client = MockDatabaseClient::new();
        client.close().await.unwrap();

        let error = client.execute_query("SELECT 1").await.unwrap_err();
        assert!(matches!(error, SqlChatError::Connection(_)));
    }

    #[tokio::test]
    async fn test_failing_client() {
        let client = FailingDatabaseClient::new("boom");
        assert!(matches!(
            client.execute_query("SELECT 1").await,
            Err(SqlChatError::Query(_))
        ));
        assert!(matches!(
            client.introspect_schema().await,
            Err(SqlChatError::Connection(_))
        ));
    }
}
