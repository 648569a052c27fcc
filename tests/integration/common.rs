//! Shared fixtures for integration tests.

use sqlchat::app::Orchestrator;
use sqlchat::config::ConnectionConfig;
use sqlchat::llm::{LlmService, MockLlmClient};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tempfile::TempDir;

pub const COUNT_SQL: &str = "SELECT COUNT(*) AS n FROM Customers";

/// Creates a SQLite database with five customers, their orders, and a
/// small Track table.
///
/// The returned directory must outlive any connection to the database.
pub async fn seeded_sqlite() -> (TempDir, ConnectionConfig) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.db");

    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();
    sqlx::raw_sql(
        "CREATE TABLE Customers (
             CustomerId INTEGER PRIMARY KEY,
             Name TEXT NOT NULL,
             Country TEXT DEFAULT 'US'
         );
         CREATE TABLE Orders (
             OrderId INTEGER PRIMARY KEY,
             CustomerId INTEGER NOT NULL REFERENCES Customers(CustomerId),
             Total REAL
         );
         CREATE TABLE Track (
             TrackId INTEGER PRIMARY KEY,
             Name TEXT NOT NULL,
             ArtistId INTEGER NOT NULL
         );
         INSERT INTO Customers (Name, Country) VALUES
             ('Ada', 'UK'), ('Grace', 'US'), ('Linus', 'FI'), ('Ken', 'US'), ('Barbara', 'US');
         INSERT INTO Orders (CustomerId, Total) VALUES (1, 12.5), (1, 3.0), (4, 99.9);
         INSERT INTO Track (Name, ArtistId) VALUES ('One', 1), ('Two', 1), ('Three', 2);",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool.close().await;

    let config = ConnectionConfig::sqlite(path.to_string_lossy());
    (dir, config)
}

/// Builds an orchestrator around a mock model, returning a handle that
/// observes the same call counter and prompt log.
pub fn orchestrator(llm: MockLlmClient) -> (Orchestrator, MockLlmClient) {
    let observer = llm.clone();
    (Orchestrator::new(LlmService::new(Box::new(llm))), observer)
}
