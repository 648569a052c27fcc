//! Schema introspection integration tests.
//!
//! Tests the schema text handed to the model against a SQLite database.

use sqlchat::connection::Handle;
use sqlchat::db::{DatabaseClient, SqliteClient};

use super::common::seeded_sqlite;

#[tokio::test]
async fn test_schema_text_lists_tables_and_columns() {
    let (_dir, config) = seeded_sqlite().await;
    let handle = Handle::open(&config).await.unwrap();

    let schema = handle.schema_text().await.unwrap();

    assert!(schema.starts_with("Database Schema:"));
    assert!(schema.contains("Table: Customers"));
    assert!(schema.contains("  - CustomerId: INTEGER (PK"));
    assert!(schema.contains("  - Name: TEXT (NOT NULL)"));
    assert!(schema.contains("Table: Orders"));
    assert!(schema.contains("Orders.CustomerId -> Customers.CustomerId"));

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_schema_text_is_stable_between_calls() {
    let (_dir, config) = seeded_sqlite().await;
    let handle = Handle::open(&config).await.unwrap();

    let first = handle.schema_text().await.unwrap();
    let second = handle.schema_text().await.unwrap();

    assert_eq!(first, second);
    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_schema_includes_sample_rows() {
    let (_dir, config) = seeded_sqlite().await;
    let client = SqliteClient::connect(&config).await.unwrap();

    let schema = client.introspect_schema().await.unwrap();

    let customers = schema
        .tables
        .iter()
        .find(|t| t.name == "Customers")
        .expect("Customers table should exist");
    assert_eq!(customers.sample_rows.len(), 3);
    assert_eq!(customers.primary_key, vec!["CustomerId".to_string()]);

    let text = schema.format_for_llm();
    assert!(text.contains("Sample rows (3 from Customers):"));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_schema_reflects_new_tables() {
    let (_dir, config) = seeded_sqlite().await;
    let handle = Handle::open(&config).await.unwrap();

    handle
        .execute("CREATE TABLE Invoices (InvoiceId INTEGER PRIMARY KEY, Amount REAL)")
        .await
        .unwrap();

    let schema = handle.schema_text().await.unwrap();
    assert!(schema.contains("Table: Invoices"));

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_wide_sample_values_do_not_bloat_schema_text() {
    let (_dir, config) = seeded_sqlite().await;
    let handle = Handle::open(&config).await.unwrap();
    let before = handle.schema_text().await.unwrap();

    handle
        .execute("CREATE TABLE Notes (NoteId INTEGER PRIMARY KEY, Body TEXT)")
        .await
        .unwrap();
    handle
        .execute("INSERT INTO Notes (Body) VALUES (hex(zeroblob(100000)))")
        .await
        .unwrap();

    let schema = handle.schema_text().await.unwrap();

    assert!(schema.contains(&format!("    1\t{}\n", "0".repeat(100))));
    assert!(!schema.contains(&"0".repeat(101)));
    assert!(schema.len() < before.len() + 1000, "schema text length: {}", schema.len());

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_sample_rows_follow_primary_key_order() {
    let (_dir, config) = seeded_sqlite().await;
    let handle = Handle::open(&config).await.unwrap();

    handle
        .execute("CREATE TABLE Codes (Code TEXT PRIMARY KEY, Label TEXT)")
        .await
        .unwrap();
    handle
        .execute("INSERT INTO Codes VALUES ('d', 'four'), ('b', 'two'), ('a', 'one'), ('c', 'three')")
        .await
        .unwrap();

    let schema = handle.schema_text().await.unwrap();

    assert!(schema.contains(
        "  Sample rows (3 from Codes):\n    Code\tLabel\n    a\tone\n    b\ttwo\n    c\tthree\n"
    ));

    handle.close().await.unwrap();
}
