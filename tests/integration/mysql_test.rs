//! MySQL integration tests.
//!
//! These tests require a running MySQL database.
//! Set DATABASE_URL to a mysql:// URL to run them.

use sqlchat::app::TurnOutcome;
use sqlchat::config::ConnectionConfig;
use sqlchat::connection::Handle;
use sqlchat::error::SqlChatError;
use sqlchat::llm::MockLlmClient;
use sqlchat::session::Session;

use super::common::orchestrator;

/// Helper to get the test connection settings from the environment.
fn get_test_config() -> Option<ConnectionConfig> {
    let url = std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| url.starts_with("mysql://"))?;
    ConnectionConfig::from_connection_string(&url).ok()
}

#[tokio::test]
async fn test_schema_text_is_stable() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let handle = Handle::open(&config).await.unwrap();
    let first = handle.schema_text().await.unwrap();
    let second = handle.schema_text().await.unwrap();

    assert!(first.starts_with("Database Schema:"));
    assert_eq!(first, second);
    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_turn_against_mysql() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let (orchestrator, _) = orchestrator(
        MockLlmClient::new().with_sql("what is one plus one", "SELECT 1 + 1 AS two"),
    );
    let mut session = Session::new();
    orchestrator.connect(&mut session, &config).await.unwrap();

    let outcome = orchestrator
        .handle_input(&mut session, "what is one plus one?")
        .await
        .unwrap();

    let TurnOutcome::Answered { answer, .. } = outcome else {
        panic!("expected an answer, got {outcome:?}");
    };
    assert!(answer.contains("two\n2"));
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_invalid_sql_is_query_error() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let handle = Handle::open(&config).await.unwrap();
    let error = handle
        .execute("SELECT * FROM table_that_does_not_exist_42")
        .await
        .unwrap_err();

    assert!(matches!(error, SqlChatError::Query(_)));
    assert!(error.message().starts_with("ERROR "));
    handle.close().await.unwrap();
}
