//! Connection management integration tests.

use sqlchat::config::ConnectionConfig;
use sqlchat::error::SqlChatError;
use sqlchat::llm::MockLlmClient;
use sqlchat::session::Session;

use super::common::{orchestrator, seeded_sqlite};

#[tokio::test]
async fn test_connect_reports_display_label() {
    let (_dir, config) = seeded_sqlite().await;
    let (orchestrator, _) = orchestrator(MockLlmClient::new());
    let mut session = Session::new();

    let label = orchestrator.connect(&mut session, &config).await.unwrap();

    assert!(label.ends_with("shop.db (sqlite)"));
    assert_eq!(session.connection.display(), Some(label));
    session.close().await.unwrap();
    assert!(!session.connection.is_connected());
}

#[tokio::test]
async fn test_failed_reconnect_keeps_previous_connection() {
    let (dir, config) = seeded_sqlite().await;
    let (orchestrator, _) = orchestrator(MockLlmClient::new());
    let mut session = Session::new();
    orchestrator.connect(&mut session, &config).await.unwrap();

    let missing = ConnectionConfig::sqlite(dir.path().join("missing.db").to_string_lossy());
    let error = orchestrator
        .connect(&mut session, &missing)
        .await
        .unwrap_err();

    assert!(matches!(error, SqlChatError::Connection(_)));
    assert_eq!(session.connection.display(), Some(config.display_string()));
    let handle = session.connection.handle().expect("previous handle kept");
    assert!(handle.execute("SELECT 1").await.is_ok());

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_reconnect_replaces_handle() {
    let (_first_dir, first) = seeded_sqlite().await;
    let (_second_dir, second) = seeded_sqlite().await;
    let (orchestrator, _) = orchestrator(MockLlmClient::new());
    let mut session = Session::new();

    orchestrator.connect(&mut session, &first).await.unwrap();
    orchestrator.connect(&mut session, &second).await.unwrap();

    assert_eq!(session.connection.display(), Some(second.display_string()));
    session.close().await.unwrap();
}
