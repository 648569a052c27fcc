//! Line REPL integration tests.
//!
//! Drives the full session loop from scripted input lines.

use sqlchat::config::ConnectionConfig;
use sqlchat::llm::MockLlmClient;
use sqlchat::repl::LineSurface;
use sqlchat::session::Session;
use sqlchat::surface::run_session;
use tokio::io::BufReader;

use super::common::{orchestrator, seeded_sqlite, COUNT_SQL};

async fn run_script(
    script: &str,
    llm: MockLlmClient,
    defaults: ConnectionConfig,
    session: &mut Session,
) -> String {
    let (orchestrator, _) = orchestrator(llm);
    let mut surface = LineSurface::new(BufReader::new(script.as_bytes()), Vec::new(), defaults);

    run_session(&orchestrator, &mut surface, session).await.unwrap();

    String::from_utf8(surface.into_writer()).unwrap()
}

#[tokio::test]
async fn test_connect_then_ask() {
    let (_dir, config) = seeded_sqlite().await;
    let script = format!(
        "/connect backend=sqlite database={}\nhow many customers are there?\n/quit\n",
        config.database
    );
    let mut session = Session::new();

    let output = run_script(
        &script,
        MockLlmClient::new().with_sql("how many customers", COUNT_SQL),
        ConnectionConfig::default(),
        &mut session,
    )
    .await;

    assert!(output.starts_with("AI: Hello! I'm a SQL Assistant."));
    assert!(output.contains("Not connected"));
    assert!(output.contains(&format!("Connected to {}", config.display_string())));
    assert!(output.contains("AI: Based on the query result: n\n5"));
    assert_eq!(session.history.len(), 3);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_question_before_connect_prints_guidance() {
    let mut session = Session::new();

    let output = run_script(
        "how many customers are there?\n",
        MockLlmClient::new(),
        ConnectionConfig::default(),
        &mut session,
    )
    .await;

    assert!(output.contains("Please connect to the database first!"));
    // Input ended, so the loop quit after the single question
    assert_eq!(session.history.len(), 2);
}

#[tokio::test]
async fn test_fenced_sql_shows_query_error() {
    let (_dir, config) = seeded_sqlite().await;
    let mut session = Session::new();

    let output = run_script(
        "/connect\nhow many customers are there?\n",
        MockLlmClient::scripted([format!("```sql\n{COUNT_SQL};\n```")]),
        config,
        &mut session,
    )
    .await;

    assert!(output.contains("Query Error:"));
    assert!(output.contains("strip_code_fences"));
    // Greeting + the question; no AI turn
    assert_eq!(session.history.len(), 2);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_failed_connect_keeps_loop_running() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.db");
    let script = format!("/connect sqlite://{}\n/quit\n", missing.display());
    let mut session = Session::new();

    let output = run_script(
        &script,
        MockLlmClient::new(),
        ConnectionConfig::default(),
        &mut session,
    )
    .await;

    assert!(output.contains("Connection Error:"));
    assert!(!session.connection.is_connected());
}
