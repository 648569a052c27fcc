//! End-to-end conversation tests.
//!
//! Each turn runs against a real SQLite database with a scripted model.

use pretty_assertions::assert_eq;
use sqlchat::app::{TurnOutcome, NOT_CONNECTED_GUIDANCE};
use sqlchat::error::SqlChatError;
use sqlchat::history::Turn;
use sqlchat::llm::MockLlmClient;
use sqlchat::session::{Session, TurnState};

use super::common::{orchestrator, seeded_sqlite, COUNT_SQL};

#[tokio::test]
async fn test_question_is_answered_from_live_data() {
    let (_dir, config) = seeded_sqlite().await;
    let (orchestrator, observer) =
        orchestrator(MockLlmClient::new().with_sql("how many customers", COUNT_SQL));
    let mut session = Session::new();
    orchestrator.connect(&mut session, &config).await.unwrap();

    let outcome = orchestrator
        .handle_input(&mut session, "how many customers are there?")
        .await
        .unwrap();

    let TurnOutcome::Answered { sql, answer } = outcome else {
        panic!("expected an answer, got {outcome:?}");
    };
    assert_eq!(sql, COUNT_SQL);
    assert!(answer.contains('5'), "answer was: {answer}");
    assert_eq!(observer.call_count(), 2);

    // Greeting + Human + AI
    assert_eq!(session.history.len(), 3);
    assert_eq!(
        session.history.turns()[1],
        Turn::Human("how many customers are there?".into())
    );
    assert!(matches!(session.history.last(), Some(Turn::Assistant(_))));
    assert_eq!(session.state, TurnState::Idle);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_answer_prompt_carries_sql_and_result() {
    let (_dir, config) = seeded_sqlite().await;
    let (orchestrator, observer) =
        orchestrator(MockLlmClient::new().with_sql("how many customers", COUNT_SQL));
    let mut session = Session::new();
    orchestrator.connect(&mut session, &config).await.unwrap();

    orchestrator
        .handle_input(&mut session, "how many customers are there?")
        .await
        .unwrap();

    let prompts = observer.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].trim_end().ends_with("SQL Query:"));
    assert!(prompts[1].contains(&format!("SQL Query: <SQL>{COUNT_SQL}</SQL>")));
    assert!(prompts[1].contains("SQL Response: n\n5"));
}

#[tokio::test]
async fn test_question_without_connection_skips_the_model() {
    let (orchestrator, observer) = orchestrator(MockLlmClient::new());
    let mut session = Session::new();

    let outcome = orchestrator
        .handle_input(&mut session, "how many customers are there?")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        TurnOutcome::NotConnected(NOT_CONNECTED_GUIDANCE.to_string())
    );
    assert_eq!(observer.call_count(), 0);
    assert_eq!(session.history.len(), 2);
}

#[tokio::test]
async fn test_history_grows_and_is_sent_to_the_model() {
    let (_dir, config) = seeded_sqlite().await;
    let (orchestrator, observer) = orchestrator(
        MockLlmClient::new()
            .with_sql("how many customers", COUNT_SQL)
            .with_sql("which countries", "SELECT DISTINCT Country FROM Customers ORDER BY Country"),
    );
    let mut session = Session::new();
    orchestrator.connect(&mut session, &config).await.unwrap();

    orchestrator
        .handle_input(&mut session, "how many customers are there?")
        .await
        .unwrap();
    orchestrator
        .handle_input(&mut session, "which countries are they from?")
        .await
        .unwrap();

    assert_eq!(session.history.len(), 5);

    // Third prompt is the second question's SQL prompt
    let prompts = observer.prompts();
    assert!(prompts[2].contains("Human: how many customers are there?"));
    assert!(prompts[2].contains("AI: Based on the query result: n\n5"));
    assert!(prompts[2].contains("Human: which countries are they from?"));

    let blank = orchestrator.handle_input(&mut session, "   ").await.unwrap();
    assert_eq!(blank, TurnOutcome::Ignored);
    assert_eq!(session.history.len(), 5);
}

#[tokio::test]
async fn test_sql_prompt_shows_the_example_query() {
    let (_dir, config) = seeded_sqlite().await;
    let (orchestrator, observer) = orchestrator(MockLlmClient::new());
    let mut session = Session::new();
    orchestrator.connect(&mut session, &config).await.unwrap();

    orchestrator
        .handle_input(&mut session, "which 3 artists have the most tracks?")
        .await
        .unwrap();

    let sql_prompt = &observer.prompts()[0];
    assert!(sql_prompt.contains("Table: Track"));
    assert!(sql_prompt.contains(
        "SELECT ArtistId, COUNT(*) as track_count FROM Track GROUP BY ArtistId ORDER BY track_count DESC LIMIT 3;"
    ));
    assert!(sql_prompt.contains("Question: which 3 artists have the most tracks?"));
}

#[tokio::test]
async fn test_fenced_sql_fails_with_hint() {
    let (_dir, config) = seeded_sqlite().await;
    let (orchestrator, _) = orchestrator(MockLlmClient::scripted([format!(
        "```sql\n{COUNT_SQL};\n```"
    )]));
    let mut session = Session::new();
    orchestrator.connect(&mut session, &config).await.unwrap();

    let error = orchestrator
        .handle_input(&mut session, "how many customers are there?")
        .await
        .unwrap_err();

    assert!(matches!(error, SqlChatError::Query(_)));
    assert!(error.message().contains("strip_code_fences"));
    // The question stays; no answer is recorded
    assert_eq!(session.history.len(), 2);
    assert_eq!(session.state, TurnState::Idle);
}

#[tokio::test]
async fn test_fenced_sql_runs_when_stripping_is_enabled() {
    let (_dir, config) = seeded_sqlite().await;
    let (orchestrator, _) = orchestrator(MockLlmClient::scripted([
        format!("```sql\n{COUNT_SQL};\n```"),
        "There are 5 customers.".to_string(),
    ]));
    let orchestrator = orchestrator.with_strip_code_fences(true);
    let mut session = Session::new();
    orchestrator.connect(&mut session, &config).await.unwrap();

    let outcome = orchestrator
        .handle_input(&mut session, "how many customers are there?")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        TurnOutcome::Answered {
            sql: format!("{COUNT_SQL};"),
            answer: "There are 5 customers.".to_string(),
        }
    );
}

#[tokio::test]
async fn test_write_statement_reports_affected_rows() {
    let (_dir, config) = seeded_sqlite().await;
    let (orchestrator, observer) = orchestrator(MockLlmClient::new().with_sql(
        "move ada",
        "UPDATE Customers SET Country = 'FR' WHERE Name = 'Ada'",
    ));
    let mut session = Session::new();
    orchestrator.connect(&mut session, &config).await.unwrap();

    orchestrator
        .handle_input(&mut session, "move Ada to France")
        .await
        .unwrap();

    assert!(observer.prompts()[1].contains("SQL Response: 1 row affected"));
}
