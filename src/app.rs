//! Core orchestrator for sqlchat.
//!
//! Runs one conversation turn: record the question, generate SQL against the
//! live schema, execute it, and synthesize an answer from the result.

use tracing::{debug, error, info};

use crate::config::ConnectionConfig;
use crate::connection::Handle;
use crate::error::{Result, SqlChatError};
use crate::history::{History, Turn};
use crate::llm::{parser, LlmService};
use crate::session::{Session, TurnState};

/// Shown when a question arrives before any database is connected.
pub const NOT_CONNECTED_GUIDANCE: &str = "Please connect to the database first!";

/// Result of processing user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Empty or whitespace-only input; nothing happened.
    Ignored,
    /// The question was recorded but no database is connected.
    NotConnected(String),
    /// Both stages completed and the answer was appended to history.
    Answered { sql: String, answer: String },
}

/// The orchestrator that drives the two model stages for a session.
pub struct Orchestrator {
    llm: LlmService,
    strip_code_fences: bool,
}

impl Orchestrator {
    /// Creates an orchestrator that executes model output verbatim.
    pub fn new(llm: LlmService) -> Self {
        Self {
            llm,
            strip_code_fences: false,
        }
    }

    /// Unwraps fenced model output before execution when enabled.
    pub fn with_strip_code_fences(mut self, enabled: bool) -> Self {
        self.strip_code_fences = enabled;
        self
    }

    /// Connects the session to a database, replacing any previous handle.
    ///
    /// Returns the display label of the new connection.
    pub async fn connect(&self, session: &mut Session, config: &ConnectionConfig) -> Result<String> {
        session.connection.connect(config).await?;
        Ok(config.display_string())
    }

    /// Processes one user submission.
    ///
    /// The Human turn is appended before anything else and stays in history
    /// even if a later step fails. The session returns to `Idle` either way.
    pub async fn handle_input(&self, session: &mut Session, input: &str) -> Result<TurnOutcome> {
        if session.state == TurnState::Processing {
            return Err(SqlChatError::internal(
                "A question is already being processed",
            ));
        }

        let question = input.trim();
        if question.is_empty() {
            return Ok(TurnOutcome::Ignored);
        }

        session.history.push(Turn::Human(question.to_string()));

        let Some(handle) = session.connection.handle() else {
            debug!("Question received without a connection");
            return Ok(TurnOutcome::NotConnected(NOT_CONNECTED_GUIDANCE.to_string()));
        };

        session.state = TurnState::Processing;
        let result = self.run_stages(handle, &session.history, question).await;
        session.state = TurnState::Idle;

        match result {
            Ok((sql, answer)) => {
                session.history.push(Turn::Assistant(answer.clone()));
                info!(history_len = session.history.len(), "Turn complete");
                Ok(TurnOutcome::Answered { sql, answer })
            }
            Err(e) => {
                error!("Turn failed: {e}");
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        handle: &Handle,
        history: &History,
        question: &str,
    ) -> Result<(String, String)> {
        let schema = handle.schema_text().await?;
        let generated = self.llm.generate_sql(question, history, &schema).await?;
        let sql = self.prepare_sql(generated);

        let response = handle
            .execute(&sql)
            .await
            .map_err(|e| with_fence_hint(e, &sql))?;
        debug!(response_len = response.len(), "Query executed");

        let schema = handle.schema_text().await?;
        let answer = self
            .llm
            .synthesize_answer(question, history, &sql, &schema, &response)
            .await?;

        Ok((sql, answer))
    }

    fn prepare_sql(&self, generated: String) -> String {
        if !self.strip_code_fences {
            return generated;
        }
        match parser::strip_code_fence(&generated) {
            Some(sql) => {
                debug!("Removed markdown fence from generated SQL");
                sql
            }
            None => generated,
        }
    }
}

/// Points at the markdown fence when fenced model output fails to execute.
fn with_fence_hint(error: SqlChatError, sql: &str) -> SqlChatError {
    match error {
        SqlChatError::Query(message) if parser::is_fenced(sql) => SqlChatError::query(format!(
            "{message}\nThe model wrapped its SQL in a markdown code fence. \
             Set llm.strip_code_fences = true to unwrap it."
        )),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::connection::ConnectionManager;
    use crate::db::{
        ColumnInfo, FailingDatabaseClient, MockDatabaseClient, QueryResult, Schema, Table, Value,
    };
    use crate::llm::MockLlmClient;

    const COUNT_SQL: &str = "SELECT COUNT(*) AS n FROM Customers";

    fn connected_session() -> Session {
        let client = MockDatabaseClient::with_schema(Schema {
            tables: vec![Table::new("Customers")],
            foreign_keys: vec![],
        })
        .with_result(
            COUNT_SQL,
            QueryResult::with_data(vec![ColumnInfo::new("n", "INTEGER")], vec![vec![Value::Int(5)]]),
        );
        let handle = Handle::new(ConnectionConfig::sqlite("shop.db"), Box::new(client));
        Session::with_connection(ConnectionManager::with_handle(handle))
    }

    fn orchestrator(llm: MockLlmClient) -> Orchestrator {
        Orchestrator::new(LlmService::new(Box::new(llm)))
    }

    #[tokio::test]
    async fn test_answered_turn_appends_two_turns() {
        let llm = MockLlmClient::new().with_sql("how many customers", COUNT_SQL);
        let orchestrator = orchestrator(llm);
        let mut session = connected_session();

        let outcome = orchestrator
            .handle_input(&mut session, "how many customers are there?")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            TurnOutcome::Answered {
                sql: COUNT_SQL.to_string(),
                answer: "Based on the query result: n\n5".to_string(),
            }
        );
        assert_eq!(session.history.len(), 3);
        assert_eq!(
            session.history.turns()[1],
            Turn::Human("how many customers are there?".into())
        );
        assert_eq!(session.state, TurnState::Idle);
    }

    #[tokio::test]
    async fn test_whitespace_input_is_ignored() {
        let llm = MockLlmClient::new();
        let observer = llm.clone();
        let mut session = connected_session();

        let outcome = orchestrator(llm)
            .handle_input(&mut session, "   \n")
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::Ignored);
        assert_eq!(session.history.len(), 1);
        assert_eq!(observer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_connection_returns_guidance_without_model_call() {
        let llm = MockLlmClient::new();
        let observer = llm.clone();
        let mut session = Session::new();

        let outcome = orchestrator(llm)
            .handle_input(&mut session, "how many customers are there?")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            TurnOutcome::NotConnected(NOT_CONNECTED_GUIDANCE.to_string())
        );
        assert_eq!(observer.call_count(), 0);
        assert_eq!(session.history.len(), 2);
        assert!(matches!(session.history.last(), Some(Turn::Human(_))));
    }

    #[tokio::test]
    async fn test_model_failure_keeps_human_turn() {
        let mut session = connected_session();

        let error = orchestrator(MockLlmClient::failing("unreachable"))
            .handle_input(&mut session, "how many?")
            .await
            .unwrap_err();

        assert!(matches!(error, SqlChatError::Llm(_)));
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.state, TurnState::Idle);
    }

    #[tokio::test]
    async fn test_query_failure_adds_no_assistant_turn() {
        let handle = Handle::new(
            ConnectionConfig::default(),
            Box::new(FailingDatabaseClient::new("no such table")),
        );
        let mut session = Session::with_connection(ConnectionManager::with_handle(handle));

        let error = orchestrator(MockLlmClient::new())
            .handle_input(&mut session, "q")
            .await
            .unwrap_err();

        // Schema introspection runs first and reports the stale handle
        assert!(matches!(error, SqlChatError::Connection(_)));
        assert_eq!(session.history.len(), 2);
    }

    #[tokio::test]
    async fn test_processing_state_rejects_input() {
        let mut session = connected_session();
        session.state = TurnState::Processing;

        let error = orchestrator(MockLlmClient::new())
            .handle_input(&mut session, "q")
            .await
            .unwrap_err();

        assert!(matches!(error, SqlChatError::Internal(_)));
        assert_eq!(session.history.len(), 1);
    }

    #[tokio::test]
    async fn test_strip_code_fences_unwraps_sql() {
        let llm = MockLlmClient::scripted([format!("```sql\n{COUNT_SQL}\n```"), "Five.".into()]);
        let orchestrator = orchestrator(llm).with_strip_code_fences(true);
        let mut session = connected_session();

        let outcome = orchestrator
            .handle_input(&mut session, "how many customers are there?")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            TurnOutcome::Answered {
                sql: COUNT_SQL.to_string(),
                answer: "Five.".to_string(),
            }
        );
    }

    #[test]
    fn test_fence_hint_only_for_fenced_query_errors() {
        let hinted = with_fence_hint(SqlChatError::query("syntax"), "```sql\nSELECT 1;\n```");
        assert!(hinted.message().contains("strip_code_fences"));

        let plain = with_fence_hint(SqlChatError::query("syntax"), "SELEC 1");
        assert_eq!(plain.message(), "syntax");

        let llm = with_fence_hint(SqlChatError::llm("down"), "```");
        assert!(matches!(llm, SqlChatError::Llm(_)));
    }
}
