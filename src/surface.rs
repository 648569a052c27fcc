//! Presentation surface contract and the session loop that drives it.
//!
//! A surface renders the conversation, collects user actions, and shows a
//! status line. The TUI and the line REPL both implement it.

use async_trait::async_trait;
use tracing::debug;

use crate::app::{Orchestrator, TurnOutcome};
use crate::config::ConnectionConfig;
use crate::error::{Result, SqlChatError};
use crate::history::History;
use crate::session::Session;

/// Something the user asked the application to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Connect with the given settings, replacing any current connection.
    Connect(ConnectionConfig),
    /// Ask a question about the connected database.
    Ask(String),
    /// Leave the application.
    Quit,
}

/// Status reported to the surface by the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// No database connected yet.
    Disconnected,
    /// A connection attempt is in progress.
    Connecting(String),
    /// Connected and waiting for a question.
    Connected(String),
    /// The question is being answered.
    Processing(String),
    /// An anticipated precondition was not met.
    Guidance(String),
    /// An operation failed.
    Failed { category: String, message: String },
}

impl Status {
    /// Builds a failure status from an error.
    pub fn from_error(error: &SqlChatError) -> Self {
        Self::Failed {
            category: error.category().to_string(),
            message: error.message().to_string(),
        }
    }

    /// One-line text for plain surfaces.
    pub fn line(&self) -> String {
        match self {
            Self::Disconnected => "Not connected".to_string(),
            Self::Connecting(target) => format!("Connecting to {target}..."),
            Self::Connected(target) => format!("Connected to {target}"),
            Self::Processing(_) => "Thinking...".to_string(),
            Self::Guidance(message) => message.clone(),
            Self::Failed { category, message } => format!("{category}: {message}"),
        }
    }
}

/// Operations the session loop needs from a presentation layer.
#[async_trait]
pub trait Surface: Send {
    /// Shows the conversation so far.
    fn render_history(&mut self, history: &History) -> Result<()>;

    /// Waits for the next user action.
    async fn accept_input(&mut self) -> Result<UserAction>;

    /// Shows connection state, progress, and per-turn errors.
    fn show_status(&mut self, status: &Status) -> Result<()>;
}

/// Runs the session until the surface reports `Quit`.
///
/// Connection and turn failures are shown on the surface and the loop keeps
/// going; only surface failures end it early.
pub async fn run_session<S>(
    orchestrator: &Orchestrator,
    surface: &mut S,
    session: &mut Session,
) -> Result<()>
where
    S: Surface + ?Sized,
{
    surface.render_history(&session.history)?;
    surface.show_status(&ready_status(session))?;

    loop {
        match surface.accept_input().await? {
            UserAction::Quit => {
                debug!("Surface requested quit");
                return Ok(());
            }
            UserAction::Connect(config) => {
                surface.show_status(&Status::Connecting(config.display_string()))?;
                let status = match orchestrator.connect(session, &config).await {
                    Ok(label) => Status::Connected(label),
                    Err(e) => Status::from_error(&e),
                };
                surface.show_status(&status)?;
            }
            UserAction::Ask(question) => {
                if !question.trim().is_empty() {
                    surface.show_status(&Status::Processing(question.trim().to_string()))?;
                }
                let outcome = orchestrator.handle_input(session, &question).await;
                surface.render_history(&session.history)?;
                let status = match outcome {
                    Ok(TurnOutcome::NotConnected(guidance)) => Status::Guidance(guidance),
                    Ok(TurnOutcome::Ignored | TurnOutcome::Answered { .. }) => ready_status(session),
                    Err(e) => Status::from_error(&e),
                };
                surface.show_status(&status)?;
            }
        }
    }
}

fn ready_status(session: &Session) -> Status {
    match session.connection.display() {
        Some(label) => Status::Connected(label),
        None => Status::Disconnected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmService, MockLlmClient};
    use std::collections::VecDeque;

    /// Surface fed from a fixed list of actions that records what it was shown.
    #[derive(Default)]
    struct RecordingSurface {
        actions: VecDeque<UserAction>,
        statuses: Vec<Status>,
        renders: Vec<usize>,
    }

    #[async_trait]
    impl Surface for RecordingSurface {
        fn render_history(&mut self, history: &History) -> Result<()> {
            self.renders.push(history.len());
            Ok(())
        }

        async fn accept_input(&mut self) -> Result<UserAction> {
            Ok(self.actions.pop_front().unwrap_or(UserAction::Quit))
        }

        fn show_status(&mut self, status: &Status) -> Result<()> {
            self.statuses.push(status.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_question_without_connection_shows_guidance() {
        let llm = MockLlmClient::new();
        let observer = llm.clone();
        let orchestrator = Orchestrator::new(LlmService::new(Box::new(llm)));
        let mut session = Session::new();
        let mut surface = RecordingSurface {
            actions: VecDeque::from([UserAction::Ask("how many?".into())]),
            ..Default::default()
        };

        run_session(&orchestrator, &mut surface, &mut session)
            .await
            .unwrap();

        assert_eq!(observer.call_count(), 0);
        assert_eq!(surface.renders, vec![1, 2]);
        assert_eq!(surface.statuses.first(), Some(&Status::Disconnected));
        assert!(surface
            .statuses
            .contains(&Status::Guidance(crate::app::NOT_CONNECTED_GUIDANCE.into())));
    }

    #[tokio::test]
    async fn test_failed_connect_is_reported_and_loop_continues() {
        let orchestrator = Orchestrator::new(LlmService::new(Box::new(MockLlmClient::new())));
        let mut session = Session::new();
        let dir = tempfile::tempdir().unwrap();
        let missing = ConnectionConfig::sqlite(dir.path().join("none.db").to_string_lossy());
        let mut surface = RecordingSurface {
            actions: VecDeque::from([UserAction::Connect(missing), UserAction::Quit]),
            ..Default::default()
        };

        run_session(&orchestrator, &mut surface, &mut session)
            .await
            .unwrap();

        assert!(surface.statuses.iter().any(|s| matches!(
            s,
            Status::Failed { category, .. } if category == "Connection Error"
        )));
        assert!(!session.connection.is_connected());
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(Status::Disconnected.line(), "Not connected");
        assert_eq!(
            Status::from_error(&SqlChatError::query("bad")).line(),
            "Query Error: bad"
        );
    }
}
