//! Per-session context passed to every orchestrator call.

use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::history::History;
use tracing::debug;

/// Whether a question is currently being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    Processing,
}

/// State owned by one conversation: its history and its database handle.
#[derive(Debug, Default)]
pub struct Session {
    pub history: History,
    pub connection: ConnectionManager,
    pub state: TurnState,
}

impl Session {
    /// Starts a session with the greeting and no connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session around an existing connection manager.
    pub fn with_connection(connection: ConnectionManager) -> Self {
        Self {
            connection,
            ..Self::default()
        }
    }

    /// Ends the session, releasing the database handle.
    pub async fn close(&mut self) -> Result<()> {
        debug!("Closing session after {} turns", self.history.len());
        self.connection.close().await
    }
}
