//! Connection manager for database lifecycle and switching.

use crate::config::ConnectionConfig;
use crate::db::{self, DatabaseClient};
use crate::error::{Result, SqlChatError};
use tracing::{debug, info, warn};

/// An open database connection with the settings it was made from.
pub struct Handle {
    config: ConnectionConfig,
    db: Box<dyn DatabaseClient>,
}

impl Handle {
    /// Wraps an already connected client.
    pub fn new(config: ConnectionConfig, db: Box<dyn DatabaseClient>) -> Self {
        Self { config, db }
    }

    /// Opens a new connection.
    pub async fn open(config: &ConnectionConfig) -> Result<Self> {
        let db = db::connect(config).await?;
        Ok(Self::new(config.clone(), db))
    }

    /// Password-free label for status lines.
    pub fn display(&self) -> String {
        self.config.display_string()
    }

    /// Introspects the database and renders the schema description.
    ///
    /// Always reads the live database; nothing is cached between calls.
    pub async fn schema_text(&self) -> Result<String> {
        let schema = self.db.introspect_schema().await.map_err(|e| match e {
            SqlChatError::Connection(_) => e,
            other => SqlChatError::connection(format!(
                "Failed to read schema: {}",
                other.message()
            )),
        })?;
        debug!("Introspected {} tables", schema.tables.len());
        Ok(schema.format_for_llm())
    }

    /// Runs SQL verbatim and renders the outcome as text.
    pub async fn execute(&self, sql: &str) -> Result<String> {
        let result = self.db.execute_query(sql).await?;
        debug!(
            "Query finished in {:?} with {} rows",
            result.execution_time, result.row_count
        );
        Ok(result.to_text())
    }

    /// Releases the connection.
    pub async fn close(self) -> Result<()> {
        self.db.close().await
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("connection", &self.display())
            .finish()
    }
}

/// Holds at most one active connection and replaces it on request.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    active: Option<Handle>,
}

impl ConnectionManager {
    /// Creates a manager with no connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager with an existing connection.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            active: Some(handle),
        }
    }

    /// Connects with the given configuration.
    ///
    /// The new connection is opened first; the previous one is closed only
    /// after it succeeds, so a failed attempt leaves the old handle usable.
    pub async fn connect(&mut self, config: &ConnectionConfig) -> Result<()> {
        let handle = Handle::open(config).await?;
        self.install(handle).await;
        Ok(())
    }

    /// Replaces the active handle, closing the previous one.
    pub async fn install(&mut self, handle: Handle) {
        if let Some(old) = self.active.take() {
            let label = old.display();
            if let Err(e) = old.close().await {
                warn!("Failed to close connection to {label}: {e}");
            }
        }
        info!("Active connection: {}", handle.display());
        self.active = Some(handle);
    }

    /// Get the active handle.
    pub fn handle(&self) -> Option<&Handle> {
        self.active.as_ref()
    }

    /// Returns true if a connection is active.
    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Label of the active connection, if any.
    pub fn display(&self) -> Option<String> {
        self.active.as_ref().map(Handle::display)
    }

    /// Closes the active connection, if any.
    pub async fn close(&mut self) -> Result<()> {
        match self.active.take() {
            Some(handle) => handle.close().await,
            None => Ok(()),
        }
    }
}
