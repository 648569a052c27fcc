//! Terminal User Interface for sqlchat.
//!
//! Implements [`Surface`] on top of ratatui and crossterm. The session loop
//! calls into it; the TUI only draws state and turns key presses into
//! [`UserAction`]s.

pub mod app;
mod events;
mod ui;
pub mod widgets;

pub use app::App;
pub use events::{Event, EventHandler};

use crate::config::ConnectionConfig;
use crate::error::{Result, SqlChatError};
use crate::history::History;
use crate::surface::{Status, Surface, UserAction};
use async_trait::async_trait;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use tracing::{debug, warn};

/// The full-screen terminal surface.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
    app: App,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    ///
    /// `defaults` prefills the connection settings form.
    pub fn new(defaults: &ConnectionConfig) -> Result<Self> {
        let terminal = Self::setup_terminal()?;

        // Restore the terminal before the panic message is printed
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
            app: App::new(defaults),
        })
    }

    /// Sets up the terminal for TUI rendering.
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| SqlChatError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|e| {
            SqlChatError::internal(format!("Failed to enter alternate screen: {e}"))
        })?;

        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend)
            .map_err(|e| SqlChatError::internal(format!("Failed to create terminal: {e}")))
    }

    /// Restores the terminal to its original state.
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| SqlChatError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen).map_err(|e| {
            SqlChatError::internal(format!("Failed to leave alternate screen: {e}"))
        })?;

        self.terminal
            .show_cursor()
            .map_err(|e| SqlChatError::internal(format!("Failed to show cursor: {e}")))
    }

    fn draw(&mut self) -> Result<()> {
        let app = &self.app;
        self.terminal
            .draw(|frame| ui::render(frame, app))
            .map_err(|e| SqlChatError::internal(format!("Failed to draw: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl Surface for Tui {
    fn render_history(&mut self, history: &History) -> Result<()> {
        self.app.set_history(history);
        self.draw()
    }

    async fn accept_input(&mut self) -> Result<UserAction> {
        loop {
            self.draw()?;

            match self.event_handler.next_async().await? {
                Event::Key(key) => {
                    if let Some(action) = self.app.handle_key(key) {
                        debug!("User action: {}", action_name(&action));
                        return Ok(action);
                    }
                }
                Event::Resize(width, height) => debug!(width, height, "Terminal resized"),
                Event::Tick => {}
            }
        }
    }

    fn show_status(&mut self, status: &Status) -> Result<()> {
        self.app.set_status(status.clone());
        self.draw()
    }
}

fn action_name(action: &UserAction) -> &'static str {
    match action {
        UserAction::Connect(_) => "connect",
        UserAction::Ask(_) => "ask",
        UserAction::Quit => "quit",
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(e) = self.restore_terminal() {
            warn!("Failed to restore terminal: {e}");
        }
        release_panic_hook();
    }
}

/// Drops the terminal-restoring hook installed in `Tui::new`.
///
/// The hook cannot be swapped while unwinding, so it stays in place then.
fn release_panic_hook() {
    if !std::thread::panicking() {
        let _ = panic::take_hook();
    }
}
