//! Application state for the TUI.
//!
//! Holds everything the screen shows: the input line, the connection
//! settings form, a snapshot of the conversation, and the current status.
//! Key handling is pure; it mutates state and may produce a [`UserAction`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::ConnectionConfig;
use crate::db::DatabaseBackend;
use crate::error::{Result, SqlChatError};
use crate::history::{History, Turn};
use crate::surface::{Status, UserAction};

/// Lines moved per PageUp/PageDown.
const SCROLL_STEP: usize = 5;

/// Which panel currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Settings,
}

impl Focus {
    /// Cycles to the next focus panel.
    pub fn next(self) -> Self {
        match self {
            Self::Input => Self::Settings,
            Self::Settings => Self::Input,
        }
    }
}

/// One editable row of the connection settings form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Backend,
    Host,
    Port,
    User,
    Password,
    Database,
}

const SERVER_FIELDS: &[SettingsField] = &[
    SettingsField::Backend,
    SettingsField::Host,
    SettingsField::Port,
    SettingsField::User,
    SettingsField::Password,
    SettingsField::Database,
];

const FILE_FIELDS: &[SettingsField] = &[SettingsField::Backend, SettingsField::Database];

impl SettingsField {
    /// Label shown next to the field.
    pub fn label(self, backend: DatabaseBackend) -> &'static str {
        match self {
            Self::Backend => "Backend",
            Self::Host => "Host",
            Self::Port => "Port",
            Self::User => "User",
            Self::Password => "Password",
            Self::Database if backend == DatabaseBackend::Sqlite => "File",
            Self::Database => "Database",
        }
    }
}

/// Connection settings being edited in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    pub backend: DatabaseBackend,
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub selected: SettingsField,
}

impl SettingsForm {
    /// Prefills the form from connection defaults.
    pub fn from_config(config: &ConnectionConfig) -> Self {
        let port = match config.backend {
            DatabaseBackend::Sqlite => DatabaseBackend::MySql.default_port(),
            DatabaseBackend::MySql => config.port,
        };
        let defaults = ConnectionConfig::default();
        let or_default = |value: &str, fallback: String| {
            if value.is_empty() && config.backend == DatabaseBackend::Sqlite {
                fallback
            } else {
                value.to_string()
            }
        };

        Self {
            backend: config.backend,
            host: or_default(&config.host, defaults.host),
            port: port.to_string(),
            user: or_default(&config.user, defaults.user),
            password: config.password.clone(),
            database: config.database.clone(),
            selected: SettingsField::Host,
        }
    }

    /// Fields shown for the current backend.
    pub fn visible_fields(&self) -> &'static [SettingsField] {
        match self.backend {
            DatabaseBackend::MySql => SERVER_FIELDS,
            DatabaseBackend::Sqlite => FILE_FIELDS,
        }
    }

    /// Value as displayed; the password is masked.
    pub fn display_value(&self, field: SettingsField) -> String {
        match field {
            SettingsField::Backend => self.backend.as_str().to_string(),
            SettingsField::Host => self.host.clone(),
            SettingsField::Port => self.port.clone(),
            SettingsField::User => self.user.clone(),
            SettingsField::Password => "*".repeat(self.password.chars().count()),
            SettingsField::Database => self.database.clone(),
        }
    }

    /// Moves the selection down, wrapping around.
    pub fn select_next(&mut self) {
        let fields = self.visible_fields();
        let index = self.selected_index();
        self.selected = fields[(index + 1) % fields.len()];
    }

    /// Moves the selection up, wrapping around.
    pub fn select_prev(&mut self) {
        let fields = self.visible_fields();
        let index = self.selected_index();
        self.selected = fields[(index + fields.len() - 1) % fields.len()];
    }

    fn selected_index(&self) -> usize {
        self.visible_fields()
            .iter()
            .position(|f| *f == self.selected)
            .unwrap_or(0)
    }

    /// Switches between MySQL and SQLite.
    pub fn toggle_backend(&mut self) {
        self.backend = match self.backend {
            DatabaseBackend::MySql => DatabaseBackend::Sqlite,
            DatabaseBackend::Sqlite => DatabaseBackend::MySql,
        };
        if !self.visible_fields().contains(&self.selected) {
            self.selected = SettingsField::Backend;
        }
    }

    /// Types a character into the selected field.
    pub fn insert(&mut self, c: char) {
        match self.selected {
            SettingsField::Backend => {
                if c == ' ' {
                    self.toggle_backend();
                }
            }
            SettingsField::Port if !c.is_ascii_digit() => {}
            field => {
                if let Some(value) = self.text_mut(field) {
                    value.push(c);
                }
            }
        }
    }

    /// Deletes the last character of the selected field.
    pub fn backspace(&mut self) {
        if let Some(value) = self.text_mut(self.selected) {
            value.pop();
        }
    }

    fn text_mut(&mut self, field: SettingsField) -> Option<&mut String> {
        match field {
            SettingsField::Backend => None,
            SettingsField::Host => Some(&mut self.host),
            SettingsField::Port => Some(&mut self.port),
            SettingsField::User => Some(&mut self.user),
            SettingsField::Password => Some(&mut self.password),
            SettingsField::Database => Some(&mut self.database),
        }
    }

    /// Builds connection settings from the form.
    pub fn to_config(&self) -> Result<ConnectionConfig> {
        match self.backend {
            DatabaseBackend::Sqlite => {
                if self.database.trim().is_empty() {
                    return Err(SqlChatError::config("Database file path is required"));
                }
                Ok(ConnectionConfig::sqlite(self.database.clone()))
            }
            DatabaseBackend::MySql => {
                if self.host.trim().is_empty() {
                    return Err(SqlChatError::config("Database host is required"));
                }
                let port = self
                    .port
                    .parse::<u16>()
                    .map_err(|_| SqlChatError::config(format!("Invalid port '{}'", self.port)))?;
                Ok(ConnectionConfig {
                    backend: self.backend,
                    host: self.host.clone(),
                    port,
                    user: self.user.clone(),
                    password: self.password.clone(),
                    database: self.database.clone(),
                })
            }
        }
    }
}

/// Input state for text editing.
///
/// The cursor is a character index, not a byte offset.
#[derive(Debug, Default)]
pub struct InputState {
    /// Current input text.
    pub text: String,
    /// Cursor position (character index).
    pub cursor: usize,
}

impl InputState {
    /// Creates a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    fn byte_index(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Inserts a character at the cursor position.
    pub fn insert(&mut self, c: char) {
        let index = self.byte_index();
        self.text.insert(index, c);
        self.cursor += 1;
    }

    /// Deletes the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let index = self.byte_index();
            self.text.remove(index);
        }
    }

    /// Deletes the character at the cursor (delete key).
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let index = self.byte_index();
            self.text.remove(index);
        }
    }

    /// Moves the cursor left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Moves the cursor right.
    pub fn move_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    /// Moves the cursor to the start of the input.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor to the end of the input.
    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Clears the input and returns the previous text.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }
}

/// Main application state.
pub struct App {
    /// Whether the application is still running.
    pub running: bool,
    /// Current focus panel.
    pub focus: Focus,
    /// Question input state.
    pub input: InputState,
    /// Connection settings form.
    pub settings: SettingsForm,
    /// Conversation snapshot, oldest first.
    pub turns: Vec<Turn>,
    /// Current status line.
    pub status: Status,
    /// Label of the active connection.
    pub connection: Option<String>,
    /// Chat scroll offset (lines from bottom).
    pub chat_scroll: usize,
}

impl App {
    /// Creates a new App with the settings form prefilled from `defaults`.
    pub fn new(defaults: &ConnectionConfig) -> Self {
        Self {
            running: true,
            focus: Focus::default(),
            input: InputState::new(),
            settings: SettingsForm::from_config(defaults),
            turns: History::new().turns().to_vec(),
            status: Status::Disconnected,
            connection: None,
            chat_scroll: 0,
        }
    }

    /// Replaces the conversation snapshot and scrolls to the bottom.
    pub fn set_history(&mut self, history: &History) {
        self.turns = history.turns().to_vec();
        self.chat_scroll = 0;
    }

    /// Sets the status line.
    ///
    /// A failed reconnect leaves the previous connection label in place.
    pub fn set_status(&mut self, status: Status) {
        match &status {
            Status::Connected(label) => self.connection = Some(label.clone()),
            Status::Disconnected => self.connection = None,
            Status::Processing(_) => self.chat_scroll = 0,
            _ => {}
        }
        self.status = status;
    }

    /// Label of the active connection, if any.
    pub fn connection_label(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// Question waiting for an answer, shown at the bottom of the chat.
    pub fn pending_question(&self) -> Option<&str> {
        match &self.status {
            Status::Processing(question) => Some(question),
            _ => None,
        }
    }

    /// Handles a key press, returning an action for the session loop if one
    /// was completed.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<UserAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => {
                    self.running = false;
                    Some(UserAction::Quit)
                }
                _ => None,
            };
        }

        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = self.focus.next();
                return None;
            }
            KeyCode::PageUp => {
                self.chat_scroll = self.chat_scroll.saturating_add(SCROLL_STEP);
                return None;
            }
            KeyCode::PageDown => {
                self.chat_scroll = self.chat_scroll.saturating_sub(SCROLL_STEP);
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Input => self.handle_input_key(key),
            Focus::Settings => self.handle_settings_key(key),
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Option<UserAction> {
        match key.code {
            KeyCode::Enter => {
                let text = self.input.take();
                if text.trim().is_empty() {
                    return None;
                }
                return Some(UserAction::Ask(text));
            }
            KeyCode::Char(c) => self.input.insert(c),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            _ => {}
        }
        None
    }

    fn handle_settings_key(&mut self, key: KeyEvent) -> Option<UserAction> {
        match key.code {
            KeyCode::Enter => match self.settings.to_config() {
                Ok(config) => return Some(UserAction::Connect(config)),
                Err(e) => self.status = Status::from_error(&e),
            },
            KeyCode::Up => self.settings.select_prev(),
            KeyCode::Down => self.settings.select_next(),
            KeyCode::Left | KeyCode::Right if self.settings.selected == SettingsField::Backend => {
                self.settings.toggle_backend();
            }
            KeyCode::Char(c) => self.settings.insert(c),
            KeyCode::Backspace => self.settings.backspace(),
            _ => {}
        }
        None
    }
}
