//! Plain line-oriented surface.
//!
//! Reads one line per action from an async reader and prints new assistant
//! turns and status lines to a writer. Used with `--plain` and for scripted
//! sessions where a full-screen terminal is not available.

use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::config::ConnectionConfig;
use crate::db::DatabaseBackend;
use crate::error::{Result, SqlChatError};
use crate::history::{History, Turn};
use crate::surface::{Status, Surface, UserAction};

const HELP_TEXT: &str = r#"Commands:
  /connect key=value ...  Connect (keys: backend, host, port, user, password, database)
                          Quote values that contain spaces: password="two words"
  /connect <url>          Connect with a mysql:// or sqlite:// connection string
  /help                   Show this help
  /quit, /exit            Leave
Anything else is sent as a question."#;

/// Line-oriented surface over any async reader and writer.
pub struct LineSurface<R, W> {
    reader: R,
    writer: W,
    defaults: ConnectionConfig,
    printed: usize,
}

impl<R, W> LineSurface<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Creates a surface; `defaults` seeds `/connect` settings.
    pub fn new(reader: R, writer: W, defaults: ConnectionConfig) -> Self {
        Self {
            reader,
            writer,
            defaults,
            printed: 0,
        }
    }

    /// Consumes the surface and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{line}")
            .and_then(|_| self.writer.flush())
            .map_err(|e| SqlChatError::internal(format!("Failed to write output: {e}")))
    }

    fn prompt(&mut self) -> Result<()> {
        write!(self.writer, "> ")
            .and_then(|_| self.writer.flush())
            .map_err(|e| SqlChatError::internal(format!("Failed to write output: {e}")))
    }
}

#[async_trait]
impl<R, W> Surface for LineSurface<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    fn render_history(&mut self, history: &History) -> Result<()> {
        let new_turns: Vec<String> = history
            .turns()
            .iter()
            .skip(self.printed)
            .filter_map(|turn| match turn {
                // The user already sees what they typed
                Turn::Human(_) => None,
                Turn::Assistant(text) => Some(format!("AI: {text}")),
            })
            .collect();
        self.printed = history.len();

        for line in new_turns {
            self.write_line(&line)?;
        }
        Ok(())
    }

    async fn accept_input(&mut self) -> Result<UserAction> {
        loop {
            self.prompt()?;

            let mut line = String::new();
            let read = self
                .reader
                .read_line(&mut line)
                .await
                .map_err(|e| SqlChatError::internal(format!("Failed to read input: {e}")))?;
            if read == 0 {
                return Ok(UserAction::Quit);
            }

            let line = line.trim();
            let Some(command) = line.strip_prefix('/') else {
                return Ok(UserAction::Ask(line.to_string()));
            };

            let (name, args) = command.split_once(' ').unwrap_or((command, ""));
            match name {
                "quit" | "exit" => return Ok(UserAction::Quit),
                "help" => self.write_line(HELP_TEXT)?,
                "connect" => match parse_connect_args(args, &self.defaults) {
                    Ok(config) => {
                        self.defaults = config.clone();
                        return Ok(UserAction::Connect(config));
                    }
                    Err(e) => self.write_line(&Status::from_error(&e).line())?,
                },
                other => self.write_line(&format!("Unknown command: /{other}. Try /help."))?,
            }
        }
    }

    fn show_status(&mut self, status: &Status) -> Result<()> {
        self.write_line(&status.line())
    }
}

/// Builds connection settings from `/connect` arguments.
///
/// Accepts either a connection string or `key=value` pairs applied on top
/// of `base`. Values may be quoted with `'` or `"`.
pub fn parse_connect_args(args: &str, base: &ConnectionConfig) -> Result<ConnectionConfig> {
    let words = split_args(args)?;
    if let [url] = words.as_slice() {
        if url.contains("://") {
            return ConnectionConfig::from_connection_string(url);
        }
    }

    let mut config = base.clone();
    let mut port_given = false;

    for pair in &words {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            SqlChatError::config(format!("Expected key=value, got '{pair}'"))
        })?;

        match key.to_lowercase().as_str() {
            "backend" => {
                config.backend = DatabaseBackend::parse(value).ok_or_else(|| {
                    SqlChatError::config(format!("Unknown backend '{value}'"))
                })?;
            }
            "host" => config.host = value.to_string(),
            "port" => {
                config.port = value
                    .parse()
                    .map_err(|_| SqlChatError::config(format!("Invalid port '{value}'")))?;
                port_given = true;
            }
            "user" => config.user = value.to_string(),
            "password" => config.password = value.to_string(),
            "database" | "db" => config.database = value.to_string(),
            other => {
                return Err(SqlChatError::config(format!(
                    "Unknown connection setting '{other}'"
                )))
            }
        }
    }

    if config.backend == DatabaseBackend::Sqlite {
        return Ok(ConnectionConfig::sqlite(config.database));
    }
    if config.backend != base.backend && !port_given {
        config.port = config.backend.default_port();
    }
    Ok(config)
}

/// Splits arguments on whitespace, keeping quoted sections together.
///
/// Inside double quotes a backslash escapes the next character.
fn split_args(input: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                in_word = true;
                let quote = c;
                loop {
                    match chars.next() {
                        Some(ch) if ch == quote => break,
                        Some('\\') if quote == '"' => {
                            if let Some(escaped) = chars.next() {
                                current.push(escaped);
                            }
                        }
                        Some(ch) => current.push(ch),
                        None => {
                            return Err(SqlChatError::config(format!(
                                "Unterminated {quote} quote in /connect arguments"
                            )))
                        }
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}
