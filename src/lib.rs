//! sqlchat - Chat with your SQL database in natural language.
//!
//! This library exposes the core modules for use in integration tests.

pub mod app;
pub mod cli;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod history;
pub mod llm;
pub mod logging;
pub mod repl;
pub mod session;
pub mod statement;
pub mod surface;
pub mod tui;
