//! Integration tests for sqlchat.

pub mod common;
pub mod connection_test;
pub mod conversation_test;
pub mod mysql_test;
pub mod repl_test;
pub mod schema_test;
