//! Connection management for sqlchat.
//!
//! Owns the active database handle and its replacement on reconnect.

pub mod manager;

pub use manager::{ConnectionManager, Handle};
