//! Storage Module
//!
//! SQLite-based storage layer with:
//! - Per-(user, deck, card) review records
//! - Serialized read-modify-write grading transactions
//! - Due-card queries and per-user summary rollups

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{Result, Storage, StorageError};
