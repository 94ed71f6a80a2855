//! Local persistence for Releves

mod connection;
mod migrations;
mod store;

pub use connection::Database;
pub use store::{LocalStore, MemoryStore, SqliteStore};
