//! releves-core - Core library for Releves
//!
//! This crate contains the entry model, its validation rules, the local store
//! and the reconciliation engine shared by the CLI client and the API server.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod state;
pub mod sync;
pub mod util;

pub use config::ClientConfig;
pub use db::{Database, LocalStore, MemoryStore, SqliteStore};
pub use error::{Error, Result};
pub use models::{validate, Entry, EntryCollection, EntryDraft, EntryState, Field, FieldError};
pub use state::SyncState;
pub use sync::{
    GatewayError, HttpGateway, OfflineGateway, PushOutcome, ReconciliationEngine,
    RefreshOutcome, RemoteGateway, SyncReport,
};
