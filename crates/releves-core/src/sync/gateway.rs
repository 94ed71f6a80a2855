//! Remote gateway abstraction

use std::time::Duration;

use thiserror::Error;

use super::wire::ServerEntry;
use crate::models::{Entry, FieldError};

/// Failure talking to the server. Never fatal for the client: the entry
/// concerned simply stays dirty.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Server is unreachable")]
    Offline,
    #[error("Request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Server returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid server payload: {0}")]
    InvalidPayload(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Application-level outcome of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Ok,
    Error,
}

/// Reply to a create-or-update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveResponse {
    pub status: SaveStatus,
    /// Authoritative id, present when the save was accepted
    pub assigned_id: Option<i64>,
    /// Per-field rejections, in local vocabulary
    pub errors: Vec<FieldError>,
}

impl SaveResponse {
    pub const fn accepted(id: i64) -> Self {
        Self {
            status: SaveStatus::Ok,
            assigned_id: Some(id),
            errors: Vec::new(),
        }
    }

    pub const fn rejected(errors: Vec<FieldError>) -> Self {
        Self {
            status: SaveStatus::Error,
            assigned_id: None,
            errors,
        }
    }

    pub const fn is_ok(&self) -> bool {
        matches!(self.status, SaveStatus::Ok)
    }
}

/// Server-side authority for entries.
#[allow(async_fn_in_trait)]
pub trait RemoteGateway {
    /// Create (id 0) or update an entry on the server.
    async fn create_or_update_entry(&self, entry: &Entry) -> GatewayResult<SaveResponse>;

    /// Entries of the trailing `window_days` days, in server vocabulary.
    async fn list_recent_entries(&self, window_days: u32) -> GatewayResult<Vec<ServerEntry>>;

    /// Whether the server answers at all.
    async fn check_connectivity(&self) -> bool;
}

/// Gateway used when no server is configured. Every call fails as offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGateway;

impl RemoteGateway for OfflineGateway {
    async fn create_or_update_entry(&self, _entry: &Entry) -> GatewayResult<SaveResponse> {
        Err(GatewayError::Offline)
    }

    async fn list_recent_entries(&self, _window_days: u32) -> GatewayResult<Vec<ServerEntry>> {
        Err(GatewayError::Offline)
    }

    async fn check_connectivity(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_gateway_refuses_everything() {
        let gateway = OfflineGateway;
        let entry = Entry::new("2024-01-01 10:00:00");

        assert!(!gateway.check_connectivity().await);
        assert_eq!(
            gateway.create_or_update_entry(&entry).await,
            Err(GatewayError::Offline)
        );
        assert_eq!(
            gateway.list_recent_entries(30).await,
            Err(GatewayError::Offline)
        );
    }

    #[test]
    fn timeout_message_names_duration() {
        let error = GatewayError::Timeout(Duration::from_secs(2));
        assert_eq!(error.to_string(), "Request timed out after 2000 ms");
    }
}
