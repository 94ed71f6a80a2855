//! Shared client state types.

use crate::sync::SyncReport;

/// Reconciliation status shown by clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// The server could not be reached
    Offline,
    /// Every local entry is confirmed by the server
    Synced,
    /// Some entries are still waiting for the server
    Pending,
    /// The last synchronization reported errors
    Error,
}

impl SyncState {
    /// Derive the state after a synchronization sweep.
    pub const fn from_report(report: &SyncReport) -> Self {
        if report.had_errors() {
            Self::Error
        } else if report.remaining > 0 {
            Self::Pending
        } else {
            Self::Synced
        }
    }

    /// Derive the state from connectivity and the pending count alone.
    pub const fn from_pending(online: bool, pending: usize) -> Self {
        if !online {
            Self::Offline
        } else if pending > 0 {
            Self::Pending
        } else {
            Self::Synced
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Synced => "synced",
            Self::Pending => "pending",
            Self::Error => "error",
        }
    }
}
