//! Reconciliation between the local collection and the server.
//!
//! The engine owns the entry collection. Every mutation is applied to a copy,
//! written to the local store, and only then swapped in, so a store failure
//! leaves the in-memory collection as it was.

mod gateway;
mod http;
#[cfg(test)]
mod memory;
pub mod wire;

use std::future::Future;
use std::time::Duration;

pub use gateway::{
    GatewayError, GatewayResult, OfflineGateway, RemoteGateway, SaveResponse, SaveStatus,
};
pub use http::HttpGateway;
#[cfg(test)]
pub use memory::{MemoryGateway, SaveReply};

use crate::config::ClientConfig;
use crate::db::LocalStore;
use crate::error::{Error, Result};
use crate::models::{validate, Entry, EntryCollection, Field, FieldError, Upsert};

/// Result of pushing one entry to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The server accepted the entry and gave it `id`
    Confirmed { previous_id: i64, id: i64 },
    /// The server refused the entry; it stays dirty
    Rejected(Vec<FieldError>),
    /// The server could not be reached or answered garbage; it stays dirty
    Failed(GatewayError),
    /// The server answered with an id another local record already holds;
    /// the entry keeps `previous_id` and stays dirty
    Conflict { previous_id: i64, id: i64 },
}

impl PushOutcome {
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// How an entry's identifier was settled on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdAssignment {
    /// The entry already had an id
    Unchanged,
    /// Provisional id derived from the timestamp
    Assigned(i64),
    /// The derived id was taken; the next free one was used instead
    Collision { derived: i64, assigned: i64 },
}

/// What `save_entry` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// The entry as persisted
    pub entry: Entry,
    /// `None` when offline and no push was attempted
    pub push: Option<PushOutcome>,
    pub assignment: IdAssignment,
}

/// One entry a sweep could not confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub id: i64,
    pub reason: String,
}

/// Aggregate result of a synchronization sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub attempted: usize,
    pub confirmed: usize,
    pub rejected: usize,
    pub failed: usize,
    /// Dirty entries left after the sweep
    pub remaining: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// The "synchronization had errors" signal.
    pub const fn had_errors(&self) -> bool {
        self.rejected > 0 || self.failed > 0
    }
}

/// Result of a refresh from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The collection now holds exactly this many server entries
    Replaced(usize),
    /// Dirty entries would have been overwritten; nothing was fetched
    Skipped { pending: usize },
    /// The fetch failed; the previous collection is intact
    Failed(GatewayError),
}

/// What the startup cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    pub online: bool,
    pub sync: Option<SyncReport>,
    pub refresh: Option<RefreshOutcome>,
}

/// Offline-first reconciliation of entries between a local store and a
/// remote gateway.
pub struct ReconciliationEngine<S: LocalStore, G: RemoteGateway> {
    store: S,
    gateway: G,
    config: ClientConfig,
    entries: EntryCollection,
    online: bool,
}

impl<S: LocalStore, G: RemoteGateway> ReconciliationEngine<S, G> {
    /// Load the collection stored under the configured key.
    ///
    /// The engine starts offline; call [`Self::probe_connectivity`] or
    /// [`Self::startup`] to find out otherwise.
    pub fn new(store: S, gateway: G, config: ClientConfig) -> Result<Self> {
        let stored = store.get(&config.storage_key)?.unwrap_or_default();
        let entries = EntryCollection::from_entries(stored);
        tracing::debug!(
            count = entries.len(),
            pending = entries.pending_count(),
            "Loaded local entries"
        );
        Ok(Self {
            store,
            gateway,
            config,
            entries,
            online: false,
        })
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    pub const fn entries(&self) -> &EntryCollection {
        &self.entries
    }

    pub fn get_entry(&self, id: i64) -> Result<&Entry> {
        self.entries.get(id).ok_or(Error::NotFound(id))
    }

    pub fn pending_count(&self) -> usize {
        self.entries.pending_count()
    }

    pub const fn is_online(&self) -> bool {
        self.online
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    /// Blank entry stamped now, ready for editing.
    pub fn create_empty_entry(&self) -> Entry {
        Entry::empty_now()
    }

    /// Ask the gateway whether the server is reachable and remember it.
    pub async fn probe_connectivity(&mut self) -> bool {
        let timeout = self.config.request_timeout;
        self.online = tokio::time::timeout(timeout, self.gateway.check_connectivity())
            .await
            .unwrap_or(false);
        tracing::debug!(online = self.online, "Connectivity probe");
        self.online
    }

    /// Give a new entry its provisional id; entries that have one keep it.
    pub fn assign_identifier_on_save(&self, entry: &mut Entry) -> Result<IdAssignment> {
        if entry.id != 0 {
            return Ok(IdAssignment::Unchanged);
        }

        let derived = entry.derive_provisional_id().ok_or_else(|| {
            Error::Validation(vec![FieldError::new(
                Field::Date,
                format!("Cannot derive an identifier from {:?}.", entry.timestamp),
            )])
        })?;

        let mut assigned = derived;
        while self.entries.contains(assigned) {
            assigned = assigned.checked_sub(1).ok_or_else(|| {
                Error::InvalidInput("provisional identifier space exhausted".to_string())
            })?;
        }
        entry.id = assigned;

        if assigned == derived {
            tracing::debug!(id = assigned, "Assigned provisional id");
            Ok(IdAssignment::Assigned(assigned))
        } else {
            tracing::warn!(
                derived,
                assigned,
                timestamp = %entry.timestamp,
                "Provisional id already taken, using next free id"
            );
            Ok(IdAssignment::Collision { derived, assigned })
        }
    }

    /// Insert or replace `entry`, keep the collection sorted and write it out.
    ///
    /// `previous_id` is the id the entry had before a push confirmed it; the
    /// record under that id is the one replaced.
    pub fn persist_locally(&mut self, entry: Entry, previous_id: Option<i64>) -> Result<Upsert> {
        if entry.is_new() {
            return Err(Error::InvalidInput(
                "entry needs an identifier before it is persisted".to_string(),
            ));
        }

        let mut next = self.entries.clone();
        let id = entry.id;
        let upsert = next.upsert(entry, previous_id);
        next.sort_newest_first();
        self.commit(next)?;
        tracing::debug!(id, ?upsert, "Persisted entry locally");
        Ok(upsert)
    }

    /// Send one entry to the server.
    ///
    /// On success the entry takes the server id and is no longer dirty. Any
    /// other outcome leaves it dirty. Never fails.
    pub async fn push_to_server(&self, entry: &mut Entry) -> PushOutcome {
        self.push_into(&self.entries, entry).await
    }

    /// Push `entry`, refusing a confirmed id that `collection` already holds
    /// for a different record.
    async fn push_into(&self, collection: &EntryCollection, entry: &mut Entry) -> PushOutcome {
        let previous_id = entry.id;
        let response = self
            .bounded(self.gateway.create_or_update_entry(entry))
            .await;

        let outcome = match response {
            Ok(response) if response.is_ok() => match response.assigned_id {
                Some(id) if id > 0 && id != previous_id && collection.contains(id) => {
                    PushOutcome::Conflict { previous_id, id }
                }
                Some(id) if id > 0 => PushOutcome::Confirmed { previous_id, id },
                _ => PushOutcome::Failed(GatewayError::InvalidPayload(
                    "accepted save did not include a positive id".to_string(),
                )),
            },
            Ok(response) => {
                let mut errors = response.errors;
                if errors.is_empty() {
                    errors.push(FieldError::new(Field::Entry, "Rejected by the server."));
                }
                PushOutcome::Rejected(errors)
            }
            Err(error) => PushOutcome::Failed(error),
        };

        match &outcome {
            PushOutcome::Confirmed { id, .. } => {
                entry.id = *id;
                entry.dirty = false;
                tracing::debug!(previous_id, id, "Entry confirmed by server");
            }
            PushOutcome::Rejected(errors) => {
                entry.dirty = true;
                for error in errors {
                    tracing::warn!(
                        id = previous_id,
                        field = %error.field,
                        "Server rejected entry: {}",
                        error.message
                    );
                }
            }
            PushOutcome::Failed(error) => {
                entry.dirty = true;
                tracing::warn!(id = previous_id, "Push failed: {error}");
            }
            PushOutcome::Conflict { id, .. } => {
                entry.dirty = true;
                tracing::warn!(
                    previous_id,
                    id,
                    "Server id already held by another entry, keeping entry pending"
                );
            }
        }
        outcome
    }

    /// Validate, push when online, settle the id and persist.
    ///
    /// Validation errors block the save and come back as
    /// [`Error::Validation`]; server trouble never does.
    pub async fn save_entry(&mut self, mut entry: Entry) -> Result<SaveOutcome> {
        let errors = validate(&entry);
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        entry.dirty = true;
        let previous_id = (!entry.is_new()).then_some(entry.id);

        let push = if self.online {
            Some(self.push_to_server(&mut entry).await)
        } else {
            tracing::debug!(id = entry.id, "Offline, saving locally only");
            None
        };

        let assignment = self.assign_identifier_on_save(&mut entry)?;
        self.persist_locally(entry.clone(), previous_id)?;

        Ok(SaveOutcome {
            entry,
            push,
            assignment,
        })
    }

    /// Push every dirty entry, then write the collection back once.
    ///
    /// Failures are counted, not raised; only a store failure is an error.
    pub async fn synchronize(&mut self) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        let dirty = self.entries.dirty_ids();
        if dirty.is_empty() {
            tracing::debug!("Nothing to synchronize");
            return Ok(report);
        }

        let mut next = self.entries.clone();
        for id in dirty {
            let Some(mut entry) = next.get(id).filter(|entry| entry.dirty).cloned() else {
                continue;
            };
            report.attempted += 1;

            match self.push_into(&next, &mut entry).await {
                PushOutcome::Confirmed { previous_id, .. } => {
                    report.confirmed += 1;
                    next.upsert(entry, Some(previous_id));
                }
                PushOutcome::Rejected(errors) => {
                    report.rejected += 1;
                    report.failures.push(SyncFailure {
                        id,
                        reason: errors
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join("; "),
                    });
                }
                PushOutcome::Failed(error) => {
                    report.failed += 1;
                    report.failures.push(SyncFailure {
                        id,
                        reason: error.to_string(),
                    });
                }
                PushOutcome::Conflict { id: taken, .. } => {
                    report.failed += 1;
                    report.failures.push(SyncFailure {
                        id,
                        reason: format!("server id {taken} is already held by another entry"),
                    });
                }
            }
        }

        next.sort_newest_first();
        self.commit(next)?;
        report.remaining = self.entries.pending_count();

        if report.had_errors() {
            tracing::warn!(
                attempted = report.attempted,
                confirmed = report.confirmed,
                rejected = report.rejected,
                failed = report.failed,
                "Synchronization had errors"
            );
        } else {
            tracing::info!(confirmed = report.confirmed, "Synchronization complete");
        }
        Ok(report)
    }

    /// Replace the whole collection with the server's trailing window.
    ///
    /// A failed fetch changes nothing.
    pub async fn refresh_from_server(&mut self, window_days: u32) -> Result<RefreshOutcome> {
        let fetched = match self
            .bounded(self.gateway.list_recent_entries(window_days))
            .await
        {
            Ok(fetched) => fetched,
            Err(error) => {
                tracing::warn!(window_days, "Refresh failed: {error}");
                return Ok(RefreshOutcome::Failed(error));
            }
        };

        let mut next =
            EntryCollection::from_entries(fetched.into_iter().map(wire::ServerEntry::into_entry));
        next.sort_newest_first();
        let count = next.len();
        self.commit(next)?;

        tracing::info!(count, window_days, "Refreshed entries from server");
        Ok(RefreshOutcome::Replaced(count))
    }

    /// Probe, synchronize, then refresh the configured window.
    ///
    /// The refresh is skipped while entries remain dirty so that nothing
    /// unconfirmed is overwritten.
    pub async fn startup(&mut self) -> Result<StartupReport> {
        if !self.probe_connectivity().await {
            tracing::info!(
                pending = self.pending_count(),
                "Server unreachable, working offline"
            );
            return Ok(StartupReport {
                online: false,
                sync: None,
                refresh: None,
            });
        }

        let sync = self.synchronize().await?;
        let refresh = if sync.remaining > 0 {
            tracing::warn!(
                pending = sync.remaining,
                "Entries still pending, skipping refresh"
            );
            RefreshOutcome::Skipped {
                pending: sync.remaining,
            }
        } else {
            self.refresh_from_server(self.config.refresh_window_days)
                .await?
        };

        Ok(StartupReport {
            online: true,
            sync: Some(sync),
            refresh: Some(refresh),
        })
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = GatewayResult<T>>,
    ) -> GatewayResult<T> {
        let timeout: Duration = self.config.request_timeout;
        tokio::time::timeout(timeout, call)
            .await
            .unwrap_or(Err(GatewayError::Timeout(timeout)))
    }

    fn commit(&mut self, next: EntryCollection) -> Result<()> {
        self.store.set(&self.config.storage_key, next.as_slice())?;
        self.entries = next;
        Ok(())
    }
}
