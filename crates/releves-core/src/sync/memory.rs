//! Scriptable in-process gateway

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::gateway::{GatewayError, GatewayResult, RemoteGateway, SaveResponse};
use super::wire::ServerEntry;
use crate::models::{Entry, FieldError};

/// Scripted reply to the next save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveReply {
    /// Accept with the given id
    Accept(i64),
    /// Reject with per-field errors
    Reject(Vec<FieldError>),
    /// Fail at the transport level
    Fail(GatewayError),
    /// Never answer within any reasonable timeout
    Hang,
}

const HANG: Duration = Duration::from_secs(3600);

#[derive(Debug, Default)]
struct State {
    offline: bool,
    server_entries: Vec<ServerEntry>,
    save_replies: VecDeque<SaveReply>,
    list_failure: Option<GatewayError>,
    saved: Vec<ServerEntry>,
    list_calls: usize,
}

/// Gateway backed by memory, for engine tests.
///
/// Without a scripted reply a save is accepted the way the reference server
/// does it: the entry keeps its server id, or gets its timestamp's epoch
/// seconds when created. Accepted entries are visible to later list calls.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    state: Arc<Mutex<State>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_online(&self, online: bool) {
        self.lock().offline = !online;
    }

    /// Queue the reply of the next save request.
    pub fn push_save_reply(&self, reply: SaveReply) {
        self.lock().save_replies.push_back(reply);
    }

    /// Replace the server-side entries returned by list calls.
    pub fn set_server_entries(&self, entries: &[Entry]) {
        self.lock().server_entries = entries.iter().map(ServerEntry::from_entry).collect();
    }

    /// Make the next list call fail.
    pub fn fail_next_list(&self, error: GatewayError) {
        self.lock().list_failure = Some(error);
    }

    /// Every save request received, in order.
    pub fn saved_requests(&self) -> Vec<ServerEntry> {
        self.lock().saved.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn default_reply(entry: &ServerEntry) -> SaveReply {
        if entry.id > 0 {
            return SaveReply::Accept(entry.id);
        }
        let id = Entry::new(entry.dt.as_str())
            .epoch_seconds()
            .filter(|id| *id > 0);
        id.map_or_else(
            || {
                SaveReply::Fail(GatewayError::InvalidPayload(format!(
                    "cannot key entry dated {:?}",
                    entry.dt
                )))
            },
            SaveReply::Accept,
        )
    }
}

impl RemoteGateway for MemoryGateway {
    async fn create_or_update_entry(&self, entry: &Entry) -> GatewayResult<SaveResponse> {
        let request = ServerEntry::from_entry(entry);
        let reply = {
            let mut state = self.lock();
            state.saved.push(request.clone());
            if state.offline {
                return Err(GatewayError::Offline);
            }
            state
                .save_replies
                .pop_front()
                .unwrap_or_else(|| Self::default_reply(&request))
        };

        match reply {
            SaveReply::Accept(id) => {
                let mut state = self.lock();
                state.server_entries.retain(|stored| stored.id != id);
                state.server_entries.push(ServerEntry { id, ..request });
                Ok(SaveResponse::accepted(id))
            }
            SaveReply::Reject(errors) => Ok(SaveResponse::rejected(errors)),
            SaveReply::Fail(error) => Err(error),
            SaveReply::Hang => {
                tokio::time::sleep(HANG).await;
                Err(GatewayError::Timeout(HANG))
            }
        }
    }

    async fn list_recent_entries(&self, _window_days: u32) -> GatewayResult<Vec<ServerEntry>> {
        let mut state = self.lock();
        state.list_calls += 1;
        if state.offline {
            return Err(GatewayError::Offline);
        }
        if let Some(error) = state.list_failure.take() {
            return Err(error);
        }
        Ok(state.server_entries.clone())
    }

    async fn check_connectivity(&self) -> bool {
        !self.lock().offline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn default_reply_keys_new_entries_by_timestamp() {
        let gateway = MemoryGateway::new();
        let entry = Entry::new("2024-01-01 10:00:00")
            .with_id(-5)
            .with_meter_index("1200");

        let response = gateway.create_or_update_entry(&entry).await.unwrap();
        assert_eq!(response.assigned_id, entry.epoch_seconds());
        assert_eq!(gateway.saved_requests()[0].id, 0);

        let listed = gateway.list_recent_entries(30).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(Some(listed[0].id), entry.epoch_seconds());
    }

    #[tokio::test]
    async fn scripted_replies_are_consumed_in_order() {
        let gateway = MemoryGateway::new();
        gateway.push_save_reply(SaveReply::Accept(42));
        gateway.push_save_reply(SaveReply::Fail(GatewayError::Transport("reset".into())));
        let entry = Entry::new("2024-01-01 10:00:00").with_meter_index("1");

        assert_eq!(
            gateway.create_or_update_entry(&entry).await,
            Ok(SaveResponse::accepted(42))
        );
        assert!(gateway.create_or_update_entry(&entry).await.is_err());
        assert_eq!(gateway.saved_requests().len(), 2);
    }

    #[tokio::test]
    async fn offline_gateway_records_but_refuses() {
        let gateway = MemoryGateway::new();
        gateway.set_online(false);
        let entry = Entry::new("2024-01-01 10:00:00").with_meter_index("1");

        assert!(!gateway.check_connectivity().await);
        assert_eq!(
            gateway.create_or_update_entry(&entry).await,
            Err(GatewayError::Offline)
        );
        assert_eq!(gateway.saved_requests().len(), 1);
    }
}
