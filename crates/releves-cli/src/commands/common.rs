use std::path::PathBuf;

use releves_core::sync::wire::ServerEntry;
use releves_core::sync::{GatewayResult, IdAssignment, PushOutcome, SaveOutcome, SaveResponse};
use releves_core::{
    ClientConfig, Database, Entry, EntryState, HttpGateway, OfflineGateway, ReconciliationEngine,
    RemoteGateway, SqliteStore, SyncReport, SyncState,
};
use serde::Serialize;

use crate::cli::EntryFields;
use crate::error::CliError;

/// Gateway chosen from the configuration: HTTP when a server is set.
pub enum ClientGateway {
    Http(HttpGateway),
    Offline(OfflineGateway),
}

impl RemoteGateway for ClientGateway {
    async fn create_or_update_entry(&self, entry: &Entry) -> GatewayResult<SaveResponse> {
        match self {
            Self::Http(gateway) => gateway.create_or_update_entry(entry).await,
            Self::Offline(gateway) => gateway.create_or_update_entry(entry).await,
        }
    }

    async fn list_recent_entries(&self, window_days: u32) -> GatewayResult<Vec<ServerEntry>> {
        match self {
            Self::Http(gateway) => gateway.list_recent_entries(window_days).await,
            Self::Offline(gateway) => gateway.list_recent_entries(window_days).await,
        }
    }

    async fn check_connectivity(&self) -> bool {
        match self {
            Self::Http(gateway) => gateway.check_connectivity().await,
            Self::Offline(gateway) => gateway.check_connectivity().await,
        }
    }
}

pub type ClientEngine = ReconciliationEngine<SqliteStore, ClientGateway>;

#[derive(Debug, Serialize)]
pub struct EntryItem<'a> {
    #[serde(flatten)]
    pub entry: &'a Entry,
    pub state: EntryState,
}

impl<'a> From<&'a Entry> for EntryItem<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            entry,
            state: entry.state(),
        }
    }
}

/// Environment configuration with command-line overrides applied.
pub fn resolve_config(
    db_path: Option<PathBuf>,
    server: Option<String>,
) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?.with_server_url(server)?;
    if let Some(db_path) = db_path {
        config.db_path = db_path;
    }
    Ok(config)
}

pub fn open_engine(config: &ClientConfig) -> Result<ClientEngine, CliError> {
    let db = Database::open(&config.db_path)?;
    let gateway = match config.server_url.as_deref() {
        Some(url) => ClientGateway::Http(HttpGateway::new(url, config.request_timeout)?),
        None => ClientGateway::Offline(OfflineGateway),
    };
    Ok(ReconciliationEngine::new(
        SqliteStore::new(db),
        gateway,
        config.clone(),
    )?)
}

/// Open the engine and probe the server when one is configured.
pub async fn open_engine_probed(config: &ClientConfig) -> Result<ClientEngine, CliError> {
    let mut engine = open_engine(config)?;
    if config.server_url.is_some() && !engine.probe_connectivity().await {
        tracing::info!("Server unreachable, saving locally");
    }
    Ok(engine)
}

/// Open the engine for a command that needs the server.
pub async fn open_online_engine(config: &ClientConfig) -> Result<ClientEngine, CliError> {
    let url = config
        .server_url
        .clone()
        .ok_or(CliError::ServerNotConfigured)?;
    let mut engine = open_engine(config)?;
    if !engine.probe_connectivity().await {
        return Err(CliError::ServerUnreachable(url));
    }
    Ok(engine)
}

/// Overlay command-line fields on an entry.
pub fn apply_fields(entry: Entry, fields: &EntryFields) -> Entry {
    let mut draft = entry.into_draft();
    if let Some(date) = &fields.date {
        draft.timestamp = Some(date.clone());
    }
    if let Some(sensor1) = &fields.sensor1 {
        draft.sensor1 = Some(sensor1.clone());
    }
    if let Some(sensor2) = &fields.sensor2 {
        draft.sensor2 = Some(sensor2.clone());
    }
    if let Some(sensor3) = &fields.sensor3 {
        draft.sensor3 = Some(sensor3.clone());
    }
    if let Some(meter) = &fields.meter {
        draft.meter_index = Some(meter.clone());
    }
    if let Some(supplement) = fields.supplement {
        draft.supplement_flag = supplement;
    }
    draft.into()
}

pub fn format_entry_line(entry: &Entry) -> String {
    let sensors = if entry.sensor_count() == 0 {
        "-".to_string()
    } else {
        entry.sensors().join(" / ")
    };
    let meter = if entry.has_meter_index() {
        entry.meter_index.as_str()
    } else {
        "-"
    };
    let supplement = if entry.supplement_flag { "+" } else { " " };

    format!(
        "{:>11}  {}  {sensors:<20}  {meter:>10} {supplement}  {}",
        entry.id,
        entry.timestamp,
        entry.state()
    )
}

pub fn format_entry_lines(entries: &[&Entry]) -> Vec<String> {
    entries.iter().map(|entry| format_entry_line(entry)).collect()
}

pub fn format_entry_details(entry: &Entry) -> Vec<String> {
    let or_dash = |value: &str| {
        if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };

    vec![
        format!("id:         {}", entry.id),
        format!("state:      {}", entry.state()),
        format!("date:       {}", entry.timestamp),
        format!("sensor 1:   {}", or_dash(&entry.sensor_reading1)),
        format!("sensor 2:   {}", or_dash(&entry.sensor_reading2)),
        format!("sensor 3:   {}", or_dash(&entry.sensor_reading3)),
        format!("meter:      {}", or_dash(&entry.meter_index)),
        format!(
            "supplement: {}",
            if entry.supplement_flag { "yes" } else { "no" }
        ),
        format!(
            "dirty:      {}",
            if entry.dirty { "yes" } else { "no" }
        ),
    ]
}

pub fn describe_push(push: Option<&PushOutcome>) -> String {
    match push {
        None => "saved locally, server offline".to_string(),
        Some(PushOutcome::Confirmed { .. }) => "confirmed by server".to_string(),
        Some(PushOutcome::Rejected(errors)) => format!(
            "saved locally, rejected by server: {}",
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        ),
        Some(PushOutcome::Failed(error)) => format!("saved locally, not sent: {error}"),
        Some(PushOutcome::Conflict { id, .. }) => {
            format!("saved locally, server id {id} is already held by another reading")
        }
    }
}

/// Print the saved id on stdout and what happened to it on stderr.
pub fn report_save(outcome: &SaveOutcome) {
    println!("{}", outcome.entry.id);
    if let IdAssignment::Collision { derived, assigned } = outcome.assignment {
        eprintln!("id {derived} was taken, reading stored as {assigned}");
    }
    eprintln!("{}", describe_push(outcome.push.as_ref()));
}

pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    if report.attempted == 0 {
        return vec!["Nothing to synchronize".to_string()];
    }

    let mut lines = vec![format!(
        "Pushed {} reading(s): {} confirmed, {} rejected, {} failed, {} pending",
        report.attempted, report.confirmed, report.rejected, report.failed, report.remaining
    )];
    lines.extend(
        report
            .failures
            .iter()
            .map(|failure| format!("  {}: {}", failure.id, failure.reason)),
    );
    lines.push(format!("State: {}", SyncState::from_report(report).label()));
    lines
}

pub const fn sync_result(report: &SyncReport) -> Result<(), CliError> {
    if report.had_errors() {
        Err(CliError::SyncHadErrors {
            rejected: report.rejected,
            failed: report.failed,
        })
    } else {
        Ok(())
    }
}
