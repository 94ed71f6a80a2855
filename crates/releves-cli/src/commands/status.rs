use releves_core::{ClientConfig, SyncState};
use serde::Serialize;

use crate::commands::common::open_engine;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub state: &'static str,
    pub server: Option<String>,
    pub online: bool,
    pub total: usize,
    pub pending: usize,
    pub db_path: String,
}

pub async fn collect_status(config: &ClientConfig) -> Result<StatusReport, CliError> {
    let mut engine = open_engine(config)?;
    let online = config.server_url.is_some() && engine.probe_connectivity().await;
    let pending = engine.pending_count();

    Ok(StatusReport {
        state: SyncState::from_pending(online, pending).label(),
        server: config.server_url.clone(),
        online,
        total: engine.entries().len(),
        pending,
        db_path: config.db_path.display().to_string(),
    })
}

pub async fn run_status(as_json: bool, config: &ClientConfig) -> Result<(), CliError> {
    let status = collect_status(config).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("state:    {}", status.state);
        println!(
            "server:   {}",
            status.server.as_deref().unwrap_or("(not configured)")
        );
        println!("readings: {} ({} pending)", status.total, status.pending);
        println!("database: {}", status.db_path);
    }
    Ok(())
}
