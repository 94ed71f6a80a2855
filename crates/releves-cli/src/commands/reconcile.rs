use releves_core::{ClientConfig, RefreshOutcome};

use crate::commands::common::{format_sync_report, open_engine, sync_result};
use crate::error::CliError;

pub async fn run_reconcile(config: &ClientConfig) -> Result<(), CliError> {
    let url = config
        .server_url
        .clone()
        .ok_or(CliError::ServerNotConfigured)?;
    let mut engine = open_engine(config)?;
    let report = engine.startup().await?;

    if !report.online {
        return Err(CliError::ServerUnreachable(url));
    }

    if let Some(sync) = &report.sync {
        for line in format_sync_report(sync) {
            println!("{line}");
        }
    }
    match &report.refresh {
        Some(RefreshOutcome::Replaced(count)) => println!("Refreshed {count} reading(s)"),
        Some(RefreshOutcome::Skipped { pending }) => {
            println!("Refresh skipped, {pending} reading(s) still pending");
        }
        Some(RefreshOutcome::Failed(error)) => println!("Refresh failed: {error}"),
        None => {}
    }

    report.sync.as_ref().map_or(Ok(()), sync_result)
}
