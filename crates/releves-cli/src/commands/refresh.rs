use releves_core::{ClientConfig, RefreshOutcome};

use crate::commands::common::open_online_engine;
use crate::error::CliError;

pub async fn run_refresh(
    days: Option<u32>,
    force: bool,
    config: &ClientConfig,
) -> Result<(), CliError> {
    let mut engine = open_online_engine(config).await?;

    let pending = engine.pending_count();
    if pending > 0 && !force {
        return Err(CliError::PendingEntries(pending));
    }

    let days = days.unwrap_or(config.refresh_window_days);
    match engine.refresh_from_server(days).await? {
        RefreshOutcome::Replaced(count) => {
            println!("Refreshed {count} reading(s) from the last {days} day(s)");
            Ok(())
        }
        RefreshOutcome::Skipped { pending } => Err(CliError::PendingEntries(pending)),
        RefreshOutcome::Failed(error) => Err(error.into()),
    }
}
