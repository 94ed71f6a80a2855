use releves_core::ClientConfig;

use crate::commands::common::{format_sync_report, open_online_engine, sync_result};
use crate::error::CliError;

pub async fn run_sync(config: &ClientConfig) -> Result<(), CliError> {
    let mut engine = open_online_engine(config).await?;
    let report = engine.synchronize().await?;

    for line in format_sync_report(&report) {
        println!("{line}");
    }
    sync_result(&report)
}
