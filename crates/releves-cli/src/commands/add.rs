use releves_core::ClientConfig;

use crate::cli::EntryFields;
use crate::commands::common::{apply_fields, open_engine_probed, report_save};
use crate::error::CliError;

pub async fn run_add(fields: &EntryFields, config: &ClientConfig) -> Result<(), CliError> {
    let mut engine = open_engine_probed(config).await?;
    let entry = apply_fields(engine.create_empty_entry(), fields);

    let outcome = engine.save_entry(entry).await?;
    report_save(&outcome);
    Ok(())
}
