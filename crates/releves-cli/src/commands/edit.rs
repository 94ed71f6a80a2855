use releves_core::ClientConfig;

use crate::cli::EntryFields;
use crate::commands::common::{apply_fields, open_engine_probed, report_save};
use crate::error::CliError;

pub async fn run_edit(id: i64, fields: &EntryFields, config: &ClientConfig) -> Result<(), CliError> {
    if fields.is_empty() {
        return Err(CliError::NothingToEdit);
    }

    let mut engine = open_engine_probed(config).await?;
    let current = engine.get_entry(id)?.clone();
    let edited = apply_fields(current.clone(), fields);

    if edited == current {
        println!("{id}");
        return Ok(());
    }

    let outcome = engine.save_entry(edited).await?;
    report_save(&outcome);
    Ok(())
}
