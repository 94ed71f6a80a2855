use releves_core::ClientConfig;

use crate::commands::common::{format_entry_details, open_engine, EntryItem};
use crate::error::CliError;

pub fn run_show(id: i64, as_json: bool, config: &ClientConfig) -> Result<(), CliError> {
    let engine = open_engine(config)?;
    let entry = engine.get_entry(id)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&EntryItem::from(entry))?);
    } else {
        for line in format_entry_details(entry) {
            println!("{line}");
        }
    }
    Ok(())
}
