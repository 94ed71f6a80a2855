use releves_core::{ClientConfig, Entry};

use crate::commands::common::{format_entry_lines, open_engine, EntryItem};
use crate::error::CliError;

pub fn run_list(
    limit: usize,
    pending_only: bool,
    as_json: bool,
    config: &ClientConfig,
) -> Result<(), CliError> {
    let engine = open_engine(config)?;
    let entries = engine
        .entries()
        .iter()
        .filter(|entry| !pending_only || entry.dirty)
        .take(limit)
        .collect::<Vec<&Entry>>();

    if as_json {
        let items = entries
            .iter()
            .map(|entry| EntryItem::from(*entry))
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if entries.is_empty() {
        println!("No readings recorded.");
    } else {
        for line in format_entry_lines(&entries) {
            println!("{line}");
        }
    }

    Ok(())
}
