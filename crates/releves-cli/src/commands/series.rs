use releves_core::models::sensor_series;
use releves_core::ClientConfig;

use crate::commands::common::open_engine;
use crate::error::CliError;

pub fn run_series(config: &ClientConfig) -> Result<(), CliError> {
    let engine = open_engine(config)?;
    let series = sensor_series(engine.entries());
    println!("{}", serde_json::to_string_pretty(&series)?);
    Ok(())
}
