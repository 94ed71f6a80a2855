//! Releves CLI - Command-line client for sensor and meter readings
//!
//! Readings are always saved locally first and pushed to the server when it
//! can be reached.

mod cli;
mod commands;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::resolve_config;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::reconcile::run_reconcile;
use crate::commands::refresh::run_refresh;
use crate::commands::series::run_series;
use crate::commands::show::run_show;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("releves=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.db_path, cli.server)?;

    match cli.command {
        Commands::Add { fields } => run_add(&fields, &config).await?,
        Commands::Edit { id, fields } => run_edit(id, &fields, &config).await?,
        Commands::Show { id, json } => run_show(id, json, &config)?,
        Commands::List {
            limit,
            pending,
            json,
        } => run_list(limit, pending, json, &config)?,
        Commands::Sync => run_sync(&config).await?,
        Commands::Refresh { days, force } => run_refresh(days, force, &config).await?,
        Commands::Reconcile => run_reconcile(&config).await?,
        Commands::Status { json } => run_status(json, &config).await?,
        Commands::Series => run_series(&config)?,
    }

    Ok(())
}
