use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "releves")]
#[command(about = "Log sensor and meter readings, offline first")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Base URL of the releves server (overrides `RELEVES_SERVER_URL`)
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a new reading
    #[command(alias = "new")]
    Add {
        #[command(flatten)]
        fields: EntryFields,
    },
    /// Change an existing reading
    Edit {
        /// Entry id (negative while pending)
        #[arg(allow_negative_numbers = true)]
        id: i64,
        #[command(flatten)]
        fields: EntryFields,
    },
    /// Show one reading
    Show {
        /// Entry id (negative while pending)
        #[arg(allow_negative_numbers = true)]
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List readings, newest first
    List {
        /// Number of readings to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Only readings not yet confirmed by the server
        #[arg(long)]
        pending: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Push pending readings to the server
    Sync,
    /// Replace local readings with the server's recent window
    Refresh {
        /// Window size in days (defaults to `RELEVES_REFRESH_DAYS` or 30)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        days: Option<u32>,
        /// Refresh even if pending readings would be lost
        #[arg(long)]
        force: bool,
    },
    /// Probe the server, push pending readings, then refresh
    Reconcile,
    /// Show reconciliation status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print chart series of the sensor readings as JSON
    Series,
}

/// Reading fields accepted by `add` and `edit`.
///
/// On `edit`, omitted fields keep their value and an empty value clears one.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFields {
    /// Reading time, `YYYY-MM-DD HH:MM:SS` (defaults to now on add)
    #[arg(short, long, value_name = "DATETIME")]
    pub date: Option<String>,
    /// First sensor reading
    #[arg(long = "s1", value_name = "VALUE", allow_negative_numbers = true)]
    pub sensor1: Option<String>,
    /// Second sensor reading
    #[arg(long = "s2", value_name = "VALUE", allow_negative_numbers = true)]
    pub sensor2: Option<String>,
    /// Third sensor reading
    #[arg(long = "s3", value_name = "VALUE", allow_negative_numbers = true)]
    pub sensor3: Option<String>,
    /// Meter index
    #[arg(short, long, value_name = "INDEX")]
    pub meter: Option<String>,
    /// Supplement flag
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub supplement: Option<bool>,
}

impl EntryFields {
    pub const fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.sensor1.is_none()
            && self.sensor2.is_none()
            && self.sensor3.is_none()
            && self.meter.is_none()
            && self.supplement.is_none()
    }
}
