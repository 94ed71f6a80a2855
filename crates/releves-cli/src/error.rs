use std::io;

use releves_core::config::ConfigError;
use releves_core::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] releves_core::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No field to change; pass at least one of --date, --s1, --s2, --s3, --meter, --supplement")]
    NothingToEdit,
    #[error("No server configured. Set RELEVES_SERVER_URL or pass --server.")]
    ServerNotConfigured,
    #[error("Server {0} is unreachable")]
    ServerUnreachable(String),
    #[error("Synchronization had errors: {rejected} rejected, {failed} failed")]
    SyncHadErrors { rejected: usize, failed: usize },
    #[error("{0} reading(s) not yet confirmed by the server; run `releves sync` or pass --force")]
    PendingEntries(usize),
}
