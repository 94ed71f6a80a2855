mod config;
mod db;
mod error;
mod routes;

use std::sync::Arc;

use config::AppConfig;
use db::ReadingStore;
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("releves_api=info".parse()?),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!("Starting releves-api with config: {:?}", config);

    let store = ReadingStore::open(&config.database_uri)?;
    let bind_addr = config.bind_addr.clone();
    let router = app_router(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("releves-api listening on {}", bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
