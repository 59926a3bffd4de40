//! GitNetDisk intermediary server
//!
//! # Environment Variables
//!
//! - `NET_DISK_API_PORT`: Port to listen on (default: 3000)
//! - `NET_DISK_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `NET_DISK_UPSTREAM_URL`: GitHub REST API base URL (default: https://api.github.com)
//! - `RUST_LOG`: Log level (default: info)

use std::env;

use net_disk_api::{ApiConfig, ApiServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config = ApiConfig::from_env()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        host = config.host.as_str(),
        port = config.port,
        "Starting GitNetDisk intermediary"
    );

    ApiServer::new(config).serve().await
}
