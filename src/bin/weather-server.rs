//! Weather MCP server over stdio. Logs go to stderr; stdout carries the protocol.

use rmcp::transport::stdio;
use rmcp::ServiceExt;
use tether::weather::{WeatherConfig, WeatherServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = WeatherConfig::from_env();
    info!(base_url = %config.base_url, "Starting weather MCP server");

    let service = WeatherServer::new(config)?
        .serve(stdio())
        .await
        .map_err(|e| {
            error!("Failed to start MCP server: {:?}", e);
            anyhow::anyhow!("Failed to start MCP server: {}", e)
        })?;

    service.waiting().await?;
    Ok(())
}
