//! Query the game server's health endpoint.

use anyhow::{Context, Result};
use smart_horses_client::{GameService, HttpGameService};

use crate::config::ClientConfig;

/// Run the health command.
pub async fn run(config: &ClientConfig) -> Result<()> {
    let service = HttpGameService::new(&config.server.url, config.timeout())
        .context("Invalid server configuration")?;

    let health = service
        .health()
        .await
        .with_context(|| format!("Health check against {} failed", service.base_url()))?;

    println!("=== smart-horses health ===");
    println!();
    println!("Server: {}", service.base_url());
    println!("Status: {}", health.status);
    for (key, value) in &health.details {
        println!("  {key}: {value}");
    }

    Ok(())
}
