//! Health command handler

use anyhow::{Context, Result};
use colored::*;
use paperforge_client::PaperforgeClient;

pub async fn check(client: &PaperforgeClient) -> Result<()> {
    let health = client
        .health()
        .await
        .with_context(|| format!("Server at {} is not reachable", client.base_url()))?;

    println!("{} {}", "✓".green(), health.message);
    println!("  Status:   {}", health.status.green());
    println!(
        "  Database: {}",
        if health.backend_configured {
            "configured".green()
        } else {
            "in-memory (records are lost on restart)".yellow()
        }
    );

    Ok(())
}
