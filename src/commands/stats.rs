//! `snapbooth stats` - print store counters.

use anyhow::{Context, Result};
use snapbooth::daemon::client::{self, MaintenanceClient};
use snapbooth::daemon::config::Config;

pub async fn execute(config: &Config, json: bool) -> Result<()> {
    let server = MaintenanceClient::from_config(config);
    let (stats, target) = client::stats(&server, &config.data_dir()?).await?;

    if json {
        let out = serde_json::to_string_pretty(&stats).context("Failed to serialize stats")?;
        println!("{out}");
        return Ok(());
    }

    let sessions = stats.sessions;
    println!("{:<12} COUNT", "SESSIONS");
    println!("{}", "─".repeat(24));
    println!("{:<12} {}", "processing", sessions.processing);
    println!("{:<12} {}", "completed", sessions.completed);
    println!("{:<12} {}", "expired", sessions.expired);
    println!("{:<12} {}", "live", sessions.live());
    println!("\nCoupons: {}", stats.coupons);
    println!("Source:  {target}");
    Ok(())
}
