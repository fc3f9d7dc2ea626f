//! `snapbooth sweep` - evict expired sessions once.

use anyhow::Result;
use snapbooth::daemon::client::{self, MaintenanceClient, Target};
use snapbooth::daemon::config::Config;

/// Sweeps through the running server when one answers, else the files.
pub async fn execute(config: &Config) -> Result<()> {
    let server = MaintenanceClient::from_config(config);
    let (report, target) = client::sweep(&server, &config.data_dir()?).await?;

    println!(
        "Scanned {} session(s), evicted {} expired",
        report.scanned, report.evicted
    );
    if target == Target::Server {
        println!("(via {})", server.base_url());
    }
    Ok(())
}
