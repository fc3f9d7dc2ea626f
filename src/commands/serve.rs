//! `snapbooth serve` - run the HTTP API.

use anyhow::Result;
use snapbooth::daemon::config::Config;

/// Runs the API and sweeper until interrupted. `port` overrides the config.
pub async fn execute(mut config: Config, port: Option<u16>) -> Result<()> {
    if let Some(port) = port {
        config.server.port = port;
        config.validate()?;
    }

    println!(
        "Starting snapbooth on {}:{}...",
        config.server.host, config.server.port
    );
    println!("\nEndpoints:");
    println!("  Sessions:    /sessions, /sessions/reserve, /sessions/:code");
    println!("  Coupons:     /coupons, /coupons/:code, /coupons/:code/{{validate,redeem}}");
    println!("  Maintenance: /maintenance/sweep, /maintenance/stats");
    println!("  System:      /health, /version, /metrics");

    if config.sweeper.enabled {
        println!("\nSweeper: every {}s", config.sweeper.interval_secs);
    } else {
        println!("\nSweeper: disabled");
    }

    println!("\nPress Ctrl+C to stop\n");

    snapbooth::daemon::http::serve(config).await
}
