//! # Verified Probe
//!
//! Runs probe cycles against every configured target until Ctrl+C or SIGTERM.
//!
//! ## Usage
//!
//! ```bash
//! # Probe db1..db3 on 127.0.0.1:3323 every second
//! cargo run --bin verified-probe
//!
//! # Custom targets and a request deadline
//! PROBE_TARGETS="http://store:3323#db1,http://store:3323#db2" \
//!   PROBE_REQUEST_TIMEOUT_MS=5000 cargo run --bin verified-probe
//! ```

use anyhow::Context;
use tracing::{error, info};

use verified_probe::config::ProbeConfig;
use verified_probe::logging;
use verified_probe::supervisor::Supervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_structured_logging();

    info!("Starting verified-probe");
    info!("   Version: {}", env!("CARGO_PKG_VERSION"));

    let config = ProbeConfig::from_env().context("Failed to load probe configuration")?;
    info!(
        "   Targets: {}",
        config
            .targets
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!("   Interval: {:?}", config.interval);
    info!(
        "   Request timeout: {}",
        config
            .request_timeout
            .map_or_else(|| "none".to_string(), |t| format!("{t:?}"))
    );
    info!("   Press Ctrl+C to shutdown gracefully");

    let supervisor = Supervisor::new(config)?;

    match supervisor.run().await {
        Ok(report) => {
            for runner in &report.runners {
                info!(
                    probe_target = %runner.target,
                    succeeded = runner.cycles_succeeded,
                    failed = runner.cycles_failed,
                    "Runner summary"
                );
            }
            println!("finished clean");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Probe supervisor stopped with an error");
            println!("received error: {e}");
            Err(e.into())
        }
    }
}
