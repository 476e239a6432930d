//! # Periodic Runner
//!
//! Drives one target on a fixed interval. Every tick runs one probe cycle;
//! a failed cycle is logged and the loop carries on. The only way out is
//! the shutdown token, which is checked between ticks. A cycle that is
//! already in flight runs to completion.

use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::StoreClient;
use crate::config::Target;
use crate::error::{ConfigError, SupervisorError};
use crate::logging::{log_probe_failure, log_probe_outcome};
use crate::probe::ProbeCycle;
use crate::shutdown::ShutdownObserver;

/// Counters of a runner that has stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerReport {
    pub runner_id: Uuid,
    pub target: Target,
    pub cycles_succeeded: u64,
    pub cycles_failed: u64,
}

impl RunnerReport {
    pub fn cycles_total(&self) -> u64 {
        self.cycles_succeeded + self.cycles_failed
    }
}

#[derive(Debug)]
pub struct PeriodicRunner {
    runner_id: Uuid,
    target: Target,
    interval: Duration,
    client: StoreClient,
    cycle: ProbeCycle,
}

impl PeriodicRunner {
    pub fn new(
        target: Target,
        interval: Duration,
        request_timeout: Option<Duration>,
        cycle: ProbeCycle,
    ) -> Result<Self, SupervisorError> {
        if interval.is_zero() {
            return Err(ConfigError::invalid_value(
                "interval",
                "0",
                "interval must be greater than zero",
            )
            .into());
        }

        let client = StoreClient::new(target.base_url.clone(), request_timeout).map_err(|source| {
            SupervisorError::ClientBuild {
                base_url: target.base_url.to_string(),
                source,
            }
        })?;

        Ok(Self {
            runner_id: Uuid::new_v4(),
            target,
            interval,
            client,
            cycle,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Tick until `shutdown` is triggered. The first tick fires one interval
    /// after start; ticks missed behind a slow cycle are skipped.
    pub async fn run(self, shutdown: ShutdownObserver) -> RunnerReport {
        let mut report = RunnerReport {
            runner_id: self.runner_id,
            target: self.target.clone(),
            cycles_succeeded: 0,
            cycles_failed: 0,
        };

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            runner_id = %self.runner_id,
            database = %self.target.database,
            base_url = %self.target.base_url,
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "Starting periodic runner"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.triggered() => {
                    info!(
                        runner_id = %self.runner_id,
                        database = %self.target.database,
                        succeeded = report.cycles_succeeded,
                        failed = report.cycles_failed,
                        "Closing periodic runner"
                    );
                    break;
                }
                _ = ticker.tick() => {
                    debug!(runner_id = %self.runner_id, database = %self.target.database, "Starting probe cycle");

                    match self.cycle.run(&self.client, &self.target.database).await {
                        Ok(outcome) => {
                            report.cycles_succeeded += 1;
                            log_probe_outcome(&outcome);
                        }
                        Err(e) => {
                            report.cycles_failed += 1;
                            log_probe_failure(&self.target.database, self.target.base_url.as_str(), &e);
                        }
                    }
                }
            }
        }

        report
    }
}
