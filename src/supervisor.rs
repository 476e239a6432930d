//! # Supervisor
//!
//! Launches the shutdown listener plus one [`PeriodicRunner`] per target on a
//! single [`ShutdownToken`] and waits for all of them. The group behaves like
//! an error group: the first task that fails (or panics) triggers shutdown for
//! everyone, and its error becomes the group's result. Cancellation itself is
//! a clean exit.
//!
//! ## Lifecycle
//!
//! `Running` → `Cancelling` → `Stopped`. `Stopped` is terminal.

use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::ProbeConfig;
use crate::error::SupervisorError;
use crate::probe::{PayloadSource, ProbeCycle, ThreadRngPayloadSource};
use crate::runner::{PeriodicRunner, RunnerReport};
use crate::shutdown::{shutdown_signal, ReceivedSignal, ShutdownListener, ShutdownToken};

/// How a supervised task finished without failing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExit {
    /// The task did its job and returned
    Completed,
    /// The task stopped because the shared token was triggered
    Cancelled,
}

/// Process-level lifecycle of the task group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Running,
    Cancelling,
    Stopped,
}

impl SupervisorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SupervisorState::Stopped)
    }

    fn rank(self) -> u8 {
        match self {
            SupervisorState::Running => 0,
            SupervisorState::Cancelling => 1,
            SupervisorState::Stopped => 2,
        }
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SupervisorState::Running => "running",
            SupervisorState::Cancelling => "cancelling",
            SupervisorState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Shared read handle on the supervisor's lifecycle state
#[derive(Debug, Clone)]
pub struct SupervisorStateHandle {
    inner: Arc<RwLock<SupervisorState>>,
}

impl SupervisorStateHandle {
    pub fn get(&self) -> SupervisorState {
        *self.inner.read()
    }

    // Only moves forward; a backwards transition is ignored
    fn advance(&self, next: SupervisorState) {
        let mut state = self.inner.write();
        let current = *state;
        if next.rank() > current.rank() {
            info!(from = %current, to = %next, "Supervisor state transition");
            *state = next;
        }
    }
}

/// Result of a clean shutdown
#[derive(Debug, Clone)]
pub struct SupervisorReport {
    pub runners: Vec<RunnerReport>,
    pub listener_exit: Option<TaskExit>,
}

enum TaskReport {
    Listener(TaskExit),
    Runner(RunnerReport),
}

pub struct Supervisor {
    config: ProbeConfig,
    payloads: Arc<dyn PayloadSource>,
    shutdown: ShutdownToken,
    state: SupervisorStateHandle,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("config", &self.config)
            .field("payloads", &self.payloads)
            .field("state", &self.state.get())
            .finish()
    }
}

impl Supervisor {
    pub fn new(config: ProbeConfig) -> Result<Self, SupervisorError> {
        config.validate()?;
        Ok(Self {
            config,
            payloads: Arc::new(ThreadRngPayloadSource),
            shutdown: ShutdownToken::new(),
            state: SupervisorStateHandle {
                inner: Arc::new(RwLock::new(SupervisorState::Running)),
            },
        })
    }

    /// Replace the payload source shared by all runners
    pub fn with_payload_source(mut self, payloads: Arc<dyn PayloadSource>) -> Self {
        self.payloads = payloads;
        self
    }

    /// Token shared by every launched task; triggering it stops the group
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    pub fn state(&self) -> SupervisorStateHandle {
        self.state.clone()
    }

    /// Run until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<SupervisorReport, SupervisorError> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `signal` resolves or the shutdown token is triggered
    pub async fn run_until<F>(self, signal: F) -> Result<SupervisorReport, SupervisorError>
    where
        F: Future<Output = std::io::Result<ReceivedSignal>> + Send + 'static,
    {
        let cycle = ProbeCycle::new(self.config.credentials.clone(), self.payloads.clone());
        let runners = self
            .config
            .targets
            .iter()
            .map(|target| {
                PeriodicRunner::new(
                    target.clone(),
                    self.config.interval,
                    self.config.request_timeout,
                    cycle.clone(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut tasks = JoinSet::new();

        let listener = ShutdownListener::new(self.shutdown.clone(), signal);
        tasks.spawn(async move {
            let result = listener.listen().await.map(TaskReport::Listener);
            ("shutdown listener".to_string(), result)
        });

        for runner in runners {
            let name = format!("runner {}", runner.target());
            let observer = self.shutdown.observer();
            tasks.spawn(async move {
                let report = runner.run(observer).await;
                (name, Ok(TaskReport::Runner(report)))
            });
        }

        info!(
            targets = self.config.targets.len(),
            interval_ms = u64::try_from(self.config.interval.as_millis()).unwrap_or(u64::MAX),
            "Supervisor launched all tasks"
        );

        let mut first_error = None;
        let mut runner_reports = Vec::with_capacity(self.config.targets.len());
        let mut listener_exit = None;
        let mut cancelling = false;

        loop {
            let joined = tokio::select! {
                _ = self.shutdown.triggered(), if !cancelling => {
                    cancelling = true;
                    self.state.advance(SupervisorState::Cancelling);
                    continue;
                }
                joined = tasks.join_next() => joined,
            };

            let Some(joined) = joined else {
                break;
            };

            // A panicking task loses its name along with its output
            let (task, result) = joined.unwrap_or_else(|e| {
                let task = "supervised task".to_string();
                let err = SupervisorError::TaskJoin {
                    task: task.clone(),
                    source: e,
                };
                (task, Err(err))
            });

            match result {
                Ok(TaskReport::Runner(report)) => runner_reports.push(report),
                Ok(TaskReport::Listener(exit)) => listener_exit = Some(exit),
                Err(e) => {
                    error!(task = %task, error = %e, "Supervised task failed, shutting down the group");
                    self.shutdown.trigger();
                    if first_error.is_none() {
                        first_error = Some(e);
                    } else {
                        warn!(task = %task, error = %e, "Additional task failure during shutdown");
                    }
                }
            }
        }

        self.state.advance(SupervisorState::Stopped);

        match first_error {
            Some(e) => Err(e),
            None => Ok(SupervisorReport {
                runners: runner_reports,
                listener_exit,
            }),
        }
    }
}
