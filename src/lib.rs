#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Verified Probe
//!
//! Periodic smoke-test harness for a tamper-evident key-value store.
//!
//! ## Overview
//!
//! On a fixed interval, every configured target runs one probe cycle:
//! log in, select the database, write a random record through the store's
//! verified write endpoint and read it back through the verified read
//! endpoint. Each outcome is logged. Failures are expected while a target is
//! still starting up, so they never stop the schedule.
//!
//! ## Module Organization
//!
//! - [`client`] - Typed HTTP client for the store endpoints
//! - [`probe`] - The four-step probe cycle and its records
//! - [`runner`] - Fixed-interval scheduling of one target
//! - [`shutdown`] - Shared cancellation and OS signal handling
//! - [`supervisor`] - Task group that runs everything until shutdown
//! - [`config`] - Targets, credentials and intervals
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use verified_probe::config::ProbeConfig;
//! use verified_probe::supervisor::Supervisor;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let supervisor = Supervisor::new(ProbeConfig::from_env()?)?;
//! let report = supervisor.run().await?;
//! for runner in &report.runners {
//!     println!("{}: {} ok, {} failed", runner.target, runner.cycles_succeeded, runner.cycles_failed);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod probe;
pub mod runner;
pub mod shutdown;
pub mod supervisor;

pub use config::{Credentials, ProbeConfig, Target};
pub use error::{ConfigError, ProbeError, ProbeResult, ProbeStep, SupervisorError};
pub use probe::{PayloadSource, ProbeCycle, ProbeOutcome, ProbeRecord};
pub use runner::{PeriodicRunner, RunnerReport};
pub use shutdown::{ShutdownListener, ShutdownToken};
pub use supervisor::{Supervisor, SupervisorReport, SupervisorState, TaskExit};
