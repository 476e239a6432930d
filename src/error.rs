//! # Probe Error Types
//!
//! Errors raised by a single probe cycle ([`ProbeError`]), by configuration
//! loading ([`ConfigError`]) and by the task group that drives the runners
//! ([`SupervisorError`]).

use std::fmt;
use thiserror::Error;

/// Probe cycle result type
pub type ProbeResult<T> = Result<T, ProbeError>;

/// One step of the authenticate/select/write/read chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeStep {
    Authenticate,
    SelectDatabase,
    VerifiedWrite,
    VerifiedRead,
}

impl ProbeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStep::Authenticate => "authenticate",
            ProbeStep::SelectDatabase => "select database",
            ProbeStep::VerifiedWrite => "verified write",
            ProbeStep::VerifiedRead => "verified read",
        }
    }
}

impl fmt::Display for ProbeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one probe cycle, tagged with the step that failed
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Request could not be sent or the response body could not be read
    #[error("{step}: transport error: {source}")]
    Transport {
        step: ProbeStep,
        #[source]
        source: reqwest::Error,
    },

    /// Response body is not JSON of the expected shape
    #[error("{step}: malformed response body: {source}")]
    Decode {
        step: ProbeStep,
        #[source]
        source: serde_json::Error,
    },

    /// Well-formed response that lacks a required field
    #[error("{step}: {detail}")]
    Protocol { step: ProbeStep, detail: String },
}

impl ProbeError {
    pub fn transport(step: ProbeStep, source: reqwest::Error) -> Self {
        Self::Transport { step, source }
    }

    pub fn decode(step: ProbeStep, source: serde_json::Error) -> Self {
        Self::Decode { step, source }
    }

    pub fn protocol(step: ProbeStep, detail: impl Into<String>) -> Self {
        Self::Protocol {
            step,
            detail: detail.into(),
        }
    }

    /// Step of the chain in which the cycle was aborted
    pub fn step(&self) -> ProbeStep {
        match self {
            ProbeError::Transport { step, .. }
            | ProbeError::Decode { step, .. }
            | ProbeError::Protocol { step, .. } => *step,
        }
    }

    /// Short label for the error kind, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Transport { .. } => "transport",
            ProbeError::Decode { .. } => "decode",
            ProbeError::Protocol { .. } => "protocol",
        }
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, ProbeError::Protocol { .. })
    }
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("No probe targets configured")]
    NoTargets,
}

impl ConfigError {
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Failure that terminates the whole task group
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Failed to install signal handler: {0}")]
    SignalHandler(#[source] std::io::Error),

    #[error("Failed to build HTTP client for {base_url}: {source}")]
    ClientBuild {
        base_url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Task {task} panicked or was aborted: {source}")]
    TaskJoin {
        task: String,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
