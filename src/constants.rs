//! # Probe Constants
//!
//! Compiled-in defaults that define the baseline probing setup, plus the
//! wire-level names used by the store's HTTP surface.

use std::time::Duration;

/// Base address of the store instance probed when no override is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3323";

/// Databases probed on the default base address
pub const DEFAULT_DATABASES: [&str; 3] = ["db1", "db2", "db3"];

/// Time between two probe cycles of the same target
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Login name sent verbatim to the store
pub const DEFAULT_USER: &str = "aW1tdWRi";

/// Password sent verbatim to the store
pub const DEFAULT_PASSWORD: &str = "aW1tdWRi";

/// Exclusive upper bound for the numeric part of a probe payload
pub const PAYLOAD_UPPER_BOUND: u32 = 1_000_000;

/// Prefix of every raw probe payload
pub const PAYLOAD_PREFIX: &str = "data";

/// Store endpoint paths, relative to a target's base address
pub mod endpoints {
    pub const LOGIN: &str = "login";

    pub fn use_database(database: &str) -> String {
        format!("db/use/{database}")
    }

    pub fn verified_set(database: &str) -> String {
        format!("db/{database}/verified/set")
    }

    pub fn verified_get(database: &str) -> String {
        format!("db/{database}/verified/get")
    }
}

/// Environment variables read by [`crate::config::ProbeConfig::from_env`]
pub mod env_vars {
    pub const TARGETS: &str = "PROBE_TARGETS";
    pub const INTERVAL_MS: &str = "PROBE_INTERVAL_MS";
    pub const USER: &str = "PROBE_USER";
    pub const PASSWORD: &str = "PROBE_PASSWORD";
    pub const REQUEST_TIMEOUT_MS: &str = "PROBE_REQUEST_TIMEOUT_MS";
    pub const ENVIRONMENT: &str = "PROBE_ENV";
    pub const LOG_FORMAT: &str = "PROBE_LOG_FORMAT";
}
