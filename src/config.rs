//! # Probe Configuration
//!
//! The probe runs against a fixed set of targets with fixed credentials. The
//! defaults reproduce the compiled-in setup; `from_env` layers optional
//! environment overrides on top of them.

use std::fmt;
use std::time::Duration;
use url::Url;

use crate::constants::{self, env_vars};
use crate::error::{ConfigError, ConfigResult};

/// One (base address, database identifier) pair probed by a runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub base_url: Url,
    pub database: String,
}

impl Target {
    pub fn new(base_url: &str, database: impl Into<String>) -> ConfigResult<Self> {
        let base_url = parse_base_url(base_url)?;
        let database = database.into();
        if database.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "database",
                database,
                "database identifier must not be empty",
            ));
        }
        Ok(Self { base_url, database })
    }

    /// Parse a `base_url#database` entry as used in `PROBE_TARGETS`
    pub fn parse(entry: &str) -> ConfigResult<Self> {
        let (base, database) = entry.trim().rsplit_once('#').ok_or_else(|| {
            ConfigError::invalid_value(
                env_vars::TARGETS,
                entry,
                "expected '<base_url>#<database>'",
            )
        })?;
        Self::new(base, database)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.base_url, self.database)
    }
}

/// Login credentials, constant for the process lifetime
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(constants::DEFAULT_USER, constants::DEFAULT_PASSWORD)
    }
}

// Password stays out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub targets: Vec<Target>,
    pub interval: Duration,
    pub credentials: Credentials,
    /// Per-request deadline. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let base_url =
            Url::parse(constants::DEFAULT_BASE_URL).expect("default base URL is a valid literal");
        let targets = constants::DEFAULT_DATABASES
            .iter()
            .map(|db| Target {
                base_url: base_url.clone(),
                database: (*db).to_string(),
            })
            .collect();

        Self {
            targets,
            interval: constants::DEFAULT_INTERVAL,
            credentials: Credentials::default(),
            request_timeout: None,
        }
    }
}

impl ProbeConfig {
    /// Defaults overlaid with any `PROBE_*` environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(targets) = lookup(env_vars::TARGETS) {
            config.targets = targets
                .split(',')
                .filter(|entry| !entry.trim().is_empty())
                .map(Target::parse)
                .collect::<ConfigResult<Vec<_>>>()?;
        }

        if let Some(interval) = lookup(env_vars::INTERVAL_MS) {
            config.interval = Duration::from_millis(parse_millis(env_vars::INTERVAL_MS, &interval)?);
        }

        if let Some(user) = lookup(env_vars::USER) {
            config.credentials.user = user;
        }

        if let Some(password) = lookup(env_vars::PASSWORD) {
            config.credentials.password = password;
        }

        if let Some(timeout) = lookup(env_vars::REQUEST_TIMEOUT_MS) {
            let millis = parse_millis(env_vars::REQUEST_TIMEOUT_MS, &timeout)?;
            config.request_timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }

        if self.interval.is_zero() {
            return Err(ConfigError::invalid_value(
                env_vars::INTERVAL_MS,
                "0",
                "interval must be greater than zero",
            ));
        }

        if let Some(target) = self.targets.iter().find(|t| t.database.trim().is_empty()) {
            return Err(ConfigError::invalid_value(
                "database",
                target.to_string(),
                "database identifier must not be empty",
            ));
        }

        Ok(())
    }
}

fn parse_base_url(raw: &str) -> ConfigResult<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::invalid_value("base_url", raw, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid_value(
            "base_url",
            raw,
            "scheme must be http or https",
        ));
    }
    // Endpoint paths are joined relative to the base, so it must end in '/'
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_millis(key: &str, raw: &str) -> ConfigResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::invalid_value(key, raw, e.to_string()))
}
