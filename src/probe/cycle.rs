//! # Probe Cycle
//!
//! One authenticate → select → verified write → verified read round trip
//! against a single database. Every step needs the previous step's output,
//! and the first failure aborts the cycle. Nothing is retried and no token
//! outlives the cycle.

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use super::record::{PayloadSource, ProbeRecord};
use crate::client::StoreClient;
use crate::config::Credentials;
use crate::error::{ProbeError, ProbeResult, ProbeStep};

/// Wall-clock time spent in each step of a successful cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeTimings {
    pub authenticate: Duration,
    pub select_database: Duration,
    pub verified_write: Duration,
    pub verified_read: Duration,
}

impl ProbeTimings {
    pub fn total(&self) -> Duration {
        self.authenticate + self.select_database + self.verified_write + self.verified_read
    }

    pub fn total_ms(&self) -> u64 {
        u64::try_from(self.total().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Audit trail of a successful cycle
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub database: String,
    pub base_url: String,
    /// Raw payload before transport encoding
    pub payload: String,
    pub encoded_key: String,
    /// `id` returned by the verified write
    pub write_id: Value,
    /// `tx` returned by the verified read
    pub read_tx: Value,
    pub timings: ProbeTimings,
}

/// Runs probe cycles with fixed credentials and an injected payload source
#[derive(Debug, Clone)]
pub struct ProbeCycle {
    credentials: Credentials,
    payloads: Arc<dyn PayloadSource>,
}

impl ProbeCycle {
    pub fn new(credentials: Credentials, payloads: Arc<dyn PayloadSource>) -> Self {
        Self {
            credentials,
            payloads,
        }
    }

    /// Run one full cycle against `database` on the client's base address
    pub async fn run(&self, client: &StoreClient, database: &str) -> ProbeResult<ProbeOutcome> {
        let mut timings = ProbeTimings::default();

        // A missing login token is passed on as an empty Authorization value;
        // the store rejects it at the selection step.
        let started = Instant::now();
        let login = client.login(&self.credentials).await?;
        let session_token = login.body.token.unwrap_or_default();
        timings.authenticate = started.elapsed();

        let started = Instant::now();
        let selected = client.use_database(database, &session_token).await?;
        let database_token = selected
            .body
            .database_token()
            .ok_or_else(|| ProbeError::protocol(ProbeStep::SelectDatabase, "database token not found"))?
            .to_string();
        timings.select_database = started.elapsed();

        let record = ProbeRecord::generate(self.payloads.as_ref());
        debug!(database = %database, payload = %record.payload(), "Writing probe record");

        let started = Instant::now();
        let written = client
            .verified_set(database, &database_token, record.key_value())
            .await?;
        let write_id = written.body.id.ok_or_else(|| {
            ProbeError::protocol(ProbeStep::VerifiedWrite, format!("set:{}", written.raw.trim()))
        })?;
        timings.verified_write = started.elapsed();

        let started = Instant::now();
        let read = client
            .verified_get(database, &database_token, record.encoded())
            .await?;
        let read_tx = read.body.tx.ok_or_else(|| {
            ProbeError::protocol(ProbeStep::VerifiedRead, format!("get:{}", read.raw.trim()))
        })?;
        timings.verified_read = started.elapsed();

        Ok(ProbeOutcome {
            database: database.to_string(),
            base_url: client.base_url().to_string(),
            payload: record.payload().to_string(),
            encoded_key: record.encoded().to_string(),
            write_id,
            read_tx,
            timings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timings_sum_steps() {
        let timings = ProbeTimings {
            authenticate: Duration::from_millis(3),
            select_database: Duration::from_millis(4),
            verified_write: Duration::from_millis(10),
            verified_read: Duration::from_millis(5),
        };
        assert_eq!(timings.total(), Duration::from_millis(22));
        assert_eq!(timings.total_ms(), 22);
    }

    #[tokio::test]
    async fn unreachable_store_fails_at_authenticate() {
        // Port 9 (discard) is not served on loopback in test environments
        let base = url::Url::parse("http://127.0.0.1:9/").unwrap();
        let client = StoreClient::new(base, Some(Duration::from_secs(2))).unwrap();
        let cycle = ProbeCycle::new(
            Credentials::default(),
            Arc::new(super::super::record::FixedPayloadSource(1)),
        );

        let err = cycle.run(&client, "db1").await.unwrap_err();
        assert_eq!(err.step(), ProbeStep::Authenticate);
        assert_eq!(err.kind(), "transport");
    }
}
