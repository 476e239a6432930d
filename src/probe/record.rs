//! Probe records and the randomness they are generated from.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::Rng;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::client::KeyValue;
use crate::constants::{PAYLOAD_PREFIX, PAYLOAD_UPPER_BOUND};

/// Source of the numeric part of probe payloads
pub trait PayloadSource: Send + Sync + fmt::Debug {
    /// Next number; values outside `[0, 1_000_000)` are reduced into range
    fn next_value(&self) -> u32;
}

/// Uniform payloads from the thread-local generator
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngPayloadSource;

impl PayloadSource for ThreadRngPayloadSource {
    fn next_value(&self) -> u32 {
        rand::thread_rng().gen_range(0..PAYLOAD_UPPER_BOUND)
    }
}

/// Always returns the same value
#[derive(Debug, Clone, Copy)]
pub struct FixedPayloadSource(pub u32);

impl PayloadSource for FixedPayloadSource {
    fn next_value(&self) -> u32 {
        self.0
    }
}

/// Cycles through a fixed list of values
#[derive(Debug)]
pub struct SequencePayloadSource {
    values: Vec<u32>,
    cursor: AtomicUsize,
}

impl SequencePayloadSource {
    /// An empty list yields zeros
    pub fn new(values: Vec<u32>) -> Self {
        Self {
            values,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl PayloadSource for SequencePayloadSource {
    fn next_value(&self) -> u32 {
        if self.values.is_empty() {
            return 0;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.values.len();
        self.values[idx]
    }
}

/// Ephemeral key/value pair written and read back by one probe cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRecord {
    payload: String,
    encoded: String,
}

impl ProbeRecord {
    pub fn from_value(value: u32) -> Self {
        let payload = format!("{PAYLOAD_PREFIX}{}", value % PAYLOAD_UPPER_BOUND);
        let encoded = STANDARD.encode(payload.as_bytes());
        Self { payload, encoded }
    }

    pub fn generate(source: &dyn PayloadSource) -> Self {
        Self::from_value(source.next_value())
    }

    /// Raw payload, e.g. `data123456`
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Base64 transport form, used as both key and value
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn key_value(&self) -> KeyValue {
        KeyValue {
            key: self.encoded.clone(),
            value: self.encoded.clone(),
        }
    }

    /// Decode a transport-encoded key back into raw bytes
    pub fn decode(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(encoded)
    }
}
