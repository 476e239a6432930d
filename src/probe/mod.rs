//! # Probe
//!
//! The per-cycle request chain and the records it round-trips.

pub mod cycle;
pub mod record;

pub use cycle::{ProbeCycle, ProbeOutcome, ProbeTimings};
pub use record::{
    FixedPayloadSource, PayloadSource, ProbeRecord, SequencePayloadSource, ThreadRngPayloadSource,
};
