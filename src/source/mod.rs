//! Producer side: raw wearable readings and the JSON-lines replay source.
//!
//! Readings here are unvalidated; the engine turns them into samples.

pub mod replay;
pub mod types;

pub use replay::{ReplaySource, SourceError};
pub use types::{CardiacReading, SensorReading, ThermalReading, Timestamp};
