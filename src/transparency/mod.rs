//! Transparency for mindpulse.
//!
//! Tracks what happened to every reading the engine was given, so a wearer
//! can see how much data backs an assessment.

pub mod log;

pub use log::{
    create_shared_log, create_shared_log_with_persistence, IngestLog, IngestStats, SharedIngestLog,
};
