//! Ingestion log.
//!
//! Counts what happened to every reading pushed into the engine and how many
//! assessments were produced. Only counts are kept, never sample values.

use crate::core::engine::Ingest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Ingestion counters for the current session.
#[derive(Debug)]
pub struct IngestLog {
    cardiac_accepted: AtomicU64,
    cardiac_rejected: AtomicU64,
    thermal_accepted: AtomicU64,
    thermal_throttled: AtomicU64,
    thermal_rejected: AtomicU64,
    malformed: AtomicU64,
    analyses: AtomicU64,
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl IngestLog {
    pub fn new() -> Self {
        Self {
            cardiac_accepted: AtomicU64::new(0),
            cardiac_rejected: AtomicU64::new(0),
            thermal_accepted: AtomicU64::new(0),
            thermal_throttled: AtomicU64::new(0),
            thermal_rejected: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            analyses: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that resumes from and saves to `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!(error = %e, "could not load previous ingestion stats");
        }

        log
    }

    /// Record the outcome of a cardiac reading.
    pub fn record_cardiac(&self, outcome: &Ingest) {
        let counter = match outcome {
            Ingest::Accepted => &self.cardiac_accepted,
            Ingest::Throttled | Ingest::Rejected(_) => &self.cardiac_rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a thermal reading.
    pub fn record_thermal(&self, outcome: &Ingest) {
        let counter = match outcome {
            Ingest::Accepted => &self.thermal_accepted,
            Ingest::Throttled => &self.thermal_throttled,
            Ingest::Rejected(_) => &self.thermal_rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count input lines that never became a reading.
    pub fn record_malformed(&self, count: u64) {
        self.malformed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_analysis(&self) {
        self.analyses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> IngestStats {
        IngestStats {
            cardiac_accepted: self.cardiac_accepted.load(Ordering::Relaxed),
            cardiac_rejected: self.cardiac_rejected.load(Ordering::Relaxed),
            thermal_accepted: self.thermal_accepted.load(Ordering::Relaxed),
            thermal_throttled: self.thermal_throttled.load(Ordering::Relaxed),
            thermal_rejected: self.thermal_rejected.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            analyses: self.analyses.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Ingestion Statistics:\n\
             - Cardiac readings accepted: {}\n\
             - Cardiac readings rejected: {}\n\
             - Thermal readings logged: {}\n\
             - Thermal readings throttled: {}\n\
             - Thermal readings rejected: {}\n\
             - Malformed input lines: {}\n\
             - Assessments produced: {}\n\
             - Session duration: {} seconds",
            stats.cardiac_accepted,
            stats.cardiac_rejected,
            stats.thermal_accepted,
            stats.thermal_throttled,
            stats.thermal_rejected,
            stats.malformed,
            stats.analyses,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                cardiac_accepted: stats.cardiac_accepted,
                cardiac_rejected: stats.cardiac_rejected,
                thermal_accepted: stats.thermal_accepted,
                thermal_throttled: stats.thermal_throttled,
                thermal_rejected: stats.thermal_rejected,
                malformed: stats.malformed,
                analyses: stats.analyses,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.cardiac_accepted
                    .store(persisted.cardiac_accepted, Ordering::Relaxed);
                self.cardiac_rejected
                    .store(persisted.cardiac_rejected, Ordering::Relaxed);
                self.thermal_accepted
                    .store(persisted.thermal_accepted, Ordering::Relaxed);
                self.thermal_throttled
                    .store(persisted.thermal_throttled, Ordering::Relaxed);
                self.thermal_rejected
                    .store(persisted.thermal_rejected, Ordering::Relaxed);
                self.malformed.store(persisted.malformed, Ordering::Relaxed);
                self.analyses.store(persisted.analyses, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in [
            &self.cardiac_accepted,
            &self.cardiac_rejected,
            &self.thermal_accepted,
            &self.thermal_throttled,
            &self.thermal_rejected,
            &self.malformed,
            &self.analyses,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for IngestLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of ingestion statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    pub cardiac_accepted: u64,
    pub cardiac_rejected: u64,
    pub thermal_accepted: u64,
    pub thermal_throttled: u64,
    pub thermal_rejected: u64,
    pub malformed: u64,
    pub analyses: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    cardiac_accepted: u64,
    cardiac_rejected: u64,
    thermal_accepted: u64,
    thermal_throttled: u64,
    thermal_rejected: u64,
    #[serde(default)]
    malformed: u64,
    analyses: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared ingestion log.
pub type SharedIngestLog = Arc<IngestLog>;

pub fn create_shared_log() -> SharedIngestLog {
    Arc::new(IngestLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedIngestLog {
    Arc::new(IngestLog::with_persistence(path))
}
