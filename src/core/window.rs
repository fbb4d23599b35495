//! Rolling sample windows.
//!
//! The cardiac window is a FIFO bounded by sample count. The thermal window is
//! throttled on the way in (one entry per logging interval) and pruned by age,
//! so it holds at most a day of half-hourly readings.

use crate::core::sample::{CardiacSample, ThermalSample};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Bounded FIFO of cardiac samples in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardiacWindow {
    capacity: usize,
    samples: VecDeque<CardiacSample>,
}

impl CardiacWindow {
    /// Create an empty window holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: VecDeque::with_capacity(capacity.max(1) + 1),
        }
    }

    /// Append a sample, evicting the oldest once the capacity is exceeded.
    pub fn push(&mut self, sample: CardiacSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of the window, oldest first.
    pub fn to_vec(&self) -> Vec<CardiacSample> {
        self.samples.iter().copied().collect()
    }

    /// The most recent `n` samples (or fewer), oldest first.
    pub fn recent(&self, n: usize) -> Vec<CardiacSample> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).copied().collect()
    }

    pub fn latest(&self) -> Option<&CardiacSample> {
        self.samples.back()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Time-throttled, age-pruned window of thermal samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalWindow {
    /// Minimum spacing between logged entries, in milliseconds
    interval_ms: i64,
    /// Maximum age relative to the newest entry, in milliseconds
    retention_ms: i64,
    samples: Vec<ThermalSample>,
    last_logged: Option<DateTime<Utc>>,
}

impl ThermalWindow {
    pub fn new(interval: Duration, retention: Duration) -> Self {
        Self {
            interval_ms: interval.num_milliseconds(),
            retention_ms: retention.num_milliseconds(),
            samples: Vec::new(),
            last_logged: None,
        }
    }

    /// Log a sample if the logging interval has elapsed since the last entry.
    ///
    /// Returns `false` when the sample was throttled. After an accepted append,
    /// entries older than the retention period relative to the new entry are
    /// dropped.
    pub fn push(&mut self, sample: ThermalSample) -> bool {
        if let Some(last) = self.last_logged {
            if (sample.timestamp - last).num_milliseconds() < self.interval_ms {
                return false;
            }
        }

        self.samples.push(sample);
        self.last_logged = Some(sample.timestamp);
        self.prune(sample.timestamp);
        true
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let retention = self.retention_ms;
        self.samples
            .retain(|s| (now - s.timestamp).num_milliseconds() <= retention);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Entries in time order, oldest first.
    pub fn as_slice(&self) -> &[ThermalSample] {
        &self.samples
    }

    pub fn latest(&self) -> Option<&ThermalSample> {
        self.samples.last()
    }

    /// Timestamp of the last logged entry.
    pub fn last_logged(&self) -> Option<DateTime<Utc>> {
        self.last_logged
    }

    /// Hours between the oldest and newest entry, rounded to 0.1.
    pub fn span_hours(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => {
                let hours = (last.timestamp - first.timestamp).num_milliseconds() as f64
                    / 3_600_000.0;
                (hours * 10.0).round() / 10.0
            }
            _ => 0.0,
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.last_logged = None;
    }
}
