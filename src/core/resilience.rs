//! Stress resilience from heart rate spikes and recovery times.
//!
//! A spike is an excursion above the baseline heart rate; the time it takes
//! to come back under the threshold measures how quickly the autonomic system
//! recovers.

use crate::config::CardiacConfig;
use crate::core::assessment::{Classification, Finding};
use crate::core::sample::CardiacSample;
use crate::core::stats::mean;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResilienceStatus {
    InsufficientData,
    NoStressEvents,
    High,
    Moderate,
    Low,
}

impl Classification for ResilienceStatus {
    fn level(self) -> &'static str {
        match self {
            ResilienceStatus::InsufficientData => "Insufficient Data",
            ResilienceStatus::NoStressEvents => "No Data",
            ResilienceStatus::High => "High",
            ResilienceStatus::Moderate => "Moderate",
            ResilienceStatus::Low => "Low",
        }
    }

    fn interpretation(self) -> &'static str {
        match self {
            ResilienceStatus::InsufficientData => {
                "Not enough cardiac samples or no heart rate baseline yet for resilience analysis."
            }
            ResilienceStatus::NoStressEvents => {
                "No significant heart rate spikes in the analysed period."
            }
            ResilienceStatus::High => {
                "Very good stress resilience. The cardiovascular system recovers quickly after stress."
            }
            ResilienceStatus::Moderate => {
                "Stress resilience is in the normal range. Recovery after stress is reasonably good."
            }
            ResilienceStatus::Low => {
                "Low stress resilience. Recovery after stress is slow; stress management practice is advised."
            }
        }
    }
}

/// A heart rate excursion above the spike threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeEvent {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub peak_bpm: f64,
}

impl SpikeEvent {
    /// Time from the first elevated sample to the first recovered sample.
    pub fn recovery(&self) -> Duration {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResilienceMetrics {
    pub spikes_detected: usize,
    /// Mean recovery time in seconds
    pub avg_recovery_secs: i64,
    pub fastest_recovery_secs: i64,
    pub slowest_recovery_secs: i64,
}

/// Scan the window once for spikes above `baseline_bpm + threshold`.
///
/// A spike that has not recovered by the end of the window is not reported.
pub fn detect_spikes(
    samples: &[CardiacSample],
    baseline_bpm: f64,
    threshold_bpm: f64,
) -> Vec<SpikeEvent> {
    let limit = baseline_bpm + threshold_bpm;
    let mut events = Vec::new();
    let mut spike_start: Option<usize> = None;

    for (i, sample) in samples.iter().enumerate() {
        let elevated = sample.heart_rate > limit;
        match (spike_start, elevated) {
            (None, true) => spike_start = Some(i),
            (Some(start), false) => {
                let peak_bpm = samples[start..i]
                    .iter()
                    .map(|s| s.heart_rate)
                    .fold(f64::NEG_INFINITY, f64::max);
                events.push(SpikeEvent {
                    start: samples[start].timestamp,
                    end: sample.timestamp,
                    peak_bpm,
                });
                spike_start = None;
            }
            _ => {}
        }
    }

    events
}

/// Classify a mean recovery duration.
pub fn classify(avg_recovery: Duration, config: &CardiacConfig) -> ResilienceStatus {
    let avg_ms = avg_recovery.num_milliseconds() as u128;
    if avg_ms < config.recovery_fast.as_millis() {
        ResilienceStatus::High
    } else if avg_ms < config.recovery_moderate.as_millis() {
        ResilienceStatus::Moderate
    } else {
        ResilienceStatus::Low
    }
}

/// Analyse stress resilience against the current BPM baseline.
pub fn analyze(
    samples: &[CardiacSample],
    baseline_bpm: Option<f64>,
    config: &CardiacConfig,
) -> Finding<ResilienceStatus, ResilienceMetrics> {
    let baseline_bpm = match baseline_bpm {
        Some(bpm) if samples.len() >= config.min_samples => bpm,
        _ => return Finding::insufficient(ResilienceStatus::InsufficientData, samples.len()),
    };

    let spikes = detect_spikes(samples, baseline_bpm, config.spike_threshold_bpm);
    if spikes.is_empty() {
        return Finding::new(
            ResilienceStatus::NoStressEvents,
            ResilienceMetrics {
                spikes_detected: 0,
                avg_recovery_secs: 0,
                fastest_recovery_secs: 0,
                slowest_recovery_secs: 0,
            },
        );
    }

    let recoveries: Vec<f64> = spikes
        .iter()
        .map(|s| s.recovery().num_milliseconds() as f64)
        .collect();
    let avg_ms = mean(&recoveries);
    let fastest = recoveries.iter().copied().fold(f64::INFINITY, f64::min);
    let slowest = recoveries.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Finding::new(
        classify(Duration::milliseconds(avg_ms.round() as i64), config),
        ResilienceMetrics {
            spikes_detected: spikes.len(),
            avg_recovery_secs: (avg_ms / 1000.0).round() as i64,
            fastest_recovery_secs: (fastest / 1000.0).round() as i64,
            slowest_recovery_secs: (slowest / 1000.0).round() as i64,
        },
    )
}
