//! Personal baselines.
//!
//! Cardiac baselines are recomputed from the most recent samples once the
//! window holds enough data; until then they are undefined. Thermal baselines
//! are per hour-range means that keep their previous value when the range has
//! no samples in the window.

use crate::config::{CardiacConfig, ThermalConfig};
use crate::core::sample::{CardiacSample, ThermalSample};
use crate::core::stats::{mean, rmssd};
use crate::core::time::HourRange;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Resting heart rate and HRV reference values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardiacBaseline {
    /// Mean BPM over the baseline samples
    pub bpm: f64,
    /// RMSSD over the baseline RR intervals
    pub rmssd: f64,
}

impl CardiacBaseline {
    /// Compute from the last `baseline_samples` of the window.
    ///
    /// Returns `None` while the window holds fewer than `min_samples`.
    pub fn compute(samples: &[CardiacSample], config: &CardiacConfig) -> Option<Self> {
        if samples.len() < config.min_samples || samples.is_empty() {
            return None;
        }

        let skip = samples.len().saturating_sub(config.baseline_samples);
        let recent = &samples[skip..];
        let bpm: Vec<f64> = recent.iter().map(|s| s.heart_rate).collect();
        let intervals: Vec<f64> = recent.iter().map(|s| s.rr_interval).collect();

        Some(Self {
            bpm: mean(&bpm),
            rmssd: rmssd(&intervals),
        })
    }
}

/// Mean body temperature per time-of-day range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalBaselines {
    pub daytime: Option<f64>,
    pub evening: Option<f64>,
    pub early_morning: Option<f64>,
}

impl ThermalBaselines {
    /// Recompute each range from the window, keeping the old value for
    /// ranges without samples.
    pub fn update(&mut self, samples: &[ThermalSample], config: &ThermalConfig, tz: Tz) {
        if let Some(value) = range_mean(samples, config.daytime_hours, tz) {
            self.daytime = Some(value);
        }
        if let Some(value) = range_mean(samples, config.evening_hours, tz) {
            self.evening = Some(value);
        }
        if let Some(value) = range_mean(samples, config.early_morning_hours, tz) {
            self.early_morning = Some(value);
        }
    }
}

fn range_mean(samples: &[ThermalSample], hours: HourRange, tz: Tz) -> Option<f64> {
    let temps: Vec<f64> = samples
        .iter()
        .filter(|s| hours.contains_time(s.timestamp, tz))
        .map(|s| s.body_temp)
        .collect();
    if temps.is_empty() {
        None
    } else {
        Some(mean(&temps))
    }
}
