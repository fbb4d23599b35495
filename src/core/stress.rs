//! Cardiac stress detection.
//!
//! A high but steady heart rate with depressed HRV points at sympathetic
//! over-activation. Physical exertion raises heart rate too, but it also makes
//! the rate fluctuate, so unstable readings are never flagged.

use crate::config::CardiacConfig;
use crate::core::assessment::{Classification, Finding};
use crate::core::sample::CardiacSample;
use crate::core::stats::{mean, rmssd, round_to, std_dev};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardiacStressStatus {
    InsufficientData,
    Normal,
    Detected,
}

impl Classification for CardiacStressStatus {
    fn level(self) -> &'static str {
        match self {
            CardiacStressStatus::InsufficientData => "Insufficient Data",
            CardiacStressStatus::Normal => "Normal",
            CardiacStressStatus::Detected => "Detected",
        }
    }

    fn interpretation(self) -> &'static str {
        match self {
            CardiacStressStatus::InsufficientData => {
                "Not enough cardiac samples for cardiac stress analysis."
            }
            CardiacStressStatus::Normal => {
                "No signs of cardiac stress. Heart rate and variability are within normal ranges."
            }
            CardiacStressStatus::Detected => {
                "Cardiac stress detected: high heart rate with low HRV while at rest, indicating excessive sympathetic nervous system activity."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardiacStressMetrics {
    /// Mean BPM of the stability window, rounded
    pub avg_bpm: f64,
    /// RMSSD of the stability window in ms, rounded to 0.1
    pub rmssd: f64,
    pub is_stable: bool,
    /// Standard deviation of BPM, rounded to 0.1
    pub bpm_stability: f64,
}

/// Detect cardiac stress from the most recent samples of the window.
pub fn analyze(
    samples: &[CardiacSample],
    config: &CardiacConfig,
) -> Finding<CardiacStressStatus, CardiacStressMetrics> {
    if samples.len() < config.min_samples {
        return Finding::insufficient(CardiacStressStatus::InsufficientData, samples.len());
    }

    let skip = samples.len().saturating_sub(config.stability_window);
    let recent = &samples[skip..];
    let bpm: Vec<f64> = recent.iter().map(|s| s.heart_rate).collect();
    let intervals: Vec<f64> = recent.iter().map(|s| s.rr_interval).collect();

    let avg_bpm = mean(&bpm);
    let bpm_std_dev = std_dev(&bpm);
    let current_rmssd = rmssd(&intervals);
    let is_stable = bpm_std_dev < config.stability_max_std_dev;

    let status = if avg_bpm > config.stress_high_bpm
        && current_rmssd < config.stress_low_rmssd
        && is_stable
    {
        CardiacStressStatus::Detected
    } else {
        CardiacStressStatus::Normal
    };

    Finding::new(
        status,
        CardiacStressMetrics {
            avg_bpm: avg_bpm.round(),
            rmssd: round_to(current_rmssd, 1),
            is_stable,
            bpm_stability: round_to(bpm_std_dev, 1),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn samples(bpm: &[f64]) -> Vec<CardiacSample> {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
        bpm.iter()
            .enumerate()
            .map(|(i, &b)| {
                CardiacSample::new(b, 97.0, None, start + Duration::seconds(i as i64 * 5)).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_requires_minimum_samples() {
        let finding = analyze(&samples(&[100.0; 10]), &CardiacConfig::default());
        assert_eq!(finding.status, CardiacStressStatus::InsufficientData);
    }

    #[test]
    fn test_high_steady_heart_rate_detected() {
        let mut bpm = vec![72.0; 25];
        bpm.extend([100.0, 101.0, 100.0, 101.0, 100.0]);
        let finding = analyze(&samples(&bpm), &CardiacConfig::default());
        assert_eq!(finding.status, CardiacStressStatus::Detected);
        let metrics = finding.metrics.unwrap();
        assert_eq!(metrics.avg_bpm, 100.0);
        assert!(metrics.is_stable);
        assert!(metrics.rmssd < 25.0);
    }

    #[test]
    fn test_fluctuating_heart_rate_not_flagged() {
        let mut bpm = vec![72.0; 25];
        bpm.extend([92.0, 110.0, 95.0, 115.0, 93.0]);
        let finding = analyze(&samples(&bpm), &CardiacConfig::default());
        assert_eq!(finding.status, CardiacStressStatus::Normal);
        assert!(!finding.metrics.unwrap().is_stable);
    }

    #[test]
    fn test_alternating_resting_rate_is_normal() {
        let bpm: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 70.0 } else { 72.0 }).collect();
        let finding = analyze(&samples(&bpm), &CardiacConfig::default());
        assert_eq!(finding.status, CardiacStressStatus::Normal);
        assert_eq!(finding.metrics.unwrap().avg_bpm, 71.0);
    }
}
