//! Heart rate variability analysis.
//!
//! RMSSD over the most recent RR intervals is the primary indicator of
//! parasympathetic activity: low values accompany anxiety and stress, high
//! values accompany relaxation.

use crate::config::CardiacConfig;
use crate::core::assessment::{Classification, Finding};
use crate::core::sample::CardiacSample;
use crate::core::stats::{rmssd, round_to, sdnn};
use serde::{Deserialize, Serialize};

/// Autonomic state inferred from HRV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HrvStatus {
    InsufficientData,
    AnxietyHighStress,
    Moderate,
    RelaxedGoodResilience,
}

impl Classification for HrvStatus {
    fn level(self) -> &'static str {
        match self {
            HrvStatus::InsufficientData => "Insufficient Data",
            HrvStatus::AnxietyHighStress => "High",
            HrvStatus::Moderate => "Normal",
            HrvStatus::RelaxedGoodResilience => "Very Good",
        }
    }

    fn interpretation(self) -> &'static str {
        match self {
            HrvStatus::InsufficientData => {
                "At least 30 cardiac samples are required for HRV analysis."
            }
            HrvStatus::AnxietyHighStress => {
                "Signs of anxiety or high stress. Parasympathetic nervous system activity is low."
            }
            HrvStatus::Moderate => {
                "Heart rate variability is within the normal range. No indication of excessive stress."
            }
            HrvStatus::RelaxedGoodResilience => {
                "Relaxed state with high resilience. The autonomic nervous system is balanced."
            }
        }
    }
}

/// HRV metrics over the analysed intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvMetrics {
    /// RMSSD in ms, rounded to 0.1
    pub rmssd: f64,
    /// SDNN in ms, rounded to 0.1
    pub sdnn: f64,
    pub rr_count: usize,
    /// All intervals identical; may indicate a sensor fault rather than stress
    pub flat_signal: bool,
}

/// Classify an RMSSD value.
pub fn classify(rmssd: f64, config: &CardiacConfig) -> HrvStatus {
    if rmssd < config.rmssd_low {
        HrvStatus::AnxietyHighStress
    } else if rmssd > config.rmssd_high {
        HrvStatus::RelaxedGoodResilience
    } else {
        HrvStatus::Moderate
    }
}

/// Analyse HRV over the most recent `baseline_samples` of the window.
pub fn analyze(samples: &[CardiacSample], config: &CardiacConfig) -> Finding<HrvStatus, HrvMetrics> {
    if samples.len() < config.min_samples {
        return Finding::insufficient(HrvStatus::InsufficientData, samples.len());
    }

    let skip = samples.len().saturating_sub(config.baseline_samples);
    let intervals: Vec<f64> = samples[skip..].iter().map(|s| s.rr_interval).collect();

    let value = rmssd(&intervals);
    let deviation = sdnn(&intervals);
    let flat_signal = intervals.windows(2).all(|pair| pair[0] == pair[1]);

    Finding::new(
        classify(value, config),
        HrvMetrics {
            rmssd: round_to(value, 1),
            sdnn: round_to(deviation, 1),
            rr_count: intervals.len(),
            flat_signal,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn samples_from_rr(intervals: &[f64]) -> Vec<CardiacSample> {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        intervals
            .iter()
            .enumerate()
            .map(|(i, &rr)| {
                CardiacSample::new(60_000.0 / rr, 98.0, Some(rr), start + Duration::seconds(i as i64))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_insufficient_data_reports_count() {
        let samples = samples_from_rr(&[800.0; 12]);
        let finding = analyze(&samples, &CardiacConfig::default());
        assert_eq!(finding.status, HrvStatus::InsufficientData);
        assert_eq!(finding.data_points, Some(12));
        assert!(finding.metrics.is_none());
    }

    #[test]
    fn test_classification_thresholds() {
        let config = CardiacConfig::default();
        assert_eq!(classify(19.9, &config), HrvStatus::AnxietyHighStress);
        assert_eq!(classify(20.0, &config), HrvStatus::Moderate);
        assert_eq!(classify(50.0, &config), HrvStatus::Moderate);
        assert_eq!(classify(50.1, &config), HrvStatus::RelaxedGoodResilience);
    }

    #[test]
    fn test_flat_signal_classified_as_high_stress() {
        let samples = samples_from_rr(&[800.0; 30]);
        let finding = analyze(&samples, &CardiacConfig::default());
        assert_eq!(finding.status, HrvStatus::AnxietyHighStress);
        let metrics = finding.metrics.unwrap();
        assert_eq!(metrics.rmssd, 0.0);
        assert!(metrics.flat_signal);
    }

    #[test]
    fn test_uses_most_recent_intervals() {
        // 40 highly variable intervals followed by 30 steady ones.
        let mut intervals: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { 700.0 } else { 900.0 })
            .collect();
        intervals.extend(std::iter::repeat(850.0).take(30));
        let samples = samples_from_rr(&intervals);

        let finding = analyze(&samples, &CardiacConfig::default());
        let metrics = finding.metrics.unwrap();
        assert_eq!(metrics.rr_count, 30);
        assert_eq!(metrics.rmssd, 0.0);
    }

    #[test]
    fn test_relaxed_pattern() {
        let intervals: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 800.0 } else { 880.0 })
            .collect();
        let finding = analyze(&samples_from_rr(&intervals), &CardiacConfig::default());
        assert_eq!(finding.status, HrvStatus::RelaxedGoodResilience);
        assert_eq!(finding.level, "Very Good");
        let metrics = finding.metrics.unwrap();
        assert_eq!(metrics.rmssd, 80.0);
        assert_eq!(metrics.sdnn, 40.0);
    }
}
