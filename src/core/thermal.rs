//! Thermal rhythm analysis.
//!
//! Four independent views over the half-hourly thermal window:
//!
//! - **Circadian amplitude**: body temperature peaks in the late afternoon and
//!   bottoms out in the early morning. A small difference between the two
//!   suggests a disrupted rhythm.
//! - **Nocturnal drop**: core temperature falls during sleep relative to the
//!   daytime baseline; a missing drop is a proxy for poor sleep.
//! - **Resting variance**: rapid fluctuation while at rest in the evening is a
//!   proxy for autonomic stress.
//! - **Environmental adaptation**: whether body temperature holds steady while
//!   the ambient temperature changes.

use crate::config::ThermalConfig;
use crate::core::assessment::{Classification, Finding, ThermalAssessment};
use crate::core::baseline::ThermalBaselines;
use crate::core::sample::ThermalSample;
use crate::core::stats::{mean, range, round_to, variance};
use crate::core::time::to_delta;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

// ============================================================================
// Circadian rhythm
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircadianStatus {
    InsufficientData,
    Disrupted,
    Normal,
    Excellent,
}

impl Classification for CircadianStatus {
    fn level(self) -> &'static str {
        match self {
            CircadianStatus::InsufficientData => "Insufficient Data",
            CircadianStatus::Disrupted => "Disrupted",
            CircadianStatus::Normal => "Normal",
            CircadianStatus::Excellent => "Excellent",
        }
    }

    fn interpretation(self) -> &'static str {
        match self {
            CircadianStatus::InsufficientData => {
                "Evening (16:00-18:00) and early-morning (03:00-05:00) temperature data are required."
            }
            CircadianStatus::Disrupted => {
                "The body temperature difference between evening and early morning is too small, indicating a circadian rhythm disruption that can affect mood stability and sleep quality."
            }
            CircadianStatus::Normal => {
                "The evening to early-morning temperature difference is in the normal range. The circadian rhythm is working well."
            }
            CircadianStatus::Excellent => {
                "Strong circadian rhythm with an optimal temperature difference, indicating healthy circadian regulation."
            }
        }
    }

    fn recommendation(self) -> Option<&'static str> {
        match self {
            CircadianStatus::InsufficientData => None,
            CircadianStatus::Disrupted => Some(
                "Keep a consistent sleep-wake schedule, get morning light exposure and reduce blue light at night.",
            ),
            CircadianStatus::Normal => {
                Some("Keep a consistent sleep pattern to maintain a healthy circadian rhythm.")
            }
            CircadianStatus::Excellent => Some("Keep up your healthy routine!"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircadianMetrics {
    pub evening_temp: f64,
    pub early_morning_temp: f64,
    pub difference: f64,
}

pub fn classify_circadian(difference: f64, config: &ThermalConfig) -> CircadianStatus {
    if difference < config.circadian_min_difference {
        CircadianStatus::Disrupted
    } else if difference < config.circadian_excellent_difference {
        CircadianStatus::Normal
    } else {
        CircadianStatus::Excellent
    }
}

/// Compare the evening and early-morning baselines.
pub fn circadian(
    samples: &[ThermalSample],
    baselines: &ThermalBaselines,
    config: &ThermalConfig,
) -> Finding<CircadianStatus, CircadianMetrics> {
    let (evening, early) = match (baselines.evening, baselines.early_morning) {
        (Some(evening), Some(early)) => (evening, early),
        _ => return Finding::insufficient(CircadianStatus::InsufficientData, samples.len()),
    };

    let difference = (evening - early).abs();
    Finding::new(
        classify_circadian(difference, config),
        CircadianMetrics {
            evening_temp: round_to(evening, 1),
            early_morning_temp: round_to(early, 1),
            difference: round_to(difference, 2),
        },
    )
}

// ============================================================================
// Sleep quality (nocturnal drop)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQualityStatus {
    InsufficientData,
    Poor,
    Normal,
    Excellent,
}

impl Classification for SleepQualityStatus {
    fn level(self) -> &'static str {
        match self {
            SleepQualityStatus::InsufficientData => "Insufficient Data",
            SleepQualityStatus::Poor => "Poor",
            SleepQualityStatus::Normal => "Normal",
            SleepQualityStatus::Excellent => "Excellent",
        }
    }

    fn interpretation(self) -> &'static str {
        match self {
            SleepQualityStatus::InsufficientData => {
                "Daytime (10:00-18:00) and sleep-hour (22:00-06:00) temperature data are required."
            }
            SleepQualityStatus::Poor => {
                "Body temperature does not drop enough during sleep, indicating low sleep quality and incomplete mental recovery."
            }
            SleepQualityStatus::Normal => {
                "The nocturnal temperature drop is in the normal range. Sleep quality and mental recovery are reasonably good."
            }
            SleepQualityStatus::Excellent => {
                "Very good nocturnal temperature drop, indicating high quality sleep with optimal recovery."
            }
        }
    }

    fn recommendation(self) -> Option<&'static str> {
        match self {
            SleepQualityStatus::InsufficientData => None,
            SleepQualityStatus::Poor => Some(
                "Keep the bedroom cooler (18-21°C), avoid caffeine in the afternoon and practise relaxation before bed.",
            ),
            SleepQualityStatus::Normal => {
                Some("Keep a consistent sleep routine for optimal sleep quality.")
            }
            SleepQualityStatus::Excellent => Some("Keep up your healthy sleep habits!"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepMetrics {
    pub daytime_temp: f64,
    pub sleep_temp: f64,
    pub nocturnal_drop: f64,
}

pub fn classify_sleep(drop: f64, config: &ThermalConfig) -> SleepQualityStatus {
    if drop < config.min_nocturnal_drop {
        SleepQualityStatus::Poor
    } else if drop < config.excellent_nocturnal_drop {
        SleepQualityStatus::Normal
    } else {
        SleepQualityStatus::Excellent
    }
}

/// Compare the mean temperature during sleep hours against the daytime baseline.
pub fn sleep_quality(
    samples: &[ThermalSample],
    baselines: &ThermalBaselines,
    config: &ThermalConfig,
    tz: Tz,
) -> Finding<SleepQualityStatus, SleepMetrics> {
    let Some(daytime) = baselines.daytime else {
        return Finding::insufficient(SleepQualityStatus::InsufficientData, samples.len());
    };

    let sleep_temps: Vec<f64> = samples
        .iter()
        .filter(|s| config.sleep_hours.contains_time(s.timestamp, tz))
        .map(|s| s.body_temp)
        .collect();
    if sleep_temps.is_empty() {
        return Finding::insufficient(SleepQualityStatus::InsufficientData, 0);
    }

    let sleep_avg = mean(&sleep_temps);
    let drop = daytime - sleep_avg;
    Finding::new(
        classify_sleep(drop, config),
        SleepMetrics {
            daytime_temp: round_to(daytime, 1),
            sleep_temp: round_to(sleep_avg, 1),
            nocturnal_drop: round_to(drop, 2),
        },
    )
}

// ============================================================================
// Stress response (resting temperature variance)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermalStressStatus {
    InsufficientData,
    Normal,
    Mild,
    Detected,
}

impl Classification for ThermalStressStatus {
    fn level(self) -> &'static str {
        match self {
            ThermalStressStatus::InsufficientData => "Insufficient Data",
            ThermalStressStatus::Normal => "Normal",
            ThermalStressStatus::Mild => "Mild",
            ThermalStressStatus::Detected => "Detected",
        }
    }

    fn interpretation(self) -> &'static str {
        match self {
            ThermalStressStatus::InsufficientData => {
                "At least 2 temperature readings during resting hours (20:00-23:00) are required."
            }
            ThermalStressStatus::Normal => {
                "Body temperature is stable at rest. The autonomic nervous system is working well."
            }
            ThermalStressStatus::Mild => {
                "Body temperature fluctuation is slightly elevated. There may be mild stress or fatigue."
            }
            ThermalStressStatus::Detected => {
                "High body temperature fluctuation at rest, indicating sympathetic activation and an autonomic stress response."
            }
        }
    }

    fn recommendation(self) -> Option<&'static str> {
        match self {
            ThermalStressStatus::InsufficientData => None,
            ThermalStressStatus::Normal => {
                Some("Maintain a healthy lifestyle to keep the nervous system stable.")
            }
            ThermalStressStatus::Mild => {
                Some("Make sure to rest enough and manage stress with enjoyable activities.")
            }
            ThermalStressStatus::Detected => Some(
                "Practise relaxation techniques such as deep breathing, meditation or progressive muscle relaxation.",
            ),
        }
    }
}

/// How the resting temperature range was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeMethod {
    /// `4 * sqrt(variance)` over the recent window
    VarianceEstimate,
    /// `max - min` over the last two resting readings
    LastTwo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalStressMetrics {
    pub temp_range: f64,
    pub data_points: usize,
    pub method: RangeMethod,
}

pub fn classify_stress(temp_range: f64, config: &ThermalConfig) -> ThermalStressStatus {
    if temp_range > config.stress_max_range {
        ThermalStressStatus::Detected
    } else if temp_range > config.stress_max_range * 0.5 {
        ThermalStressStatus::Mild
    } else {
        ThermalStressStatus::Normal
    }
}

/// Estimate temperature fluctuation during resting hours.
///
/// Readings within `stress_window` of `reference` are preferred; for a normal
/// distribution the range is roughly four standard deviations. With fewer
/// than two recent readings the last two resting readings are used directly.
pub fn stress_response(
    samples: &[ThermalSample],
    reference: Option<DateTime<Utc>>,
    config: &ThermalConfig,
    tz: Tz,
) -> Finding<ThermalStressStatus, ThermalStressMetrics> {
    let resting: Vec<&ThermalSample> = samples
        .iter()
        .filter(|s| config.resting_hours.contains_time(s.timestamp, tz))
        .collect();
    if resting.len() < 2 {
        return Finding::insufficient(ThermalStressStatus::InsufficientData, resting.len());
    }

    let window = to_delta(config.stress_window);
    let recent: Vec<f64> = match reference {
        Some(now) => resting
            .iter()
            .filter(|s| now - s.timestamp <= window)
            .map(|s| s.body_temp)
            .collect(),
        None => Vec::new(),
    };

    let (temp_range, data_points, method) = if recent.len() >= 2 {
        (
            variance(&recent).sqrt() * 4.0,
            recent.len(),
            RangeMethod::VarianceEstimate,
        )
    } else {
        let last_two: Vec<f64> = resting[resting.len() - 2..]
            .iter()
            .map(|s| s.body_temp)
            .collect();
        (range(&last_two), last_two.len(), RangeMethod::LastTwo)
    };

    Finding::new(
        classify_stress(temp_range, config),
        ThermalStressMetrics {
            temp_range: round_to(temp_range, 2),
            data_points,
            method,
        },
    )
}

// ============================================================================
// Environmental adaptation (thermoregulation)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationStatus {
    InsufficientData,
    Impaired,
    Suboptimal,
    Normal,
    Excellent,
}

impl Classification for AdaptationStatus {
    fn level(self) -> &'static str {
        match self {
            AdaptationStatus::InsufficientData => "Insufficient Data",
            AdaptationStatus::Impaired => "Impaired",
            AdaptationStatus::Suboptimal => "Suboptimal",
            AdaptationStatus::Normal => "Normal",
            AdaptationStatus::Excellent => "Excellent",
        }
    }

    fn interpretation(self) -> &'static str {
        match self {
            AdaptationStatus::InsufficientData => {
                "At least 4 temperature readings (about 2 hours) are required."
            }
            AdaptationStatus::Impaired => {
                "Ambient temperature changed drastically and the body failed to keep a stable temperature, indicating weak autonomic thermoregulation."
            }
            AdaptationStatus::Suboptimal => {
                "The difference between body and ambient temperature is outside the normal range. The body may struggle to adapt to its environment."
            }
            AdaptationStatus::Normal => {
                "Autonomic thermoregulation is normal. The body adapts to changes in ambient temperature."
            }
            AdaptationStatus::Excellent => {
                "Despite a drastic ambient temperature change the body kept a stable temperature. Autonomic thermoregulation is very good."
            }
        }
    }

    fn recommendation(self) -> Option<&'static str> {
        match self {
            AdaptationStatus::InsufficientData => None,
            AdaptationStatus::Impaired => Some(
                "See a doctor if symptoms persist. Stay hydrated and avoid extreme temperature changes.",
            ),
            AdaptationStatus::Suboptimal => Some(
                "Keep the room at a comfortable temperature (20-24°C) and dress for the ambient temperature.",
            ),
            AdaptationStatus::Normal => {
                Some("Maintain a healthy lifestyle to keep autonomic function optimal.")
            }
            AdaptationStatus::Excellent => Some(
                "Keep your autonomic nervous system healthy with regular exercise and stress management.",
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationMetrics {
    pub avg_body_temp: f64,
    pub avg_ambient_temp: f64,
    pub avg_difference: f64,
    pub ambient_change: f64,
    pub body_variance: f64,
}

pub fn classify_adaptation(
    avg_difference: f64,
    ambient_change: f64,
    body_variance: f64,
    config: &ThermalConfig,
) -> AdaptationStatus {
    let drastic_change = ambient_change > config.max_ambient_change;
    let body_unstable = body_variance > config.max_body_variance;
    let abnormal_difference = avg_difference.abs() > config.adaptation_normal_difference;

    match (drastic_change, body_unstable, abnormal_difference) {
        (true, true, _) => AdaptationStatus::Impaired,
        (_, _, true) => AdaptationStatus::Suboptimal,
        (true, false, false) => AdaptationStatus::Excellent,
        (false, _, false) => AdaptationStatus::Normal,
    }
}

/// Check how well body temperature holds against ambient changes over the
/// most recent entries.
pub fn adaptation(
    samples: &[ThermalSample],
    config: &ThermalConfig,
) -> Finding<AdaptationStatus, AdaptationMetrics> {
    if samples.len() < config.adaptation_samples || config.adaptation_samples == 0 {
        return Finding::insufficient(AdaptationStatus::InsufficientData, samples.len());
    }

    let recent = &samples[samples.len() - config.adaptation_samples..];
    let differences: Vec<f64> = recent.iter().map(|s| s.body_temp - s.ambient_temp).collect();
    let ambient: Vec<f64> = recent.iter().map(|s| s.ambient_temp).collect();
    let body: Vec<f64> = recent.iter().map(|s| s.body_temp).collect();

    let avg_difference = mean(&differences);
    let ambient_change = range(&ambient);
    let body_variance = variance(&body);

    Finding::new(
        classify_adaptation(avg_difference, ambient_change, body_variance, config),
        AdaptationMetrics {
            avg_body_temp: round_to(mean(&body), 1),
            avg_ambient_temp: round_to(mean(&ambient), 1),
            avg_difference: round_to(avg_difference, 1),
            ambient_change: round_to(ambient_change, 1),
            body_variance: round_to(body_variance, 3),
        },
    )
}

/// Run all four thermal analyses.
pub fn analyze(
    samples: &[ThermalSample],
    baselines: &ThermalBaselines,
    reference: Option<DateTime<Utc>>,
    config: &ThermalConfig,
    tz: Tz,
) -> ThermalAssessment {
    ThermalAssessment {
        circadian: circadian(samples, baselines, config),
        sleep: sleep_quality(samples, baselines, config, tz),
        stress: stress_response(samples, reference, config, tz),
        adaptation: adaptation(samples, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, minute, 0).unwrap()
    }

    fn reading(body: f64, ambient: f64, ts: DateTime<Utc>) -> ThermalSample {
        ThermalSample::new(body, ambient, ts).unwrap()
    }

    fn baselines(
        daytime: Option<f64>,
        evening: Option<f64>,
        early_morning: Option<f64>,
    ) -> ThermalBaselines {
        ThermalBaselines {
            daytime,
            evening,
            early_morning,
        }
    }

    #[test]
    fn test_circadian_normal_amplitude() {
        let config = ThermalConfig::default();
        let finding = circadian(&[], &baselines(None, Some(37.0), Some(36.3)), &config);
        assert_eq!(finding.status, CircadianStatus::Normal);
        assert_eq!(finding.metrics.unwrap().difference, 0.7);
    }

    #[test]
    fn test_circadian_ladder() {
        let config = ThermalConfig::default();
        assert_eq!(classify_circadian(0.49, &config), CircadianStatus::Disrupted);
        assert_eq!(classify_circadian(0.5, &config), CircadianStatus::Normal);
        assert_eq!(classify_circadian(0.99, &config), CircadianStatus::Normal);
        assert_eq!(classify_circadian(1.0, &config), CircadianStatus::Excellent);
    }

    #[test]
    fn test_circadian_requires_both_baselines() {
        let config = ThermalConfig::default();
        let finding = circadian(&[], &baselines(Some(36.8), Some(37.0), None), &config);
        assert_eq!(finding.status, CircadianStatus::InsufficientData);
        assert!(finding.recommendation.is_none());
    }

    #[test]
    fn test_sleep_quality() {
        let config = ThermalConfig::default();
        let samples = vec![
            reading(36.9, 25.0, at(1, 12, 0)),
            reading(36.2, 23.0, at(1, 23, 0)),
            reading(36.2, 23.0, at(2, 2, 0)),
        ];
        let finding = sleep_quality(
            &samples,
            &baselines(Some(36.9), None, None),
            &config,
            Tz::UTC,
        );
        assert_eq!(finding.status, SleepQualityStatus::Excellent);
        assert_eq!(finding.metrics.unwrap().nocturnal_drop, 0.7);
    }

    #[test]
    fn test_sleep_quality_without_sleep_readings() {
        let config = ThermalConfig::default();
        let samples = vec![reading(36.9, 25.0, at(1, 12, 0))];
        let finding = sleep_quality(
            &samples,
            &baselines(Some(36.9), None, None),
            &config,
            Tz::UTC,
        );
        assert_eq!(finding.status, SleepQualityStatus::InsufficientData);
    }

    #[test]
    fn test_sleep_ladder() {
        let config = ThermalConfig::default();
        assert_eq!(classify_sleep(0.29, &config), SleepQualityStatus::Poor);
        assert_eq!(classify_sleep(-0.2, &config), SleepQualityStatus::Poor);
        assert_eq!(classify_sleep(0.3, &config), SleepQualityStatus::Normal);
        assert_eq!(classify_sleep(0.6, &config), SleepQualityStatus::Excellent);
    }

    #[test]
    fn test_stress_falls_back_to_last_two_readings() {
        let config = ThermalConfig::default();
        let samples = vec![
            reading(36.5, 24.0, at(1, 20, 0)),
            reading(36.6, 24.0, at(1, 20, 30)),
            reading(36.9, 24.0, at(1, 21, 0)),
        ];
        let finding = stress_response(&samples, Some(at(1, 21, 0)), &config, Tz::UTC);
        assert_eq!(finding.status, ThermalStressStatus::Detected);
        let metrics = finding.metrics.unwrap();
        assert_eq!(metrics.method, RangeMethod::LastTwo);
        assert_eq!(metrics.temp_range, 0.3);
    }

    #[test]
    fn test_stress_prefers_recent_window() {
        let config = ThermalConfig::default();
        let base = at(1, 21, 0);
        let samples = vec![
            reading(36.5, 24.0, base),
            reading(36.5, 24.0, base + Duration::minutes(4)),
            reading(36.5, 24.0, base + Duration::minutes(8)),
        ];
        let finding = stress_response(
            &samples,
            Some(base + Duration::minutes(8)),
            &config,
            Tz::UTC,
        );
        assert_eq!(finding.status, ThermalStressStatus::Normal);
        let metrics = finding.metrics.unwrap();
        assert_eq!(metrics.method, RangeMethod::VarianceEstimate);
        assert_eq!(metrics.data_points, 3);
    }

    #[test]
    fn test_stress_requires_resting_readings() {
        let config = ThermalConfig::default();
        let samples = vec![
            reading(36.5, 24.0, at(1, 12, 0)),
            reading(36.6, 24.0, at(1, 20, 0)),
        ];
        let finding = stress_response(&samples, Some(at(1, 20, 0)), &config, Tz::UTC);
        assert_eq!(finding.status, ThermalStressStatus::InsufficientData);
        assert_eq!(finding.data_points, Some(1));
    }

    #[test]
    fn test_stress_ladder() {
        let config = ThermalConfig::default();
        assert_eq!(classify_stress(0.21, &config), ThermalStressStatus::Detected);
        assert_eq!(classify_stress(0.2, &config), ThermalStressStatus::Mild);
        assert_eq!(classify_stress(0.11, &config), ThermalStressStatus::Mild);
        assert_eq!(classify_stress(0.1, &config), ThermalStressStatus::Normal);
    }

    #[test]
    fn test_adaptation_ladder() {
        let config = ThermalConfig::default();
        assert_eq!(
            classify_adaptation(0.5, 4.0, 0.2, &config),
            AdaptationStatus::Impaired
        );
        assert_eq!(
            classify_adaptation(12.0, 1.0, 0.0, &config),
            AdaptationStatus::Suboptimal
        );
        assert_eq!(
            classify_adaptation(0.5, 4.0, 0.05, &config),
            AdaptationStatus::Excellent
        );
        assert_eq!(
            classify_adaptation(-1.0, 1.0, 0.05, &config),
            AdaptationStatus::Normal
        );
    }

    #[test]
    fn test_adaptation_uses_last_four_readings() {
        let config = ThermalConfig::default();
        let samples = vec![
            reading(40.0, 10.0, at(1, 8, 0)),
            reading(36.0, 35.5, at(1, 8, 30)),
            reading(36.0, 35.0, at(1, 9, 0)),
            reading(36.0, 35.5, at(1, 9, 30)),
            reading(36.0, 35.0, at(1, 10, 0)),
        ];
        let finding = adaptation(&samples, &config);
        assert_eq!(finding.status, AdaptationStatus::Normal);
        let metrics = finding.metrics.unwrap();
        assert_eq!(metrics.ambient_change, 0.5);
        assert_eq!(metrics.avg_difference, 0.8);
    }

    #[test]
    fn test_adaptation_requires_four_readings() {
        let config = ThermalConfig::default();
        let samples = vec![reading(36.0, 24.0, at(1, 8, 0))];
        let finding = adaptation(&samples, &config);
        assert_eq!(finding.status, AdaptationStatus::InsufficientData);
    }
}
