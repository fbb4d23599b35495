//! Multi-day HRV trend and nighttime SpO2 analysis.
//!
//! A sustained decline in daily HRV together with frequent low oxygen
//! saturation during sleep is treated as a depression-risk pattern.

use crate::config::CardiacConfig;
use crate::core::assessment::{Classification, Finding};
use crate::core::sample::CardiacSample;
use crate::core::stats::{mean, rmssd};
use crate::core::time::{local_date, HourRange};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepressionRiskStatus {
    InsufficientData,
    Normal,
    Detected,
}

impl Classification for DepressionRiskStatus {
    fn level(self) -> &'static str {
        match self {
            DepressionRiskStatus::InsufficientData => "Insufficient Data",
            DepressionRiskStatus::Normal => "Normal",
            DepressionRiskStatus::Detected => "Detected",
        }
    }

    fn interpretation(self) -> &'static str {
        match self {
            DepressionRiskStatus::InsufficientData => {
                "At least 30 cardiac samples across 3 days are required for HRV trend analysis."
            }
            DepressionRiskStatus::Normal => {
                "No pattern associated with depression risk. HRV and oxygen saturation are in good condition."
            }
            DepressionRiskStatus::Detected => {
                "Pattern associated with depression risk: declining HRV and low oxygen saturation during sleep. Consulting a mental health professional is advised."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Unknown,
    Stable,
    Increasing,
    Decreasing,
}

/// Direction and relative change between the first and last value of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub direction: TrendDirection,
    pub change_percent: f64,
}

/// Per-calendar-day aggregate of the cardiac window.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    /// RMSSD of the day's RR sequence
    pub avg_rmssd: f64,
    pub avg_spo2: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepressionRiskMetrics {
    pub hrv_trend: TrendDirection,
    /// Absolute HRV change in percent, rounded
    pub hrv_change_percent: f64,
    /// Share of nighttime readings with low SpO2, in percent
    pub nighttime_low_spo2_percent: f64,
    pub nighttime_samples: usize,
    pub days_analyzed: usize,
}

/// Group samples by local calendar date, in chronological order.
pub fn daily_aggregates(samples: &[CardiacSample], tz: Tz) -> Vec<DailyAggregate> {
    let mut days: BTreeMap<NaiveDate, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for sample in samples {
        let entry = days.entry(local_date(sample.timestamp, tz)).or_default();
        entry.0.push(sample.rr_interval);
        entry.1.push(sample.spo2);
    }

    days.into_iter()
        .map(|(date, (intervals, spo2))| DailyAggregate {
            date,
            avg_rmssd: rmssd(&intervals),
            avg_spo2: mean(&spo2),
            samples: intervals.len(),
        })
        .collect()
}

/// Compare the last value of a series against the first.
pub fn calculate_trend(values: &[f64], stable_percent: f64) -> Trend {
    let (first, last) = match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if values.len() >= 2 && first != 0.0 => (first, last),
        _ => {
            return Trend {
                direction: TrendDirection::Unknown,
                change_percent: 0.0,
            }
        }
    };

    let change_percent = (last - first) / first * 100.0;
    let direction = if change_percent.abs() < stable_percent {
        TrendDirection::Stable
    } else if change_percent > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    Trend {
        direction,
        change_percent,
    }
}

/// Percentage (rounded) of nighttime samples whose SpO2 is below `low_spo2`.
///
/// Returns the percentage and the number of nighttime samples.
pub fn nighttime_low_spo2(
    samples: &[CardiacSample],
    night: HourRange,
    low_spo2: f64,
    tz: Tz,
) -> (f64, usize) {
    let night_samples: Vec<&CardiacSample> = samples
        .iter()
        .filter(|s| night.contains_time(s.timestamp, tz))
        .collect();
    if night_samples.is_empty() {
        return (0.0, 0);
    }
    let low = night_samples.iter().filter(|s| s.spo2 < low_spo2).count();
    let percent = (low as f64 / night_samples.len() as f64 * 100.0).round();
    (percent, night_samples.len())
}

/// Analyse the long-horizon HRV trend and nighttime oxygen saturation.
pub fn analyze(
    samples: &[CardiacSample],
    config: &CardiacConfig,
    tz: Tz,
) -> Finding<DepressionRiskStatus, DepressionRiskMetrics> {
    if samples.len() < config.min_samples {
        return Finding::insufficient(DepressionRiskStatus::InsufficientData, samples.len());
    }

    let days = daily_aggregates(samples, tz);
    if days.len() < config.min_trend_days {
        return Finding::insufficient(DepressionRiskStatus::InsufficientData, samples.len());
    }

    let daily_rmssd: Vec<f64> = days.iter().map(|d| d.avg_rmssd).collect();
    let trend = calculate_trend(&daily_rmssd, config.trend_stable_percent);
    let decline = trend.change_percent.abs();
    let (night_percent, night_count) =
        nighttime_low_spo2(samples, config.night_hours, config.low_spo2, tz);

    let status = if trend.direction == TrendDirection::Decreasing
        && decline > config.hrv_decline_percent
        && night_percent > config.nighttime_low_spo2_percent
    {
        DepressionRiskStatus::Detected
    } else {
        DepressionRiskStatus::Normal
    };

    Finding::new(
        status,
        DepressionRiskMetrics {
            hrv_trend: trend.direction,
            hrv_change_percent: decline.round(),
            nighttime_low_spo2_percent: night_percent,
            nighttime_samples: night_count,
            days_analyzed: days.len(),
        },
    )
}
