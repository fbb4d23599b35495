//! Assessment result types.
//!
//! Each analysis dimension produces a [`Finding`]: a status from an
//! exhaustive enum, a display level and interpretation derived from that
//! status, and the metrics the status was computed from. An
//! [`AssessmentResult`] bundles all dimensions with the composite score.

use crate::core::hrv::{HrvMetrics, HrvStatus};
use crate::core::resilience::{ResilienceMetrics, ResilienceStatus};
use crate::core::scoring;
use crate::core::stress::{CardiacStressMetrics, CardiacStressStatus};
use crate::core::thermal::{
    AdaptationMetrics, AdaptationStatus, CircadianMetrics, CircadianStatus, SleepMetrics,
    SleepQualityStatus, ThermalStressMetrics, ThermalStressStatus,
};
use crate::core::trend::{DepressionRiskMetrics, DepressionRiskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maps a classification status to its human-readable presentation.
pub trait Classification: Copy {
    /// Short display level, e.g. "Normal" or "Disrupted".
    fn level(self) -> &'static str;

    /// One or two sentence explanation of the status.
    fn interpretation(self) -> &'static str;

    /// Suggested action, if the dimension carries one.
    fn recommendation(self) -> Option<&'static str> {
        None
    }
}

/// The result of one analysis dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding<S, M> {
    pub status: S,
    pub level: String,
    pub interpretation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    /// Number of samples available when data was insufficient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_points: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<M>,
}

impl<S: Classification, M> Finding<S, M> {
    /// Build a finding from a computed status and its metrics.
    pub fn new(status: S, metrics: M) -> Self {
        Self {
            status,
            level: status.level().to_string(),
            interpretation: status.interpretation().to_string(),
            recommendation: status.recommendation().map(str::to_string),
            data_points: None,
            metrics: Some(metrics),
        }
    }

    /// Build a finding for a dimension whose data requirements are unmet.
    pub fn insufficient(status: S, data_points: usize) -> Self {
        Self {
            status,
            level: status.level().to_string(),
            interpretation: status.interpretation().to_string(),
            recommendation: None,
            data_points: Some(data_points),
            metrics: None,
        }
    }
}

/// Cardiac dimensions (heart rate, HRV, SpO2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardiacAssessment {
    pub hrv: Finding<HrvStatus, HrvMetrics>,
    pub cardiac_stress: Finding<CardiacStressStatus, CardiacStressMetrics>,
    pub depression_risk: Finding<DepressionRiskStatus, DepressionRiskMetrics>,
    pub resilience: Finding<ResilienceStatus, ResilienceMetrics>,
}

/// Thermal rhythm dimensions (body and ambient temperature).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalAssessment {
    pub circadian: Finding<CircadianStatus, CircadianMetrics>,
    pub sleep: Finding<SleepQualityStatus, SleepMetrics>,
    pub stress: Finding<ThermalStressStatus, ThermalStressMetrics>,
    pub adaptation: Finding<AdaptationStatus, AdaptationMetrics>,
}

/// Overall qualitative level derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodStability {
    Unstable,
    Stable,
    VeryStable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnxietyLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub text: String,
}

impl Recommendation {
    pub fn new(kind: RecommendationKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }
}

/// How much data backed the assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub cardiac_samples: usize,
    pub cardiac_sufficient: bool,
    pub thermal_samples: usize,
    pub thermal_sufficient: bool,
    /// Hours covered by the thermal window
    pub thermal_span_hours: f64,
}

/// Immutable snapshot of the full analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Time of the newest sample the analysis is based on
    pub timestamp: Option<DateTime<Utc>>,
    pub cardiac: CardiacAssessment,
    pub thermal: ThermalAssessment,
    /// 0-100, from the thermal dimensions
    pub overall_score: i32,
    pub overall_level: OverallLevel,
    pub mood_stability: MoodStability,
    pub anxiety_level: AnxietyLevel,
    /// Resilience level label
    pub stress_resilience: String,
    /// Short labels of the severe thermal conditions found
    pub issues: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub data_quality: DataQuality,
}

impl AssessmentResult {
    /// Merge per-dimension findings into a scored assessment.
    pub fn compose(
        timestamp: Option<DateTime<Utc>>,
        cardiac: CardiacAssessment,
        thermal: ThermalAssessment,
        data_quality: DataQuality,
    ) -> Self {
        let composite = scoring::thermal_score(&thermal);

        Self {
            timestamp,
            overall_score: composite.score,
            overall_level: composite.level,
            mood_stability: scoring::mood_stability(&cardiac),
            anxiety_level: scoring::anxiety_level(&cardiac),
            stress_resilience: cardiac.resilience.level.clone(),
            issues: composite.issues,
            recommendations: scoring::recommendations(&cardiac, &thermal),
            data_quality,
            cardiac,
            thermal,
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::thermal::{CircadianMetrics, CircadianStatus};

    #[test]
    fn test_finding_json_round_trip() {
        let finding = Finding::new(
            CircadianStatus::Normal,
            CircadianMetrics {
                evening_temp: 37.0,
                early_morning_temp: 36.3,
                difference: 0.7,
            },
        );
        let json = serde_json::to_string(&finding).unwrap();
        let parsed: Finding<CircadianStatus, CircadianMetrics> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, finding);
    }

    #[test]
    fn test_insufficient_finding_omits_metrics() {
        let finding: Finding<CircadianStatus, CircadianMetrics> =
            Finding::insufficient(CircadianStatus::InsufficientData, 3);
        let json = serde_json::to_string(&finding).unwrap();
        assert!(!json.contains("metrics"));

        let parsed: Finding<CircadianStatus, CircadianMetrics> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.metrics, None);
        assert_eq!(parsed.data_points, Some(3));
    }
}
