//! Composite scoring and recommendations.
//!
//! The overall score is driven by the thermal dimensions; the cardiac
//! dimensions feed mood stability and anxiety level.

use crate::core::assessment::{
    AnxietyLevel, CardiacAssessment, MoodStability, OverallLevel, Recommendation,
    RecommendationKind, ThermalAssessment,
};
use crate::core::hrv::HrvStatus;
use crate::core::resilience::ResilienceStatus;
use crate::core::stress::CardiacStressStatus;
use crate::core::thermal::{
    AdaptationStatus, CircadianStatus, SleepQualityStatus, ThermalStressStatus,
};
use crate::core::trend::DepressionRiskStatus;

/// Score penalties for adverse thermal findings.
const CIRCADIAN_DISRUPTED_PENALTY: i32 = 25;
const SLEEP_POOR_PENALTY: i32 = 25;
const STRESS_DETECTED_PENALTY: i32 = 20;
const STRESS_MILD_PENALTY: i32 = 10;
const ADAPTATION_IMPAIRED_PENALTY: i32 = 20;
const ADAPTATION_SUBOPTIMAL_PENALTY: i32 = 10;

/// Result of thermal scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeScore {
    pub score: i32,
    pub level: OverallLevel,
    pub issues: Vec<String>,
}

/// Map a 0-100 score to its level.
pub fn overall_level(score: i32) -> OverallLevel {
    match score {
        s if s >= 80 => OverallLevel::Excellent,
        s if s >= 60 => OverallLevel::Good,
        s if s >= 40 => OverallLevel::Fair,
        _ => OverallLevel::Poor,
    }
}

/// Start from 100 and subtract a penalty per adverse thermal finding.
pub fn thermal_score(thermal: &ThermalAssessment) -> CompositeScore {
    let mut score = 100;
    let mut issues = Vec::new();

    if thermal.circadian.status == CircadianStatus::Disrupted {
        score -= CIRCADIAN_DISRUPTED_PENALTY;
        issues.push("Circadian rhythm disruption".to_string());
    }

    if thermal.sleep.status == SleepQualityStatus::Poor {
        score -= SLEEP_POOR_PENALTY;
        issues.push("Low sleep quality".to_string());
    }

    match thermal.stress.status {
        ThermalStressStatus::Detected => {
            score -= STRESS_DETECTED_PENALTY;
            issues.push("Stress response detected".to_string());
        }
        ThermalStressStatus::Mild => score -= STRESS_MILD_PENALTY,
        ThermalStressStatus::Normal | ThermalStressStatus::InsufficientData => {}
    }

    match thermal.adaptation.status {
        AdaptationStatus::Impaired => {
            score -= ADAPTATION_IMPAIRED_PENALTY;
            issues.push("Weak autonomic function".to_string());
        }
        AdaptationStatus::Suboptimal => score -= ADAPTATION_SUBOPTIMAL_PENALTY,
        AdaptationStatus::Normal
        | AdaptationStatus::Excellent
        | AdaptationStatus::InsufficientData => {}
    }

    CompositeScore {
        score,
        level: overall_level(score),
        issues,
    }
}

pub fn mood_stability(cardiac: &CardiacAssessment) -> MoodStability {
    if cardiac.hrv.status == HrvStatus::AnxietyHighStress
        || cardiac.cardiac_stress.status == CardiacStressStatus::Detected
    {
        MoodStability::Unstable
    } else if cardiac.hrv.status == HrvStatus::RelaxedGoodResilience {
        MoodStability::VeryStable
    } else {
        MoodStability::Stable
    }
}

pub fn anxiety_level(cardiac: &CardiacAssessment) -> AnxietyLevel {
    if cardiac.hrv.status == HrvStatus::AnxietyHighStress {
        AnxietyLevel::High
    } else if cardiac.cardiac_stress.status == CardiacStressStatus::Detected {
        AnxietyLevel::Moderate
    } else {
        AnxietyLevel::Low
    }
}

/// One recommendation per adverse condition, or a single success message.
pub fn recommendations(
    cardiac: &CardiacAssessment,
    thermal: &ThermalAssessment,
) -> Vec<Recommendation> {
    use RecommendationKind::*;

    let mut out = Vec::new();

    if cardiac.hrv.status == HrvStatus::AnxietyHighStress {
        out.push(Recommendation::new(
            Warning,
            "Practise deep breathing exercises to improve HRV.",
        ));
    }
    if cardiac.cardiac_stress.status == CardiacStressStatus::Detected {
        out.push(Recommendation::new(
            Warning,
            "Reduce stress-inducing activities and get enough rest.",
        ));
    }
    if cardiac.depression_risk.status == DepressionRiskStatus::Detected {
        out.push(Recommendation::new(
            Danger,
            "Consult a mental health professional.",
        ));
    }
    if cardiac.resilience.status == ResilienceStatus::Low {
        out.push(Recommendation::new(
            Info,
            "Practise mindfulness and meditation to build resilience.",
        ));
    }

    let thermal_kinds = [
        (
            thermal.circadian.status == CircadianStatus::Disrupted,
            Warning,
            thermal.circadian.recommendation.as_deref(),
        ),
        (
            thermal.sleep.status == SleepQualityStatus::Poor,
            Warning,
            thermal.sleep.recommendation.as_deref(),
        ),
        (
            thermal.stress.status == ThermalStressStatus::Detected,
            Warning,
            thermal.stress.recommendation.as_deref(),
        ),
        (
            thermal.stress.status == ThermalStressStatus::Mild,
            Info,
            thermal.stress.recommendation.as_deref(),
        ),
        (
            thermal.adaptation.status == AdaptationStatus::Impaired,
            Danger,
            thermal.adaptation.recommendation.as_deref(),
        ),
        (
            thermal.adaptation.status == AdaptationStatus::Suboptimal,
            Info,
            thermal.adaptation.recommendation.as_deref(),
        ),
    ];
    for (triggered, kind, text) in thermal_kinds {
        if let (true, Some(text)) = (triggered, text) {
            out.push(Recommendation::new(kind, text));
        }
    }

    if out.is_empty() {
        out.push(Recommendation::new(
            Success,
            "Your mental health indicators look good. Keep it up!",
        ));
    }

    out
}
