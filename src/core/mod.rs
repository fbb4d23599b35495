//! Core analytics for mindpulse.
//!
//! This module contains:
//! - Sample validation and rolling windows
//! - Personal baselines
//! - Cardiac analyzers (HRV, stress, resilience, multi-day trend)
//! - Thermal rhythm analyzers
//! - Composite scoring and the engine tying them together

pub mod assessment;
pub mod baseline;
pub mod engine;
pub mod hrv;
pub mod resilience;
pub mod sample;
pub mod scoring;
pub mod stats;
pub mod stress;
pub mod thermal;
pub mod time;
pub mod trend;
pub mod window;

// Re-export commonly used types
pub use assessment::{
    AnxietyLevel, AssessmentResult, CardiacAssessment, Classification, DataQuality, Finding,
    MoodStability, OverallLevel, Recommendation, RecommendationKind, ThermalAssessment,
};
pub use baseline::{CardiacBaseline, ThermalBaselines};
pub use engine::{Engine, EngineState, Ingest, SharedEngine, StateError};
pub use sample::{CardiacSample, SampleRejection, ThermalSample};
pub use time::HourRange;
pub use window::{CardiacWindow, ThermalWindow};
