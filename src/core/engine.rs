//! The analytics engine.
//!
//! An [`Engine`] owns one wearer's windows, baselines and cached assessment.
//! Producers push readings; consumers pull an [`AssessmentResult`]. Every
//! accepted sample invalidates the cache, so repeated queries without new
//! data return the same result.

use crate::config::AnalyzerConfig;
use crate::core::assessment::{AssessmentResult, CardiacAssessment, DataQuality};
use crate::core::baseline::{CardiacBaseline, ThermalBaselines};
use crate::core::sample::{CardiacSample, SampleRejection, ThermalSample};
use crate::core::time::to_delta;
use crate::core::window::{CardiacWindow, ThermalWindow};
use crate::core::{hrv, resilience, stress, thermal, trend};
use crate::source::{CardiacReading, ThermalReading};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Format version of [`EngineState`].
pub const STATE_VERSION: u32 = 1;

/// Engine shared between producers and consumers.
pub type SharedEngine = Arc<Mutex<Engine>>;

/// Outcome of pushing a reading.
#[derive(Debug, Clone, PartialEq)]
pub enum Ingest {
    Accepted,
    /// Thermal reading arrived before the logging interval elapsed
    Throttled,
    Rejected(SampleRejection),
}

impl Ingest {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Ingest::Accepted)
    }
}

/// Analytics engine for a single wearer.
#[derive(Debug, Clone)]
pub struct Engine {
    config: AnalyzerConfig,
    tz: Tz,
    instance_id: Uuid,
    cardiac: CardiacWindow,
    thermal: ThermalWindow,
    cardiac_baseline: Option<CardiacBaseline>,
    thermal_baselines: ThermalBaselines,
    last_analysis: Option<AssessmentResult>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default(), Tz::UTC)
    }
}

impl Engine {
    /// Create an empty engine with the given thresholds and wearer timezone.
    pub fn new(config: AnalyzerConfig, tz: Tz) -> Self {
        let cardiac = CardiacWindow::new(config.cardiac.max_samples);
        let thermal = ThermalWindow::new(
            to_delta(config.thermal.logging_interval),
            to_delta(config.thermal.retention),
        );
        let instance_id = Uuid::new_v4();
        tracing::debug!(%instance_id, timezone = tz.name(), "engine created");

        Self {
            config,
            tz,
            instance_id,
            cardiac,
            thermal,
            cardiac_baseline: None,
            thermal_baselines: ThermalBaselines::default(),
            last_analysis: None,
        }
    }

    /// Wrap the engine for use from several threads.
    pub fn shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    /// Validate a cardiac reading and append it to the window.
    ///
    /// Recomputes the cardiac baseline once the window holds enough samples.
    pub fn add_cardiac_sample(&mut self, reading: CardiacReading) -> Ingest {
        let sample = match reading.to_sample(Utc::now()) {
            Ok(sample) => sample,
            Err(rejection) => {
                tracing::warn!(
                    instance_id = %self.instance_id,
                    %rejection,
                    "rejected cardiac reading"
                );
                return Ingest::Rejected(rejection);
            }
        };

        self.cardiac.push(sample);
        if self.cardiac.len() >= self.config.cardiac.min_samples {
            let samples = self.cardiac.to_vec();
            self.cardiac_baseline = CardiacBaseline::compute(&samples, &self.config.cardiac);
            if let Some(baseline) = &self.cardiac_baseline {
                tracing::debug!(
                    bpm = baseline.bpm,
                    rmssd = baseline.rmssd,
                    "cardiac baseline recomputed"
                );
            }
        }
        self.last_analysis = None;
        Ingest::Accepted
    }

    /// Validate a thermal reading and log it if the logging interval has
    /// elapsed.
    pub fn add_thermal_sample(&mut self, reading: ThermalReading) -> Ingest {
        let sample = match reading.to_sample(Utc::now()) {
            Ok(sample) => sample,
            Err(rejection) => {
                tracing::warn!(
                    instance_id = %self.instance_id,
                    %rejection,
                    "rejected thermal reading"
                );
                return Ingest::Rejected(rejection);
            }
        };

        if !self.thermal.push(sample) {
            tracing::debug!(
                timestamp = %sample.timestamp,
                last_logged = ?self.thermal.last_logged(),
                "thermal reading throttled"
            );
            return Ingest::Throttled;
        }

        self.thermal_baselines
            .update(self.thermal.as_slice(), &self.config.thermal, self.tz);
        tracing::debug!(
            entries = self.thermal.len(),
            baselines = ?self.thermal_baselines,
            "thermal baselines recomputed"
        );
        self.last_analysis = None;
        Ingest::Accepted
    }

    /// Newest sample timestamp across both windows.
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        let cardiac = self.cardiac.latest().map(|s| s.timestamp);
        let thermal = self.thermal.latest().map(|s| s.timestamp);
        cardiac.max(thermal)
    }

    /// Run every analyzer over the current windows without touching the cache.
    pub fn analyze(&self) -> AssessmentResult {
        let reference = self.reference_time();
        let cardiac_samples = self.cardiac.to_vec();
        let thermal_samples = self.thermal.as_slice();
        let cardiac_config = &self.config.cardiac;

        let cardiac = CardiacAssessment {
            hrv: hrv::analyze(&cardiac_samples, cardiac_config),
            cardiac_stress: stress::analyze(&cardiac_samples, cardiac_config),
            depression_risk: trend::analyze(&cardiac_samples, cardiac_config, self.tz),
            resilience: resilience::analyze(
                &cardiac_samples,
                self.cardiac_baseline.map(|b| b.bpm),
                cardiac_config,
            ),
        };
        let thermal = thermal::analyze(
            thermal_samples,
            &self.thermal_baselines,
            reference,
            &self.config.thermal,
            self.tz,
        );

        let data_quality = DataQuality {
            cardiac_samples: cardiac_samples.len(),
            cardiac_sufficient: cardiac_samples.len() >= cardiac_config.min_samples,
            thermal_samples: thermal_samples.len(),
            thermal_sufficient: thermal_samples.len() >= self.config.thermal.sufficient_samples,
            thermal_span_hours: self.thermal.span_hours(),
        };

        AssessmentResult::compose(reference, cardiac, thermal, data_quality)
    }

    /// Return the cached assessment, computing it if a sample was accepted
    /// since the last call.
    pub fn full_analysis(&mut self) -> AssessmentResult {
        if let Some(cached) = &self.last_analysis {
            return cached.clone();
        }
        let result = self.analyze();
        tracing::debug!(
            instance_id = %self.instance_id,
            score = result.overall_score,
            "assessment computed"
        );
        self.last_analysis = Some(result.clone());
        result
    }

    /// Snapshot everything needed to resume later.
    pub fn export_state(&self) -> EngineState {
        EngineState {
            version: STATE_VERSION,
            instance_id: self.instance_id,
            timezone: self.tz.name().to_string(),
            cardiac: self.cardiac.clone(),
            thermal: self.thermal.clone(),
            cardiac_baseline: self.cardiac_baseline,
            thermal_baselines: self.thermal_baselines,
            last_analysis: self.last_analysis.clone(),
        }
    }

    /// Replace windows, baselines and the cached assessment with a snapshot.
    ///
    /// Imported samples are re-validated and pushed into windows built from
    /// this engine's thresholds, so window bounds, throttling and retention
    /// hold no matter what the snapshot contains. Baselines are recomputed.
    /// The cached assessment is kept only when the rebuilt windows match the
    /// snapshot exactly. Timezone stays as configured on this engine.
    pub fn import_state(&mut self, state: EngineState) {
        if state.timezone != self.tz.name() {
            tracing::warn!(
                imported = %state.timezone,
                configured = self.tz.name(),
                "imported state was bucketed in a different timezone"
            );
        }

        let mut dropped = 0usize;
        let mut cardiac = CardiacWindow::new(self.config.cardiac.max_samples);
        for s in state.cardiac.to_vec() {
            match CardiacSample::new(s.heart_rate, s.spo2, Some(s.rr_interval), s.timestamp) {
                Ok(sample) => cardiac.push(sample),
                Err(_) => dropped += 1,
            }
        }

        let mut thermal = ThermalWindow::new(
            to_delta(self.config.thermal.logging_interval),
            to_delta(self.config.thermal.retention),
        );
        for s in state.thermal.as_slice() {
            match ThermalSample::new(s.body_temp, s.ambient_temp, s.timestamp) {
                Ok(sample) => {
                    if !thermal.push(sample) {
                        dropped += 1;
                    }
                }
                Err(_) => dropped += 1,
            }
        }
        if dropped > 0 {
            tracing::warn!(dropped, "discarded invalid or out-of-window samples from imported state");
        }

        let intact = cardiac == state.cardiac && thermal == state.thermal;

        self.cardiac_baseline = if cardiac.len() >= self.config.cardiac.min_samples {
            CardiacBaseline::compute(&cardiac.to_vec(), &self.config.cardiac)
        } else {
            None
        };
        let mut thermal_baselines = ThermalBaselines::default();
        thermal_baselines.update(thermal.as_slice(), &self.config.thermal, self.tz);
        if intact {
            // Keep values for ranges whose samples have already aged out.
            let stale = state.thermal_baselines;
            let keep = |current: Option<f64>, old: Option<f64>| {
                current.or(old.filter(|v| v.is_finite()))
            };
            thermal_baselines.daytime = keep(thermal_baselines.daytime, stale.daytime);
            thermal_baselines.evening = keep(thermal_baselines.evening, stale.evening);
            thermal_baselines.early_morning =
                keep(thermal_baselines.early_morning, stale.early_morning);
        }
        self.thermal_baselines = thermal_baselines;

        self.instance_id = state.instance_id;
        self.cardiac = cardiac;
        self.thermal = thermal;
        self.last_analysis = if intact { state.last_analysis } else { None };
        tracing::info!(
            instance_id = %self.instance_id,
            cardiac = self.cardiac.len(),
            thermal = self.thermal.len(),
            "engine state imported"
        );
    }

    /// Drop all samples, baselines and the cached assessment.
    pub fn reset(&mut self) {
        self.cardiac.clear();
        self.thermal.clear();
        self.cardiac_baseline = None;
        self.thermal_baselines = ThermalBaselines::default();
        self.last_analysis = None;
        tracing::info!(instance_id = %self.instance_id, "engine reset");
    }

    pub fn last_analysis(&self) -> Option<&AssessmentResult> {
        self.last_analysis.as_ref()
    }

    pub fn cardiac_window(&self) -> &CardiacWindow {
        &self.cardiac
    }

    pub fn thermal_window(&self) -> &ThermalWindow {
        &self.thermal
    }

    pub fn cardiac_baseline(&self) -> Option<CardiacBaseline> {
        self.cardiac_baseline
    }

    pub fn thermal_baselines(&self) -> ThermalBaselines {
        self.thermal_baselines
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }
}

/// Serialized engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub version: u32,
    pub instance_id: Uuid,
    /// Timezone the baselines were bucketed in
    pub timezone: String,
    pub cardiac: CardiacWindow,
    pub thermal: ThermalWindow,
    pub cardiac_baseline: Option<CardiacBaseline>,
    pub thermal_baselines: ThermalBaselines,
    pub last_analysis: Option<AssessmentResult>,
}

impl EngineState {
    pub fn to_json(&self) -> Result<String, StateError> {
        serde_json::to_string_pretty(self).map_err(|e| StateError::SerializeError(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let state: EngineState =
            serde_json::from_str(json).map_err(|e| StateError::ParseError(e.to_string()))?;
        if state.version != STATE_VERSION {
            return Err(StateError::UnsupportedVersion(state.version));
        }
        Ok(state)
    }

    /// Write the state to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StateError::IoError(e.to_string()))?;
        }
        std::fs::write(path, self.to_json()?).map_err(|e| StateError::IoError(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, StateError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StateError::IoError(e.to_string()))?;
        Self::from_json(&content)
    }
}

/// State persistence errors.
#[derive(Debug)]
pub enum StateError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    UnsupportedVersion(u32),
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateError::IoError(e) => write!(f, "IO error: {e}"),
            StateError::ParseError(e) => write!(f, "Parse error: {e}"),
            StateError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            StateError::UnsupportedVersion(v) => write!(f, "Unsupported state version: {v}"),
        }
    }
}

impl std::error::Error for StateError {}
