//! Configuration for mindpulse.
//!
//! `Config` is the persisted application configuration; `AnalyzerConfig`
//! carries every window size, interval and classification threshold used by
//! the engine.

use crate::core::time::HourRange;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// IANA timezone of the wearer, used for hour-of-day and day buckets
    pub timezone: String,

    /// Path for storing the ingestion log
    pub data_path: PathBuf,

    /// Path of the persisted engine state
    pub state_path: PathBuf,

    /// Analyzer windows and thresholds
    #[serde(default)]
    pub thresholds: AnalyzerConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mindpulse");

        Self {
            timezone: "UTC".to_string(),
            state_path: data_dir.join("state.json"),
            data_path: data_dir,
            thresholds: AnalyzerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mindpulse")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        if let Some(parent) = self.state_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }
        Ok(())
    }

    /// Parse the configured timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }
}

/// Window sizes and thresholds for the analytics engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub cardiac: CardiacConfig,
    #[serde(default)]
    pub thermal: ThermalConfig,
}

/// Heart rate, SpO2 and HRV settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardiacConfig {
    /// Maximum samples retained in the cardiac window
    pub max_samples: usize,
    /// Samples required before HRV, stress and trend analysis
    pub min_samples: usize,
    /// Most recent samples used for the BPM/RMSSD baseline and HRV analysis
    pub baseline_samples: usize,
    /// RMSSD below this (ms) indicates anxiety / high stress
    pub rmssd_low: f64,
    /// RMSSD above this (ms) indicates relaxation / good resilience
    pub rmssd_high: f64,
    /// Resting BPM above this is a cardiac stress candidate
    pub stress_high_bpm: f64,
    /// RMSSD (ms) below this together with high BPM signals cardiac stress
    pub stress_low_rmssd: f64,
    /// Most recent samples inspected for stability
    pub stability_window: usize,
    /// BPM standard deviation below this counts as a stable (resting) reading
    pub stability_max_std_dev: f64,
    /// BPM above baseline by more than this starts a spike
    pub spike_threshold_bpm: f64,
    /// Mean recovery below this is high resilience
    #[serde(with = "duration_serde")]
    pub recovery_fast: Duration,
    /// Mean recovery below this is moderate resilience
    #[serde(with = "duration_serde")]
    pub recovery_moderate: Duration,
    /// Distinct calendar days required for trend analysis
    pub min_trend_days: usize,
    /// Absolute change (%) below which a trend is stable
    pub trend_stable_percent: f64,
    /// Absolute HRV decline (%) that contributes to depression risk
    pub hrv_decline_percent: f64,
    /// SpO2 (%) below this during the night counts as a low reading
    pub low_spo2: f64,
    /// Share of low nighttime SpO2 readings (%) that contributes to risk
    pub nighttime_low_spo2_percent: f64,
    /// Local hours considered nighttime for SpO2
    pub night_hours: HourRange,
}

impl Default for CardiacConfig {
    fn default() -> Self {
        Self {
            max_samples: 100,
            min_samples: 30,
            baseline_samples: 30,
            rmssd_low: 20.0,
            rmssd_high: 50.0,
            stress_high_bpm: 90.0,
            stress_low_rmssd: 25.0,
            stability_window: 5,
            stability_max_std_dev: 5.0,
            spike_threshold_bpm: 20.0,
            recovery_fast: Duration::from_secs(60),
            recovery_moderate: Duration::from_secs(180),
            min_trend_days: 3,
            trend_stable_percent: 5.0,
            hrv_decline_percent: 20.0,
            low_spo2: 95.0,
            nighttime_low_spo2_percent: 30.0,
            night_hours: HourRange::new(22, 6),
        }
    }
}

/// Body and ambient temperature settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalConfig {
    /// Minimum spacing between logged thermal entries
    #[serde(with = "duration_serde")]
    pub logging_interval: Duration,
    /// Entries older than this (relative to the newest) are pruned
    #[serde(with = "duration_serde")]
    pub retention: Duration,
    pub daytime_hours: HourRange,
    pub evening_hours: HourRange,
    pub early_morning_hours: HourRange,
    pub sleep_hours: HourRange,
    pub resting_hours: HourRange,
    /// Evening vs early-morning difference (°C) below which the rhythm is disrupted
    pub circadian_min_difference: f64,
    /// Difference (°C) at or above which the rhythm is excellent
    pub circadian_excellent_difference: f64,
    /// Nocturnal drop (°C) below which sleep quality is poor
    pub min_nocturnal_drop: f64,
    /// Nocturnal drop (°C) at or above which sleep quality is excellent
    pub excellent_nocturnal_drop: f64,
    /// Window preferred for the resting variance estimate
    #[serde(with = "duration_serde")]
    pub stress_window: Duration,
    /// Temperature range (°C) above which a stress response is detected; half of it is mild
    pub stress_max_range: f64,
    /// Most recent entries used for adaptation analysis
    pub adaptation_samples: usize,
    /// Body minus ambient difference (°C) tolerated either side of zero
    pub adaptation_normal_difference: f64,
    /// Ambient change (°C) considered drastic
    pub max_ambient_change: f64,
    /// Body temperature variance above which the body is considered unstable
    pub max_body_variance: f64,
    /// Entries needed for the window to count as sufficient (≈4 hours)
    pub sufficient_samples: usize,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            logging_interval: Duration::from_secs(30 * 60),
            retention: Duration::from_secs(24 * 60 * 60),
            daytime_hours: HourRange::new(10, 18),
            evening_hours: HourRange::new(16, 18),
            early_morning_hours: HourRange::new(3, 5),
            sleep_hours: HourRange::new(22, 6),
            resting_hours: HourRange::new(20, 23),
            circadian_min_difference: 0.5,
            circadian_excellent_difference: 1.0,
            min_nocturnal_drop: 0.3,
            excellent_nocturnal_drop: 0.6,
            stress_window: Duration::from_secs(10 * 60),
            stress_max_range: 0.2,
            adaptation_samples: 4,
            adaptation_normal_difference: 1.0,
            max_ambient_change: 3.0,
            max_body_variance: 0.1,
            sufficient_samples: 8,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidTimezone(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidTimezone(tz) => write!(f, "Unknown timezone: {tz}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration, stored as whole seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
