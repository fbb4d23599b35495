//! mindpulse - stress and mental-wellbeing signals from wearable readings.
//!
//! This library turns a stream of heart rate, SpO2 and temperature readings
//! into an interpretable assessment: heart rate variability, cardiac stress,
//! multi-day depression-risk trend, stress resilience, circadian rhythm,
//! nocturnal temperature drop, resting thermal variance and thermoregulation.
//!
//! # Guarantees
//!
//! - **Validated input**: implausible readings are rejected, never stored
//! - **Bounded memory**: 100 cardiac samples and 24 hours of half-hourly
//!   thermal entries at most
//! - **Deterministic output**: the assessment is a pure function of the
//!   windows and baselines, cached until the next accepted sample
//! - **Not a diagnosis**: every result is a wellbeing indicator
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          mindpulse                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │   Source    │──▶│  Validator  │──▶│   Windows   │        │
//! │  │ (JSONL/API) │   │  (samples)  │   │ + Baselines │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         │                                    │              │
//! │         ▼                                    ▼              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  Ingest     │   │ Assessment  │◀──│  Analyzers  │        │
//! │  │    Log      │   │  (scored)   │   │ (cardiac +  │        │
//! │  └─────────────┘   └─────────────┘   │  thermal)   │        │
//! │                                      └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use mindpulse::{CardiacReading, Engine};
//!
//! let mut engine = Engine::default();
//! let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
//! for i in 0..30 {
//!     let bpm = if i % 2 == 0 { 70.0 } else { 72.0 };
//!     engine.add_cardiac_sample(CardiacReading::new(bpm, 98.0, start + Duration::seconds(i)));
//! }
//!
//! let assessment = engine.full_analysis();
//! println!("{}", assessment.to_json());
//! ```

pub mod config;
pub mod core;
pub mod source;
pub mod transparency;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{AnalyzerConfig, CardiacConfig, Config, ConfigError, ThermalConfig};
pub use crate::core::{AssessmentResult, Engine, EngineState, Ingest, SharedEngine, StateError};
pub use source::{CardiacReading, ReplaySource, SensorReading, SourceError, ThermalReading};
pub use transparency::{IngestLog, IngestStats, SharedIngestLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notice shown with every assessment.
pub const DISCLAIMER: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                  MINDPULSE - WELLBEING NOTICE                    ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  mindpulse estimates stress and wellbeing indicators from        ║
║  consumer wearable readings.                                     ║
║                                                                  ║
║  ✓ WHAT IT DOES:                                                 ║
║    • Tracks heart rate variability and resting heart rate        ║
║    • Watches multi-day HRV and nighttime SpO2 trends             ║
║    • Follows your daily body temperature rhythm                  ║
║                                                                  ║
║  ✗ WHAT IT IS NOT:                                               ║
║    • A medical device or a diagnosis                             ║
║    • A substitute for a mental health professional               ║
║    • Clinically validated                                        ║
║                                                                  ║
║  All readings are processed locally. If you are struggling,      ║
║  please reach out to a qualified professional.                   ║
║                                                                  ║
║  You can view ingestion statistics anytime with:                 ║
║    mindpulse status                                              ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
