//! Validated sensor samples.
//!
//! Samples can only be constructed through range-checked constructors, so
//! every value held by a window is physiologically plausible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Valid body temperature range (°C).
pub const BODY_TEMP_RANGE: (f64, f64) = (30.0, 42.0);

/// Valid ambient temperature range (°C).
pub const AMBIENT_TEMP_RANGE: (f64, f64) = (0.0, 50.0);

/// Valid SpO2 range (%).
pub const SPO2_RANGE: (f64, f64) = (0.0, 100.0);

/// A heart rate / oxygen saturation reading with its RR interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardiacSample {
    /// Heart rate in beats per minute
    pub heart_rate: f64,
    /// Blood oxygen saturation in percent
    pub spo2: f64,
    /// Beat-to-beat interval in milliseconds
    pub rr_interval: f64,
    pub timestamp: DateTime<Utc>,
}

impl CardiacSample {
    /// Validate and build a cardiac sample.
    ///
    /// When the device does not report an RR interval it is estimated as
    /// `60000 / heart_rate`.
    pub fn new(
        heart_rate: f64,
        spo2: f64,
        rr_interval: Option<f64>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, SampleRejection> {
        check_finite("heart_rate", heart_rate)?;
        if heart_rate <= 0.0 {
            return Err(SampleRejection::NonPositive {
                field: "heart_rate",
                value: heart_rate,
            });
        }
        check_range("spo2", spo2, SPO2_RANGE)?;

        let rr_interval = match rr_interval {
            Some(rr) => {
                check_finite("rr_interval", rr)?;
                if rr <= 0.0 {
                    return Err(SampleRejection::NonPositive {
                        field: "rr_interval",
                        value: rr,
                    });
                }
                rr
            }
            None => 60_000.0 / heart_rate,
        };

        Ok(Self {
            heart_rate,
            spo2,
            rr_interval,
            timestamp,
        })
    }
}

/// A body / ambient temperature reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalSample {
    /// Skin / body temperature in °C
    pub body_temp: f64,
    /// Ambient temperature in °C
    pub ambient_temp: f64,
    pub timestamp: DateTime<Utc>,
}

impl ThermalSample {
    /// Validate and build a thermal sample.
    pub fn new(
        body_temp: f64,
        ambient_temp: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, SampleRejection> {
        check_range("body_temp", body_temp, BODY_TEMP_RANGE)?;
        check_range("ambient_temp", ambient_temp, AMBIENT_TEMP_RANGE)?;

        Ok(Self {
            body_temp,
            ambient_temp,
            timestamp,
        })
    }
}

/// Why a reading was not admitted into a window.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleRejection {
    MissingField(&'static str),
    NotFinite(&'static str),
    NonPositive {
        field: &'static str,
        value: f64,
    },
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    InvalidTimestamp(i64),
}

impl std::fmt::Display for SampleRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleRejection::MissingField(field) => write!(f, "missing field: {field}"),
            SampleRejection::NotFinite(field) => write!(f, "{field} is not a finite number"),
            SampleRejection::NonPositive { field, value } => {
                write!(f, "{field} must be positive, got {value}")
            }
            SampleRejection::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} {value} outside valid range [{min}, {max}]"),
            SampleRejection::InvalidTimestamp(ms) => write!(f, "invalid timestamp: {ms}"),
        }
    }
}

impl std::error::Error for SampleRejection {}

fn check_finite(field: &'static str, value: f64) -> Result<(), SampleRejection> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SampleRejection::NotFinite(field))
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    (min, max): (f64, f64),
) -> Result<(), SampleRejection> {
    check_finite(field, value)?;
    if value < min || value > max {
        return Err(SampleRejection::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rr_interval_derived_from_heart_rate() {
        let sample = CardiacSample::new(75.0, 98.0, None, Utc::now()).unwrap();
        assert_eq!(sample.rr_interval, 800.0);
    }

    #[test]
    fn test_measured_rr_interval_is_kept() {
        let sample = CardiacSample::new(75.0, 98.0, Some(812.0), Utc::now()).unwrap();
        assert_eq!(sample.rr_interval, 812.0);
    }

    #[test]
    fn test_cardiac_rejections() {
        let now = Utc::now();
        assert!(matches!(
            CardiacSample::new(0.0, 98.0, None, now),
            Err(SampleRejection::NonPositive { field: "heart_rate", .. })
        ));
        assert!(matches!(
            CardiacSample::new(70.0, 101.0, None, now),
            Err(SampleRejection::OutOfRange { field: "spo2", .. })
        ));
        assert!(matches!(
            CardiacSample::new(f64::NAN, 98.0, None, now),
            Err(SampleRejection::NotFinite("heart_rate"))
        ));
        assert!(matches!(
            CardiacSample::new(70.0, 98.0, Some(-5.0), now),
            Err(SampleRejection::NonPositive { field: "rr_interval", .. })
        ));
    }

    #[test]
    fn test_thermal_range_boundaries() {
        let now = Utc::now();
        assert!(ThermalSample::new(30.0, 0.0, now).is_ok());
        assert!(ThermalSample::new(42.0, 50.0, now).is_ok());
        assert!(ThermalSample::new(29.9, 24.0, now).is_err());
        assert!(ThermalSample::new(36.5, 50.1, now).is_err());
    }

    #[test]
    fn test_rejection_display() {
        let err = ThermalSample::new(45.0, 24.0, Utc::now()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "body_temp 45 outside valid range [30, 42]"
        );
    }
}
