//! Raw readings as produced by the wearable bridge.
//!
//! Every field is optional on the wire; validation happens when a reading is
//! converted into a sample. Readings without a timestamp are stamped with
//! their arrival time.

use crate::core::sample::{CardiacSample, SampleRejection, ThermalSample};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A reading timestamp: epoch milliseconds or an RFC 3339 string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Rfc3339(DateTime<Utc>),
}

impl Timestamp {
    pub fn to_datetime(self) -> Result<DateTime<Utc>, SampleRejection> {
        match self {
            Timestamp::Millis(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or(SampleRejection::InvalidTimestamp(ms)),
            Timestamp::Rfc3339(dt) => Ok(dt),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::Rfc3339(dt)
    }
}

fn resolve(
    timestamp: Option<Timestamp>,
    received_at: DateTime<Utc>,
) -> Result<DateTime<Utc>, SampleRejection> {
    match timestamp {
        Some(ts) => ts.to_datetime(),
        None => Ok(received_at),
    }
}

/// Heart rate, SpO2 and optional RR interval from the pulse oximeter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardiacReading {
    #[serde(default, alias = "heartRate", alias = "bpm")]
    pub heart_rate: Option<f64>,
    #[serde(default, alias = "SpO2", alias = "oxygen")]
    pub spo2: Option<f64>,
    #[serde(default, alias = "rrInterval")]
    pub rr_interval: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

impl CardiacReading {
    pub fn new(heart_rate: f64, spo2: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            heart_rate: Some(heart_rate),
            spo2: Some(spo2),
            rr_interval: None,
            timestamp: Some(timestamp.into()),
        }
    }

    pub fn with_rr_interval(mut self, rr_interval: f64) -> Self {
        self.rr_interval = Some(rr_interval);
        self
    }

    /// Validate into a sample, using `received_at` when no timestamp was sent.
    pub fn to_sample(&self, received_at: DateTime<Utc>) -> Result<CardiacSample, SampleRejection> {
        let heart_rate = self
            .heart_rate
            .ok_or(SampleRejection::MissingField("heart_rate"))?;
        let spo2 = self.spo2.ok_or(SampleRejection::MissingField("spo2"))?;
        let timestamp = resolve(self.timestamp, received_at)?;
        CardiacSample::new(heart_rate, spo2, self.rr_interval, timestamp)
    }
}

impl TryFrom<CardiacReading> for CardiacSample {
    type Error = SampleRejection;

    fn try_from(reading: CardiacReading) -> Result<Self, Self::Error> {
        reading.to_sample(Utc::now())
    }
}

/// Body and ambient temperature from the thermal sensor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalReading {
    #[serde(default, alias = "bodyTemp", alias = "objectTemp")]
    pub body_temp: Option<f64>,
    #[serde(default, alias = "ambientTemp")]
    pub ambient_temp: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

impl ThermalReading {
    pub fn new(body_temp: f64, ambient_temp: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            body_temp: Some(body_temp),
            ambient_temp: Some(ambient_temp),
            timestamp: Some(timestamp.into()),
        }
    }

    /// Validate into a sample, using `received_at` when no timestamp was sent.
    pub fn to_sample(&self, received_at: DateTime<Utc>) -> Result<ThermalSample, SampleRejection> {
        let body_temp = self
            .body_temp
            .ok_or(SampleRejection::MissingField("body_temp"))?;
        let ambient_temp = self
            .ambient_temp
            .ok_or(SampleRejection::MissingField("ambient_temp"))?;
        let timestamp = resolve(self.timestamp, received_at)?;
        ThermalSample::new(body_temp, ambient_temp, timestamp)
    }
}

impl TryFrom<ThermalReading> for ThermalSample {
    type Error = SampleRejection;

    fn try_from(reading: ThermalReading) -> Result<Self, Self::Error> {
        reading.to_sample(Utc::now())
    }
}

/// Unified reading type for mixed streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorReading {
    Cardiac(CardiacReading),
    Thermal(ThermalReading),
}

impl SensorReading {
    /// Get the reading timestamp, if one was sent.
    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            SensorReading::Cardiac(r) => r.timestamp,
            SensorReading::Thermal(r) => r.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_aliases_and_epoch_millis() {
        let json = r#"{"heartRate": 72, "SpO2": 98, "rrInterval": 830, "timestamp": 1714557600000}"#;
        let reading: CardiacReading = serde_json::from_str(json).unwrap();
        let sample = reading.to_sample(Utc::now()).unwrap();

        assert_eq!(sample.heart_rate, 72.0);
        assert_eq!(sample.rr_interval, 830.0);
        assert_eq!(
            sample.timestamp,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_rfc3339_timestamp() {
        let json = r#"{"body_temp": 36.6, "ambient_temp": 24.0, "timestamp": "2024-05-01T17:00:00Z"}"#;
        let reading: ThermalReading = serde_json::from_str(json).unwrap();
        let sample = reading.to_sample(Utc::now()).unwrap();
        assert_eq!(
            sample.timestamp,
            Utc.with_ymd_and_hms(2024, 5, 1, 17, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_timestamp_uses_arrival_time() {
        let arrival = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let reading = CardiacReading {
            heart_rate: Some(70.0),
            spo2: Some(97.0),
            ..Default::default()
        };
        assert_eq!(reading.to_sample(arrival).unwrap().timestamp, arrival);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let reading = CardiacReading {
            spo2: Some(97.0),
            ..Default::default()
        };
        assert_eq!(
            reading.to_sample(Utc::now()),
            Err(SampleRejection::MissingField("heart_rate"))
        );

        let reading = ThermalReading {
            body_temp: Some(36.5),
            ..Default::default()
        };
        assert_eq!(
            reading.to_sample(Utc::now()),
            Err(SampleRejection::MissingField("ambient_temp"))
        );
    }

    #[test]
    fn test_tagged_sensor_reading() {
        let json = r#"{"kind": "thermal", "bodyTemp": 36.4, "ambientTemp": 22.5}"#;
        let reading: SensorReading = serde_json::from_str(json).unwrap();
        assert!(matches!(reading, SensorReading::Thermal(_)));
        assert!(reading.timestamp().is_none());
    }
}
