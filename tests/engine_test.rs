//! End-to-end tests for the analytics engine

use chrono::{DateTime, Duration, TimeZone, Utc};
use mindpulse::core::assessment::{OverallLevel, RecommendationKind};
use mindpulse::core::hrv::HrvStatus;
use mindpulse::core::resilience::ResilienceStatus;
use mindpulse::core::stress::CardiacStressStatus;
use mindpulse::core::thermal::{
    AdaptationStatus, CircadianStatus, SleepQualityStatus, ThermalStressStatus,
};
use mindpulse::core::trend::DepressionRiskStatus;
use mindpulse::{CardiacReading, Engine, Ingest, ReplaySource, ThermalReading};
use std::io::Cursor;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

fn alternating_cardiac(engine: &mut Engine, count: i64) {
    for i in 0..count {
        let bpm = if i % 2 == 0 { 70.0 } else { 72.0 };
        let outcome =
            engine.add_cardiac_sample(CardiacReading::new(bpm, 98.0, start() + Duration::seconds(i)));
        assert!(outcome.is_accepted());
    }
}

#[test]
fn test_empty_engine_is_insufficient_everywhere() {
    let mut engine = Engine::default();
    let result = engine.full_analysis();

    assert!(result.timestamp.is_none());
    assert_eq!(result.cardiac.hrv.status, HrvStatus::InsufficientData);
    assert_eq!(
        result.cardiac.cardiac_stress.status,
        CardiacStressStatus::InsufficientData
    );
    assert_eq!(
        result.cardiac.depression_risk.status,
        DepressionRiskStatus::InsufficientData
    );
    assert_eq!(
        result.cardiac.resilience.status,
        ResilienceStatus::InsufficientData
    );
    assert_eq!(result.thermal.circadian.status, CircadianStatus::InsufficientData);
    assert_eq!(result.thermal.sleep.status, SleepQualityStatus::InsufficientData);
    assert_eq!(result.thermal.stress.status, ThermalStressStatus::InsufficientData);
    assert_eq!(
        result.thermal.adaptation.status,
        AdaptationStatus::InsufficientData
    );

    assert_eq!(result.overall_score, 100);
    assert_eq!(result.overall_level, OverallLevel::Excellent);
    assert!(result.issues.is_empty());
    assert_eq!(result.recommendations.len(), 1);
    assert_eq!(result.recommendations[0].kind, RecommendationKind::Success);
    assert!(!result.data_quality.cardiac_sufficient);
}

#[test]
fn test_full_analysis_is_idempotent() {
    let mut engine = Engine::default();
    alternating_cardiac(&mut engine, 30);
    engine.add_thermal_sample(ThermalReading::new(36.6, 24.0, start()));

    let first = engine.full_analysis();
    let second = engine.full_analysis();
    assert_eq!(first, second);
    assert_eq!(first, engine.analyze());
}

#[test]
fn test_steady_heart_rate_is_not_stress() {
    let mut engine = Engine::default();
    alternating_cardiac(&mut engine, 30);

    let result = engine.full_analysis();
    let stress = &result.cardiac.cardiac_stress;
    assert_eq!(stress.status, CardiacStressStatus::Normal);

    let metrics = stress.metrics.as_ref().unwrap();
    assert_eq!(metrics.avg_bpm, 71.0);
    assert!(metrics.is_stable);
    assert!(result.data_quality.cardiac_sufficient);

    // RR alternates 857.1 / 833.3 ms.
    let hrv = &result.cardiac.hrv;
    assert_eq!(hrv.status, HrvStatus::Moderate);
    assert_eq!(hrv.metrics.as_ref().unwrap().rmssd, 23.8);
}

#[test]
fn test_cardiac_window_is_bounded() {
    let mut engine = Engine::default();
    alternating_cardiac(&mut engine, 150);

    assert_eq!(engine.cardiac_window().len(), 100);
    assert_eq!(
        engine.reference_time(),
        Some(start() + Duration::seconds(149))
    );
}

#[test]
fn test_thermal_logging_is_throttled() {
    let mut engine = Engine::default();
    assert!(engine
        .add_thermal_sample(ThermalReading::new(36.6, 24.0, start()))
        .is_accepted());
    assert_eq!(
        engine.add_thermal_sample(ThermalReading::new(36.7, 24.0, start() + Duration::minutes(10))),
        Ingest::Throttled
    );
    assert!(engine
        .add_thermal_sample(ThermalReading::new(36.7, 24.0, start() + Duration::minutes(30)))
        .is_accepted());
    assert_eq!(engine.thermal_window().len(), 2);
}

#[test]
fn test_circadian_rhythm_from_evening_and_early_morning() {
    let mut engine = Engine::default();
    let evening = Utc.with_ymd_and_hms(2024, 5, 1, 17, 0, 0).unwrap();
    let early_morning = Utc.with_ymd_and_hms(2024, 5, 2, 4, 0, 0).unwrap();
    engine.add_thermal_sample(ThermalReading::new(37.0, 24.0, evening));
    engine.add_thermal_sample(ThermalReading::new(36.3, 22.0, early_morning));

    let result = engine.full_analysis();
    assert_eq!(result.thermal.circadian.status, CircadianStatus::Normal);
    let metrics = result.thermal.circadian.metrics.as_ref().unwrap();
    assert!((metrics.difference - 0.7).abs() < 1e-9);
}

#[test]
fn test_state_round_trip_reproduces_analysis() {
    let mut engine = Engine::default();
    alternating_cardiac(&mut engine, 40);
    for (i, body) in [36.4, 36.5, 36.7, 36.6, 36.8, 36.5].into_iter().enumerate() {
        engine.add_thermal_sample(ThermalReading::new(
            body,
            23.0,
            start() + Duration::minutes(30 * i as i64),
        ));
    }
    let expected = engine.full_analysis();

    let json = engine.export_state().to_json().unwrap();
    let state = mindpulse::EngineState::from_json(&json).unwrap();
    let mut restored = Engine::default();
    restored.import_state(state);

    assert_eq!(restored.instance_id(), engine.instance_id());
    assert_eq!(restored.cardiac_baseline(), engine.cardiac_baseline());
    assert_eq!(restored.analyze(), expected);
    assert_eq!(restored.full_analysis(), expected);
}

#[test]
fn test_replayed_session_feeds_engine() {
    let base_ms = start().timestamp_millis();
    let mut session = String::new();
    for i in 0..30 {
        let bpm = if i % 2 == 0 { 70 } else { 72 };
        session.push_str(&format!(
            "{{\"kind\":\"cardiac\",\"heartRate\":{bpm},\"SpO2\":98,\"timestamp\":{}}}\n",
            base_ms + i * 1000
        ));
    }
    session.push_str("{\"kind\":\"thermal\",\"bodyTemp\":36.6,\"ambientTemp\":24.0}\n");
    session.push_str("{\"kind\":\"cardiac\",\"heartRate\":\"fast\"}\n");

    let mut source = ReplaySource::new(Cursor::new(session.into_bytes()));
    source.start().unwrap();

    let mut engine = Engine::default();
    let mut accepted = 0;
    for reading in source.receiver().iter() {
        let outcome = match reading {
            mindpulse::SensorReading::Cardiac(r) => engine.add_cardiac_sample(r),
            mindpulse::SensorReading::Thermal(r) => engine.add_thermal_sample(r),
        };
        if outcome.is_accepted() {
            accepted += 1;
        }
    }
    source.stop();

    assert_eq!(accepted, 31);
    assert_eq!(source.malformed_lines(), 1);
    assert!(engine.cardiac_baseline().is_some());
    assert_eq!(engine.thermal_window().len(), 1);
    assert_eq!(
        engine.full_analysis().cardiac.cardiac_stress.status,
        CardiacStressStatus::Normal
    );
}
