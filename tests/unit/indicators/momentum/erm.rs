//! Unit tests for the ERM reversal detector

use chrono::{DateTime, TimeZone, Utc};
use propsizer::config::EngineConfig;
use propsizer::indicators::momentum::{
    erm_score, is_triggered, momentum_velocity, ErmReason, ReversalMomentumDetector,
};
use propsizer::models::{Direction, PriceTick, SignalEvent};

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
}

fn detector_with(ticks: &[(i64, f64)]) -> ReversalMomentumDetector {
    let mut detector = ReversalMomentumDetector::from_config(&EngineConfig::default());
    for &(t, price) in ticks {
        detector.record(&PriceTick::new("ES", price, at(t)));
    }
    detector
}

#[test]
fn test_formula_components() {
    assert_eq!(momentum_velocity(4098.0, 4100.0, 1.0), -2.0);
    assert_eq!(erm_score(4098.0, 4100.0, -2.0), 4.0);
    assert!(is_triggered(Direction::Long, 4.1, 4.0));
    assert!(!is_triggered(Direction::Long, 4.0, 4.0));
    assert!(is_triggered(Direction::Short, -4.1, 4.0));
    assert!(!is_triggered(Direction::Short, -4.0, 4.0));
}

#[test]
fn test_threshold_equality_does_not_trigger() {
    // P_current=4098, E=4100, P_n=4100 one minute earlier -> ERM=4.0
    let detector = detector_with(&[(0, 4100.0), (60, 4098.0)]);
    let signal = SignalEvent::new("ES", 4100.0, Direction::Long, at(-30));

    // ATR=8, multiplier=0.5 -> threshold 4.0
    let result = detector.evaluate(&signal, Some(8.0));
    assert_eq!(result.reason, ErmReason::Ok);
    assert_eq!(result.momentum_velocity, -2.0);
    assert_eq!(result.erm_value, 4.0);
    assert_eq!(result.threshold, Some(4.0));
    assert!(!result.triggered);
}

#[test]
fn test_long_triggers_above_threshold() {
    let detector = detector_with(&[(0, 4100.0), (60, 4098.0)]);
    let signal = SignalEvent::new("ES", 4100.0, Direction::Long, at(-30));

    let result = detector.evaluate(&signal, Some(7.9));
    assert!(result.triggered);
    assert_eq!(result.reason, ErmReason::Ok);
}

#[test]
fn test_short_triggers_below_negative_threshold() {
    // P - E = +2, velocity = -2 -> ERM = -4
    let detector = detector_with(&[(0, 4100.0), (60, 4098.0)]);
    let signal = SignalEvent::new("ES", 4096.0, Direction::Short, at(-30));

    let result = detector.evaluate(&signal, Some(7.0));
    assert_eq!(result.erm_value, -4.0);
    assert!(result.triggered);

    let long = SignalEvent::new("ES", 4096.0, Direction::Long, at(-30));
    assert!(!detector.evaluate(&long, Some(7.0)).triggered);
}

#[test]
fn test_elapsed_time_uses_actual_sample_age() {
    // lookback target is t=30, newest sample at or before is t=0 -> 1.5 minutes
    let detector = detector_with(&[(0, 4100.0), (90, 4097.0)]);
    let signal = SignalEvent::new("ES", 4100.0, Direction::Long, at(0));

    let result = detector.evaluate(&signal, Some(8.0));
    assert_eq!(result.momentum_velocity, -2.0);
    assert_eq!(result.erm_value, 6.0);
    assert!(result.triggered);
}

#[test]
fn test_expired_signal() {
    let detector = detector_with(&[(0, 4100.0), (60, 4098.0)]);
    let signal = SignalEvent::new("ES", 4100.0, Direction::Long, at(-300));

    let result = detector.evaluate(&signal, Some(8.0));
    assert_eq!(result.reason, ErmReason::Expired);
    assert!(result.is_expired());
    assert!(!result.triggered);
}

#[test]
fn test_signal_too_young_is_insufficient() {
    let detector = detector_with(&[(0, 4100.0), (60, 4098.0)]);
    let signal = SignalEvent::new("ES", 4100.0, Direction::Long, at(40));

    let result = detector.evaluate(&signal, Some(8.0));
    assert_eq!(result.reason, ErmReason::InsufficientHistory);
    assert!(!result.triggered);
}

#[test]
fn test_missing_lookback_sample_is_insufficient() {
    let detector = detector_with(&[(0, 4100.0), (30, 4090.0)]);
    let signal = SignalEvent::new("ES", 4100.0, Direction::Long, at(-10));

    let result = detector.evaluate(&signal, Some(8.0));
    assert_eq!(result.reason, ErmReason::InsufficientHistory);
    assert_eq!(result.erm_value, 0.0);
}

#[test]
fn test_no_ticks_is_insufficient() {
    let detector = detector_with(&[]);
    let signal = SignalEvent::new("ES", 4100.0, Direction::Long, at(0));
    assert_eq!(
        detector.evaluate(&signal, Some(8.0)).reason,
        ErmReason::InsufficientHistory
    );
}

#[test]
fn test_missing_atr_reports_score_without_trigger() {
    let detector = detector_with(&[(0, 4100.0), (60, 4090.0)]);
    let signal = SignalEvent::new("ES", 4100.0, Direction::Long, at(-30));

    for atr in [None, Some(0.0), Some(f64::NAN)] {
        let result = detector.evaluate(&signal, atr);
        assert_eq!(result.reason, ErmReason::InsufficientHistory);
        assert_eq!(result.erm_value, 100.0);
        assert!(result.threshold.is_none());
        assert!(!result.triggered);
    }
}

#[test]
fn test_lookback_equal_to_window_keeps_evaluating() {
    let mut config = EngineConfig::default();
    config.reversal.lookback_seconds = config.history.window_seconds;
    assert!(config.validate().is_ok());

    let mut detector = ReversalMomentumDetector::from_config(&config);
    let signal = SignalEvent::new("ES", 4100.0, Direction::Long, at(0));

    // Ticks every 7s never land on the lookback target exactly
    let mut evaluated = 0;
    for t in (0..=290i64).step_by(7) {
        detector.record(&PriceTick::new("ES", 4100.0 - (t / 7) as f64, at(t)));
        let result = detector.evaluate(&signal, Some(8.0));
        if t >= 126 {
            assert_eq!(result.reason, ErmReason::Ok, "t={}", t);
            evaluated += 1;
        }
    }
    assert_eq!(evaluated, 24);
}
