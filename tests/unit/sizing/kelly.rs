//! Unit tests for the Kelly position sizer

use chrono::{DateTime, TimeZone, Utc};
use propsizer::config::KellyConfig;
use propsizer::models::TradeOutcome;
use propsizer::sizing::{cap_fraction, kelly_fraction, KellyPositionSizer};
use propsizer::EngineError;

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
}

fn sizer_with(config: KellyConfig, wins: usize, win: f64, losses: usize, loss: f64) -> KellyPositionSizer {
    let mut sizer = KellyPositionSizer::new(config);
    let mut t = 0;
    for _ in 0..wins {
        sizer.record_outcome(TradeOutcome::win(win, at(t)));
        t += 1;
    }
    for _ in 0..losses {
        sizer.record_outcome(TradeOutcome::loss(loss, at(t)));
        t += 1;
    }
    sizer
}

fn config(risk_adjustment: f64, max_kelly_fraction: f64) -> KellyConfig {
    KellyConfig {
        risk_adjustment,
        max_kelly_fraction,
        ..KellyConfig::default()
    }
}

#[test]
fn test_undefined_below_min_sample_size() {
    let sizer = sizer_with(KellyConfig::default(), 3, 100.0, 1, 50.0);
    assert_eq!(
        sizer.calculate_kelly(),
        Err(EngineError::InsufficientSampleSize { have: 4, need: 5 })
    );
    assert!(sizer.win_rate().is_err());
}

#[test]
fn test_reference_example() {
    // win_rate=0.6, avg_win=200, avg_loss=100 -> b=2, kelly=0.4, *0.3 = 0.12
    let sizer = sizer_with(config(0.3, 0.15), 12, 200.0, 8, 100.0);
    let result = sizer.calculate_kelly().unwrap();

    assert!((result.basis.win_rate - 0.6).abs() < 1e-12);
    assert_eq!(result.basis.avg_win, 200.0);
    assert_eq!(result.basis.avg_loss, 100.0);
    assert_eq!(result.basis.n, 20);
    assert!((result.fraction - 0.4).abs() < 1e-9);
    assert!((result.capped_fraction - 0.12).abs() < 1e-9);
}

#[test]
fn test_cap_applies() {
    let sizer = sizer_with(config(0.5, 0.15), 12, 200.0, 8, 100.0);
    let result = sizer.calculate_kelly().unwrap();
    assert_eq!(result.capped_fraction, 0.15);
}

#[test]
fn test_negative_edge_clamps_to_zero() {
    let sizer = sizer_with(KellyConfig::default(), 2, 100.0, 8, 100.0);
    let result = sizer.calculate_kelly().unwrap();
    assert!(result.fraction < 0.0);
    assert_eq!(result.capped_fraction, 0.0);
}

#[test]
fn test_all_losses_has_no_edge() {
    let sizer = sizer_with(KellyConfig::default(), 0, 0.0, 6, 100.0);
    let result = sizer.calculate_kelly().unwrap();
    assert_eq!(result.basis.win_rate, 0.0);
    assert_eq!(result.capped_fraction, 0.0);
}

#[test]
fn test_perfect_record_without_losses_returns_cap() {
    let sizer = sizer_with(config(0.3, 0.2), 6, 150.0, 0, 0.0);
    let result = sizer.calculate_kelly().unwrap();
    assert_eq!(result.basis.win_rate, 1.0);
    assert_eq!(result.capped_fraction, 0.2);
}

#[test]
fn test_zero_sized_losses_are_undefined() {
    let sizer = sizer_with(KellyConfig::default(), 4, 150.0, 2, 0.0);
    assert_eq!(sizer.calculate_kelly(), Err(EngineError::ZeroAverageLoss));
}

#[test]
fn test_loss_amounts_are_magnitudes() {
    let sizer = sizer_with(config(0.3, 0.15), 12, 200.0, 8, -100.0);
    let result = sizer.calculate_kelly().unwrap();
    assert_eq!(result.basis.avg_loss, 100.0);
}

#[test]
fn test_window_is_fifo() {
    let window = KellyConfig {
        sample_window: 5,
        min_sample_size: 5,
        ..KellyConfig::default()
    };
    let mut sizer = sizer_with(window, 0, 0.0, 5, 100.0);
    assert_eq!(sizer.win_rate().unwrap(), 0.0);

    for t in 0..5 {
        sizer.record_outcome(TradeOutcome::win(100.0, at(100 + t)));
    }
    assert_eq!(sizer.len(), 5);
    assert_eq!(sizer.win_rate().unwrap(), 1.0);
    assert!(sizer.outcomes().all(|o| o.won));
}

#[test]
fn test_pure_helpers() {
    assert_eq!(kelly_fraction(0.6, 200.0, 0.0), None);
    assert_eq!(kelly_fraction(0.6, 0.0, 100.0), Some(0.0));
    assert!((kelly_fraction(0.5, 100.0, 100.0).unwrap()).abs() < 1e-12);
    assert_eq!(cap_fraction(-0.3, 0.5, 0.2), 0.0);
    assert_eq!(cap_fraction(1.0, 0.5, 0.2), 0.2);
    assert_eq!(cap_fraction(f64::NAN, 0.5, 0.2), 0.0);
}
