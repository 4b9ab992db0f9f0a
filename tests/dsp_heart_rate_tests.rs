use vitalstream::config::CaptureConfig;
use vitalstream::dsp::{EstimatorState, HeartRateEstimator, PeakOutcome};

const BEAT: [f32; 3] = [0.0, 0.5, -0.1];
const QUIET: [f32; 3] = [0.0, 0.1, -0.1];

fn estimator() -> HeartRateEstimator {
    HeartRateEstimator::new(&CaptureConfig::default())
}

#[test]
fn test_no_estimate_before_two_peaks() {
    let mut est = estimator();
    assert_eq!(est.update(&QUIET, 0), 0);
    assert_eq!(est.state(), EstimatorState::Idle);

    assert_eq!(est.update(&BEAT, 100), 0);
    assert_eq!(est.last_outcome(), PeakOutcome::FirstPeak);
    assert_eq!(est.state(), EstimatorState::Tracking { last_peak_ms: 100 });
}

#[test]
fn test_threshold_is_exclusive() {
    let mut est = estimator();
    est.update(&[0.3], 0);
    assert_eq!(est.last_outcome(), PeakOutcome::NoPeak);
    assert_eq!(est.state(), EstimatorState::Idle);
}

#[test]
fn test_converges_to_interval_rate() {
    let mut est = estimator();
    let mut now = 0;
    for _ in 0..12 {
        est.update(&BEAT, now);
        now += 857;
    }
    // 60000 / 857 = 70.01
    assert_eq!(est.estimate(), 70);
    assert!(est.window().all(|bpm| bpm == 70));
}

#[test]
fn test_refractory_period_ignores_echo() {
    let mut est = estimator();
    est.update(&BEAT, 1_000);
    est.update(&BEAT, 1_300);
    assert_eq!(est.last_outcome(), PeakOutcome::NoPeak);
    assert_eq!(est.state(), EstimatorState::Tracking { last_peak_ms: 1_000 });

    assert_eq!(est.update(&BEAT, 2_000), 60);
    assert_eq!(est.last_outcome(), PeakOutcome::Accepted(60));
}

#[test]
fn test_out_of_range_still_restarts_timing() {
    let mut est = estimator();
    est.update(&BEAT, 0);
    est.update(&BEAT, 2_000);
    assert_eq!(est.last_outcome(), PeakOutcome::OutOfRange(30));
    assert_eq!(est.window_len(), 0);
    assert_eq!(est.state(), EstimatorState::Tracking { last_peak_ms: 2_000 });

    // Measured from the rejected peak, not the first one
    est.update(&BEAT, 3_000);
    assert_eq!(est.last_outcome(), PeakOutcome::Accepted(60));
}

#[test]
fn test_too_fast_rate_rejected() {
    let config = CaptureConfig {
        refractory_ms: 100,
        ..CaptureConfig::default()
    };
    let mut est = HeartRateEstimator::new(&config);
    est.update(&BEAT, 0);
    est.update(&BEAT, 200);
    assert_eq!(est.last_outcome(), PeakOutcome::OutOfRange(300));
    assert_eq!(est.estimate(), 0);
}

#[test]
fn test_window_bounded_and_in_range() {
    let mut est = estimator();
    let intervals = [400u64, 500, 600, 700, 800, 900, 1000, 1100, 1200, 1300, 1400, 2500];
    let mut now = 0;
    est.update(&BEAT, now);
    for _ in 0..3 {
        for interval in intervals {
            now += interval;
            est.update(&BEAT, now);
            assert!(est.window_len() <= 10);
            assert!(est.window().all(|bpm| (40..=200).contains(&bpm)));
        }
    }
    assert_eq!(est.window_len(), 10);
}

#[test]
fn test_oldest_value_evicted_first() {
    let mut est = estimator();
    est.update(&BEAT, 0);
    // one beat at 120 bpm, then ten at 60 bpm
    est.update(&BEAT, 500);
    let mut now = 500;
    for _ in 0..10 {
        now += 1_000;
        est.update(&BEAT, now);
    }
    assert_eq!(est.window().collect::<Vec<_>>(), vec![60; 10]);
    assert_eq!(est.estimate(), 60);
}

#[test]
fn test_reset_returns_to_idle() {
    let mut est = estimator();
    est.update(&BEAT, 0);
    est.update(&BEAT, 1_000);
    assert_eq!(est.estimate(), 60);

    est.reset();
    assert_eq!(est.estimate(), 0);
    assert_eq!(est.state(), EstimatorState::Idle);
    assert_eq!(est.window_len(), 0);
}
