use std::collections::VecDeque;

use crate::config::CaptureConfig;
use crate::dsp::detector::peak_amplitude;

/// Whether a prior beat has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorState {
    Idle,
    Tracking { last_peak_ms: u64 },
}

/// What a single frame did to the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakOutcome {
    /// Below threshold or inside the refractory period
    NoPeak,
    /// First beat since reset; timing starts here
    FirstPeak,
    /// Interval produced an in-range bpm that entered the window
    Accepted(u32),
    /// Interval produced a bpm outside the physiological range.
    /// Timing still restarts from this peak.
    OutOfRange(u32),
}

/// Inter-peak bpm estimator with a refractory gate and a bounded
/// rolling window.
///
/// Every stored value lies in `[min_bpm, max_bpm]`, and the window never
/// exceeds its capacity (oldest evicted first).
#[derive(Debug, Clone)]
pub struct HeartRateEstimator {
    threshold: f32,
    refractory_ms: u64,
    min_bpm: u32,
    max_bpm: u32,
    capacity: usize,
    window: VecDeque<u32>,
    state: EstimatorState,
    last_outcome: PeakOutcome,
}

impl HeartRateEstimator {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            threshold: config.peak_threshold,
            refractory_ms: config.refractory_ms,
            min_bpm: config.min_bpm,
            max_bpm: config.max_bpm,
            capacity: config.window_capacity,
            window: VecDeque::with_capacity(config.window_capacity),
            state: EstimatorState::Idle,
            last_outcome: PeakOutcome::NoPeak,
        }
    }

    /// Feed one filtered analysis frame observed at `now_ms` and return the
    /// current estimate.
    pub fn update(&mut self, frame: &[f32], now_ms: u64) -> u32 {
        self.last_outcome = self.observe(peak_amplitude(frame), now_ms);
        self.estimate()
    }

    fn observe(&mut self, peak: f32, now_ms: u64) -> PeakOutcome {
        if peak <= self.threshold {
            return PeakOutcome::NoPeak;
        }

        let outcome = match self.state {
            EstimatorState::Idle => PeakOutcome::FirstPeak,
            EstimatorState::Tracking { last_peak_ms } => {
                let interval_ms = now_ms.saturating_sub(last_peak_ms);
                if interval_ms <= self.refractory_ms {
                    return PeakOutcome::NoPeak;
                }

                let bpm = (60_000.0 / interval_ms as f64).round() as u32;
                if (self.min_bpm..=self.max_bpm).contains(&bpm) {
                    self.window.push_back(bpm);
                    while self.window.len() > self.capacity {
                        self.window.pop_front();
                    }
                    PeakOutcome::Accepted(bpm)
                } else {
                    PeakOutcome::OutOfRange(bpm)
                }
            }
        };

        self.state = EstimatorState::Tracking { last_peak_ms: now_ms };
        outcome
    }

    /// Rounded mean of the window, 0 when empty.
    pub fn estimate(&self) -> u32 {
        if self.window.is_empty() {
            return 0;
        }
        let sum: u32 = self.window.iter().sum();
        (sum as f64 / self.window.len() as f64).round() as u32
    }

    pub fn state(&self) -> EstimatorState {
        self.state
    }

    pub fn last_outcome(&self) -> PeakOutcome {
        self.last_outcome
    }

    pub fn window(&self) -> impl Iterator<Item = u32> + '_ {
        self.window.iter().copied()
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.state = EstimatorState::Idle;
        self.last_outcome = PeakOutcome::NoPeak;
    }
}
