use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::CaptureConfig;
use crate::core::AudioFrame;
use crate::dsp::{
    detect_heart_sounds, downsample_into, BandPassFilter, HeartRateEstimator, SampleBuffer,
};
use crate::error::Result;

/// Milliseconds since the Unix epoch, 0 if the clock is before it.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Per-capture analysis state: filter delay lines, the rolling analysis
/// window and the heart-rate window.
///
/// Owned by exactly one capture loop. Time is measured on the audio
/// stream itself (`origin + samples / rate`), so analysis is unaffected by
/// scheduling jitter and replays deterministically.
#[derive(Debug)]
pub struct CaptureSession {
    consultation_id: String,
    sample_rate: u32,
    waveform_len: usize,
    filter: BandPassFilter,
    window: SampleBuffer,
    estimator: HeartRateEstimator,
    origin_ms: u64,
    samples_seen: u64,
    scratch: Vec<f32>,
    waveform: Vec<f32>,
}

impl CaptureSession {
    pub fn new(
        consultation_id: impl Into<String>,
        sample_rate: u32,
        config: &CaptureConfig,
        origin_ms: u64,
    ) -> Result<Self> {
        let filter = BandPassFilter::new(sample_rate, config)?;
        let window_len = config.analysis_window_for_rate(sample_rate);

        Ok(Self {
            consultation_id: consultation_id.into(),
            sample_rate,
            waveform_len: config.waveform_len,
            filter,
            window: SampleBuffer::new(window_len),
            estimator: HeartRateEstimator::new(config),
            origin_ms,
            samples_seen: 0,
            scratch: Vec::with_capacity(window_len),
            waveform: Vec::with_capacity(config.waveform_len),
        })
    }

    pub fn consultation_id(&self) -> &str {
        &self.consultation_id
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples in the analysis window at the opened rate
    pub fn window_len(&self) -> usize {
        self.window.capacity()
    }

    /// Time covered by the analysis window, in milliseconds.
    pub fn window_span_ms(&self) -> f64 {
        self.window.capacity() as f64 * 1000.0 / self.sample_rate as f64
    }

    /// Band-pass raw samples into the analysis window.
    pub fn push_samples(&mut self, raw: &[f32]) {
        for &sample in raw {
            let filtered = self.filter.process(sample);
            self.window.push(filtered);
        }
        self.samples_seen += raw.len() as u64;
    }

    /// Stream position of the newest sample, in epoch milliseconds.
    pub fn stream_time_ms(&self) -> u64 {
        self.origin_ms + self.samples_seen * 1000 / self.sample_rate as u64
    }

    /// Analyse the current window at the current stream time.
    pub fn analyze(&mut self) -> AudioFrame {
        let now_ms = self.stream_time_ms();
        self.analyze_at(now_ms)
    }

    /// Analyse the current window as if observed at `now_ms`.
    pub fn analyze_at(&mut self, now_ms: u64) -> AudioFrame {
        self.window.copy_ordered(&mut self.scratch);

        let sounds = detect_heart_sounds(&self.scratch);
        let heart_rate = self.estimator.update(&self.scratch, now_ms);
        downsample_into(&self.scratch, self.waveform_len, &mut self.waveform);

        AudioFrame::new(now_ms, self.waveform.clone(), heart_rate, sounds.s1, sounds.s2)
    }

    pub fn heart_rate(&self) -> u32 {
        self.estimator.estimate()
    }

    pub fn estimator(&self) -> &HeartRateEstimator {
        &self.estimator
    }

    /// Drop all per-session history, keeping the filter coefficients.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.window.clear();
        self.estimator.reset();
        self.samples_seen = 0;
    }
}
