use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::BiometricError;
use crate::observability::LogConfig;

/// Parameters for one phonocardiogram capture session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Requested capture rate in Hz. Cardiac sounds sit well below 2 kHz.
    pub sample_rate: u32,
    /// Filtered samples examined per analysis tick at `sample_rate`.
    /// Scaled by [`analysis_window_for_rate`](Self::analysis_window_for_rate)
    /// when the device opens at another rate.
    pub analysis_frame_len: usize,
    /// Points per transmitted waveform
    pub waveform_len: usize,
    /// Minimum spacing between transmitted frames
    pub send_interval_ms: u64,
    pub highpass_hz: f32,
    pub lowpass_hz: f32,
    pub q: f32,
    /// Peak amplitude in normalized units that counts as a beat
    pub peak_threshold: f32,
    pub refractory_ms: u64,
    pub min_bpm: u32,
    pub max_bpm: u32,
    /// Capacity of the rolling bpm window
    pub window_capacity: usize,
    /// Outbound frames buffered between the analysis loop and the transport
    pub queue_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 4000,
            analysis_frame_len: 256,
            waveform_len: 128,
            send_interval_ms: 100,
            highpass_hz: 20.0,
            lowpass_hz: 200.0,
            q: 0.7,
            peak_threshold: 0.3,
            refractory_ms: 300,
            min_bpm: 40,
            max_bpm: 200,
            window_capacity: 10,
            queue_capacity: 32,
        }
    }
}

impl CaptureConfig {
    /// Analysis window length at `opened_rate`, keeping the same time span
    /// as `analysis_frame_len` samples at `sample_rate` (64 ms by default).
    pub fn analysis_window_for_rate(&self, opened_rate: u32) -> usize {
        if self.sample_rate == 0 || opened_rate == self.sample_rate {
            return self.analysis_frame_len.max(1);
        }
        let scaled = (self.analysis_frame_len as u64 * opened_rate as u64
            + self.sample_rate as u64 / 2)
            / self.sample_rate as u64;
        (scaled as usize).max(1)
    }

    /// Check the parameters against a concrete sample rate.
    ///
    /// Sources may not honour the requested rate, so the filter band is
    /// validated against whatever rate the device actually opened at.
    pub fn validate_for_rate(&self, sample_rate: u32) -> std::result::Result<(), BiometricError> {
        if sample_rate == 0 {
            return Err(BiometricError::InvalidConfig("sample rate must be non-zero".into()));
        }
        let nyquist = sample_rate as f32 / 2.0;
        if self.highpass_hz <= 0.0 || self.lowpass_hz >= nyquist {
            return Err(BiometricError::InvalidConfig(format!(
                "band {}-{} Hz does not fit below Nyquist ({} Hz)",
                self.highpass_hz, self.lowpass_hz, nyquist
            )));
        }
        if self.highpass_hz >= self.lowpass_hz {
            return Err(BiometricError::InvalidConfig(format!(
                "high-pass cutoff {} Hz must be below low-pass cutoff {} Hz",
                self.highpass_hz, self.lowpass_hz
            )));
        }
        if self.q <= 0.0 {
            return Err(BiometricError::InvalidConfig("Q must be positive".into()));
        }
        if self.analysis_frame_len == 0 || self.waveform_len == 0 {
            return Err(BiometricError::InvalidConfig(
                "analysis frame and waveform lengths must be non-zero".into(),
            ));
        }
        if self.window_capacity == 0 || self.queue_capacity == 0 {
            return Err(BiometricError::InvalidConfig(
                "window and queue capacities must be non-zero".into(),
            ));
        }
        if self.min_bpm == 0 || self.min_bpm > self.max_bpm {
            return Err(BiometricError::InvalidConfig(format!(
                "invalid bpm range [{}, {}]",
                self.min_bpm, self.max_bpm
            )));
        }
        Ok(())
    }
}

/// Gating applied to body-composition scale notifications.
///
/// The thresholds are empirical and exposed so deployments can tune them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Drop the first notification after subscribing (firmware replays a cached value)
    pub discard_first_notification: bool,
    /// Readings earlier than this after subscription are ignored
    pub settle_ms: u64,
    /// Impedance at or below this means nobody is standing on the scale
    pub min_impedance_ohm: u16,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            discard_first_notification: true,
            settle_ms: 15_000,
            min_impedance_ohm: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiometricsConfig {
    pub capture: CaptureConfig,
    pub scale: ScaleConfig,
    pub log: LogConfig,
}

impl BiometricsConfig {
    pub fn from_value(value: Value) -> Result<Self> {
        let config: Self =
            serde_json::from_value(value).context("Failed to parse biometrics config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse biometrics config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .context(format!("Failed to read config from {:?}", path))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> std::result::Result<(), BiometricError> {
        self.capture.validate_for_rate(self.capture.sample_rate)
    }
}
