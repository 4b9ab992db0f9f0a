use serde::{Deserialize, Serialize};

/// Compact phonocardiogram frame sent to the remote side (~10 per second).
///
/// Built once by the capture session and never mutated afterwards; the
/// fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFrame {
    /// Wall-clock milliseconds since the Unix epoch
    timestamp: u64,
    /// Band-passed, decimated waveform, 3 decimal places
    waveform: Vec<f32>,
    /// Rolling bpm estimate, 0 while unknown
    heart_rate: u32,
    s1_amplitude: f32,
    s2_amplitude: f32,
}

impl AudioFrame {
    /// Build a frame, rounding the waveform to 3 decimals and the
    /// amplitudes to 2 so the serialized form stays small.
    pub fn new(
        timestamp: u64,
        waveform: Vec<f32>,
        heart_rate: u32,
        s1_amplitude: f32,
        s2_amplitude: f32,
    ) -> Self {
        let waveform = waveform.into_iter().map(|v| round_to(v, 1000.0)).collect();
        Self {
            timestamp,
            waveform,
            heart_rate,
            s1_amplitude: round_to(s1_amplitude, 100.0),
            s2_amplitude: round_to(s2_amplitude, 100.0),
        }
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn waveform(&self) -> &[f32] {
        &self.waveform
    }

    pub fn heart_rate(&self) -> u32 {
        self.heart_rate
    }

    pub fn s1_amplitude(&self) -> f32 {
        self.s1_amplitude
    }

    pub fn s2_amplitude(&self) -> f32 {
        self.s2_amplitude
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode a frame received from the remote participant
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

fn round_to(value: f32, scale: f32) -> f32 {
    (value * scale).round() / scale
}
