use crate::error::BiometricError;
use crate::hal::{AudioSource, DeviceState};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::f32::consts::PI;
use std::time::Duration;

/// S1 burst length in seconds
const S1_DURATION: f32 = 0.04;
const S1_FREQUENCY: f32 = 50.0;
/// S2 burst length in seconds
const S2_DURATION: f32 = 0.03;
const S2_FREQUENCY: f32 = 70.0;
/// S2 onset as a fraction of the beat period
const S2_OFFSET: f32 = 0.3;

/// Synthetic phonocardiogram: a "lub-dub" pair of windowed tone bursts
/// repeated at a fixed heart rate.
///
/// S2 is kept quieter than the default peak threshold so only S1 drives
/// the rate estimate.
pub struct SimulatedHeartbeatSource {
    state: DeviceState,
    bpm: f32,
    amplitude: f32,
    s2_ratio: f32,
    chunk_len: usize,
    sample_rate: u32,
    /// Stop after this many samples; `None` streams forever
    total_samples: Option<u64>,
    /// Sleep for each chunk's duration to mimic a live device
    paced: bool,
    position: u64,
}

impl SimulatedHeartbeatSource {
    pub fn new(bpm: f32) -> Self {
        Self {
            state: DeviceState::Unopened,
            bpm,
            amplitude: 0.8,
            s2_ratio: 0.25,
            chunk_len: 64,
            sample_rate: 4000,
            total_samples: None,
            paced: false,
            position: 0,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_chunk_len(mut self, chunk_len: usize) -> Self {
        self.chunk_len = chunk_len.max(1);
        self
    }

    pub fn with_duration_secs(mut self, secs: f32) -> Self {
        self.total_samples = Some((secs * self.sample_rate as f32) as u64);
        self
    }

    pub fn paced(mut self, paced: bool) -> Self {
        self.paced = paced;
        self
    }

    /// Apply overrides from a JSON object: `bpm`, `amplitude`,
    /// `chunk_len`, `duration_secs`, `paced`.
    pub fn configure(&mut self, config: Value) -> Result<()> {
        if self.state != DeviceState::Unopened {
            return Err(anyhow!("Cannot configure device in state {:?}", self.state));
        }

        if let Some(bpm) = config["bpm"].as_f64() {
            self.bpm = bpm as f32;
        }
        if let Some(amp) = config["amplitude"].as_f64() {
            self.amplitude = amp as f32;
        }
        if let Some(len) = config["chunk_len"].as_u64() {
            self.chunk_len = (len as usize).max(1);
        }
        if let Some(secs) = config["duration_secs"].as_f64() {
            self.total_samples = Some((secs * self.sample_rate as f64) as u64);
        }
        if let Some(paced) = config["paced"].as_bool() {
            self.paced = paced;
        }
        Ok(())
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    fn sample_at(&self, index: u64) -> f32 {
        if self.bpm <= 0.0 {
            return 0.0;
        }
        let t = index as f64 / self.sample_rate as f64;
        let period = 60.0 / self.bpm as f64;
        let phase = (t % period) as f32;
        let period = period as f32;

        let s1 = burst(phase, S1_DURATION, S1_FREQUENCY);
        let s2 = burst(phase - S2_OFFSET * period, S2_DURATION, S2_FREQUENCY);
        self.amplitude * (s1 + self.s2_ratio * s2)
    }
}

/// Hann-windowed sine burst starting at `t = 0`
fn burst(t: f32, duration: f32, frequency: f32) -> f32 {
    if !(0.0..duration).contains(&t) {
        return 0.0;
    }
    let window = 0.5 - 0.5 * (2.0 * PI * t / duration).cos();
    window * (2.0 * PI * frequency * t).sin()
}

#[async_trait]
impl AudioSource for SimulatedHeartbeatSource {
    fn name(&self) -> &str {
        "simulated-heartbeat"
    }

    async fn open(&mut self, requested_rate: u32) -> std::result::Result<u32, BiometricError> {
        if self.state != DeviceState::Unopened {
            return Err(BiometricError::DeviceUnavailable(format!(
                "simulated source already {:?}",
                self.state
            )));
        }
        if requested_rate == 0 {
            return Err(BiometricError::InvalidConfig("sample rate must be non-zero".into()));
        }
        // Rescale a configured duration to the negotiated rate.
        if let Some(total) = self.total_samples {
            self.total_samples = Some(total * requested_rate as u64 / self.sample_rate as u64);
        }
        self.sample_rate = requested_rate;
        self.position = 0;
        self.state = DeviceState::Running;
        Ok(requested_rate)
    }

    async fn read_chunk(&mut self) -> Result<Option<Vec<f32>>> {
        if self.state != DeviceState::Running {
            return Err(anyhow!("Device not running"));
        }

        let remaining = match self.total_samples {
            Some(total) if self.position >= total => return Ok(None),
            Some(total) => (total - self.position).min(self.chunk_len as u64) as usize,
            None => self.chunk_len,
        };

        if self.paced {
            let secs = remaining as f64 / self.sample_rate as f64;
            tokio::time::sleep(Duration::from_secs_f64(secs)).await;
        }

        let start = self.position;
        let chunk = (0..remaining as u64).map(|i| self.sample_at(start + i)).collect();
        self.position += remaining as u64;
        Ok(Some(chunk))
    }

    async fn close(&mut self) -> Result<()> {
        self.state = DeviceState::Closed;
        Ok(())
    }
}

/// Stand-in for hosts without an audio stack: `open` always fails.
pub struct UnavailableAudioSource {
    error: BiometricError,
}

impl UnavailableAudioSource {
    pub fn permission_denied() -> Self {
        Self {
            error: BiometricError::PermissionDenied("microphone access refused".to_string()),
        }
    }

    pub fn no_device() -> Self {
        Self {
            error: BiometricError::DeviceUnavailable("no audio input on this host".to_string()),
        }
    }
}

#[async_trait]
impl AudioSource for UnavailableAudioSource {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn open(&mut self, _requested_rate: u32) -> std::result::Result<u32, BiometricError> {
        Err(self.error.clone())
    }

    async fn read_chunk(&mut self) -> Result<Option<Vec<f32>>> {
        Ok(None)
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
