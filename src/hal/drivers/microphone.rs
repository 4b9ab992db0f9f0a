use anyhow::{anyhow, Result};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SampleRate, SizedSample, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::BiometricError;
use crate::hal::{AudioSource, DeviceInfo};

/// Chunks buffered between the cpal callback and the capture loop
const CHUNK_QUEUE: usize = 8;
const POLL_INTERVAL: Duration = Duration::from_millis(4);

/// List audio input devices. Enumeration can block (notably on macOS),
/// so it runs on the blocking pool.
pub async fn list_microphones() -> Result<Vec<DeviceInfo>> {
    tokio::task::spawn_blocking(|| {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());

        let mut devices = Vec::new();
        if let Ok(input_devices) = host.input_devices() {
            for (idx, device) in input_devices.enumerate() {
                if let Ok(name) = device.name() {
                    devices.push(DeviceInfo {
                        id: format!("input-{}", idx),
                        is_default: default_name.as_deref() == Some(name.as_str()),
                        name,
                    });
                }
            }
        }
        Ok(devices)
    })
    .await?
}

/// Microphone capture through cpal, downmixed to mono.
///
/// The cpal stream lives on a dedicated thread (streams are not `Send` on
/// every backend); audio crosses over a bounded channel and chunks are
/// dropped rather than blocking the audio callback.
pub struct MicrophoneSource {
    device_name: Option<String>,
    label: String,
    chunk_rx: Option<Receiver<Vec<f32>>>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    disconnected: Arc<AtomicBool>,
}

impl MicrophoneSource {
    /// Use the host's default input device
    pub fn default_device() -> Self {
        Self::build(None)
    }

    /// Use the input device whose name matches exactly
    pub fn named(device_name: impl Into<String>) -> Self {
        Self::build(Some(device_name.into()))
    }

    fn build(device_name: Option<String>) -> Self {
        let label = match &device_name {
            Some(name) => format!("microphone:{}", name),
            None => "microphone:default".to_string(),
        };
        Self {
            device_name,
            label,
            chunk_rx: None,
            stop_tx: None,
            worker: None,
            disconnected: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl AudioSource for MicrophoneSource {
    fn name(&self) -> &str {
        &self.label
    }

    async fn open(&mut self, requested_rate: u32) -> std::result::Result<u32, BiometricError> {
        if self.worker.is_some() {
            return Err(BiometricError::DeviceUnavailable(format!("{} already open", self.label)));
        }

        let (ready_tx, ready_rx) = bounded::<std::result::Result<u32, BiometricError>>(1);
        let (chunk_tx, chunk_rx) = bounded::<Vec<f32>>(CHUNK_QUEUE);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let device_name = self.device_name.clone();
        self.disconnected.store(false, Ordering::Relaxed);
        let disconnected = self.disconnected.clone();

        let worker = std::thread::Builder::new()
            .name("vitalstream-mic".to_string())
            .spawn(move || {
                let stream = match open_stream(device_name.as_deref(), requested_rate, chunk_tx, disconnected) {
                    Ok((stream, rate)) => {
                        let _ = ready_tx.send(Ok(rate));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                // Hold the stream until asked to stop or the source is dropped.
                let _ = stop_rx.recv();
                drop(stream);
            })
            .map_err(|e| BiometricError::DeviceUnavailable(format!("cannot spawn audio thread: {}", e)))?;

        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| BiometricError::DeviceUnavailable(format!("audio thread panicked: {}", e)))?;

        match ready {
            Ok(Ok(rate)) => {
                info!(device = %self.label, requested_rate, rate, "microphone opened");
                self.chunk_rx = Some(chunk_rx);
                self.stop_tx = Some(stop_tx);
                self.worker = Some(worker);
                Ok(rate)
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => Err(BiometricError::DeviceUnavailable(
                "audio thread exited before the stream opened".to_string(),
            )),
        }
    }

    async fn read_chunk(&mut self) -> Result<Option<Vec<f32>>> {
        let rx = self.chunk_rx.as_ref().ok_or_else(|| anyhow!("Device not running"))?;
        loop {
            match rx.try_recv() {
                Ok(chunk) => return Ok(Some(chunk)),
                Err(TryRecvError::Empty) => {
                    if self.disconnected.load(Ordering::Relaxed) {
                        return Ok(None);
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(TryRecvError::Disconnected) => return Ok(None),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.chunk_rx = None;
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            tokio::task::spawn_blocking(move || worker.join())
                .await?
                .map_err(|_| anyhow!("audio thread panicked"))?;
            debug!(device = %self.label, "microphone released");
        }
        Ok(())
    }
}

fn open_stream(
    device_name: Option<&str>,
    requested_rate: u32,
    tx: Sender<Vec<f32>>,
    disconnected: Arc<AtomicBool>,
) -> std::result::Result<(cpal::Stream, u32), BiometricError> {
    let host = cpal::default_host();
    let device = match device_name {
        Some(wanted) => host
            .input_devices()
            .map_err(|e| BiometricError::DeviceUnavailable(e.to_string()))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false)),
        None => host.default_input_device(),
    }
    .ok_or_else(|| {
        BiometricError::DeviceUnavailable(format!(
            "no input device {}",
            device_name.unwrap_or("(default)")
        ))
    })?;

    let supported = match device.supported_input_configs() {
        Ok(mut ranges) => ranges.find(|r| {
            r.min_sample_rate().0 <= requested_rate && requested_rate <= r.max_sample_rate().0
        }),
        Err(e) => {
            debug!(error = %e, "cannot list supported input configs");
            None
        }
    };
    let supported = match supported {
        Some(range) => range.with_sample_rate(SampleRate(requested_rate)),
        // Device cannot do the requested rate; take its default and let the
        // filter chain be designed for that instead.
        None => device
            .default_input_config()
            .map_err(|e| BiometricError::DeviceUnavailable(e.to_string()))?,
    };

    let sample_format = supported.sample_format();
    let config = supported.config();
    let rate = config.sample_rate.0;

    let stream = match sample_format {
        SampleFormat::F32 => build_input::<f32>(&device, &config, tx, disconnected)?,
        SampleFormat::I16 => build_input::<i16>(&device, &config, tx, disconnected)?,
        SampleFormat::U16 => build_input::<u16>(&device, &config, tx, disconnected)?,
        other => {
            return Err(BiometricError::DeviceUnavailable(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    };

    stream.play().map_err(|e| match e {
        cpal::PlayStreamError::DeviceNotAvailable => {
            BiometricError::DeviceUnavailable("input device went away".to_string())
        }
        other => BiometricError::PermissionDenied(other.to_string()),
    })?;

    Ok((stream, rate))
}

fn build_input<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    tx: Sender<Vec<f32>>,
    disconnected: Arc<AtomicBool>,
) -> std::result::Result<cpal::Stream, BiometricError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = (config.channels as usize).max(1);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mono: Vec<f32> = data
                    .chunks(channels)
                    .map(|frame| {
                        frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / channels as f32
                    })
                    .collect();
                // Consumer lagging: drop rather than block the audio thread.
                let _ = tx.try_send(mono);
            },
            move |err| {
                error!(error = %err, "microphone stream error");
                if matches!(err, cpal::StreamError::DeviceNotAvailable) {
                    disconnected.store(true, Ordering::Relaxed);
                }
            },
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => {
                BiometricError::DeviceUnavailable("input device went away".to_string())
            }
            cpal::BuildStreamError::BackendSpecific { err } => {
                BiometricError::PermissionDenied(err.description)
            }
            other => BiometricError::DeviceUnavailable(other.to_string()),
        })
}
