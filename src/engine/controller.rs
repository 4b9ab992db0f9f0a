use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::CaptureConfig;
use crate::core::AudioFrame;
use crate::engine::emitter::FrameEmitter;
use crate::engine::session::{epoch_millis, CaptureSession};
use crate::engine::state::CaptureState;
use crate::engine::transport::{run_transport, FrameTransport};
use crate::error::{BiometricError, Result};
use crate::hal::AudioSource;
use crate::observability::CaptureMetrics;

/// Frames kept for slow preview subscribers before they start lagging
const PREVIEW_CAPACITY: usize = 16;

/// How long `stop_capture` waits for queued frames to drain
const TRANSPORT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

struct ActiveCapture {
    shutdown_tx: oneshot::Sender<()>,
    analysis: JoinHandle<()>,
    transport: JoinHandle<()>,
}

/// Owns at most one phonocardiogram capture for a consultation context.
///
/// The analysis loop runs as its own task, fed by an [`AudioSource`]; a
/// second task drains rate-limited frames into the [`FrameTransport`].
/// State, heart rate and the per-tick preview are published on channels.
pub struct CaptureController {
    config: CaptureConfig,
    transport: Arc<dyn FrameTransport>,
    metrics: Arc<CaptureMetrics>,
    state_tx: Arc<watch::Sender<CaptureState>>,
    heart_rate_tx: Arc<watch::Sender<u32>>,
    preview_tx: broadcast::Sender<AudioFrame>,
    active: Option<ActiveCapture>,
}

impl CaptureController {
    pub fn new(config: CaptureConfig, transport: Arc<dyn FrameTransport>) -> Self {
        let (state_tx, _) = watch::channel(CaptureState::Idle);
        let (heart_rate_tx, _) = watch::channel(0u32);
        let (preview_tx, _) = broadcast::channel(PREVIEW_CAPACITY);

        Self {
            config,
            transport,
            metrics: Arc::new(CaptureMetrics::new()),
            state_tx: Arc::new(state_tx),
            heart_rate_tx: Arc::new(heart_rate_tx),
            preview_tx,
            active: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state_tx.borrow().clone()
    }

    pub fn is_capturing(&self) -> bool {
        self.state_tx.borrow().is_capturing()
    }

    pub fn watch_state(&self) -> watch::Receiver<CaptureState> {
        self.state_tx.subscribe()
    }

    pub fn watch_heart_rate(&self) -> watch::Receiver<u32> {
        self.heart_rate_tx.subscribe()
    }

    /// Every analysed frame, before rate limiting. For local display.
    pub fn subscribe_preview(&self) -> broadcast::Receiver<AudioFrame> {
        self.preview_tx.subscribe()
    }

    pub fn metrics(&self) -> Arc<CaptureMetrics> {
        self.metrics.clone()
    }

    /// Acquire `source` and start streaming frames for `consultation_id`.
    ///
    /// Rejected with `DeviceUnavailable` while another capture is running;
    /// the running capture is left untouched. An empty consultation id is
    /// `InvalidConfig`, since frames would go nowhere. Open failures are
    /// returned as-is and leave the controller in `Failed`.
    pub async fn start_capture(
        &mut self,
        consultation_id: impl Into<String>,
        mut source: Box<dyn AudioSource>,
    ) -> Result<()> {
        let consultation_id = consultation_id.into();
        if consultation_id.trim().is_empty() {
            warn!("no consultation bound, refusing to start capture");
            return Err(BiometricError::InvalidConfig(
                "consultation id must not be empty".to_string(),
            ));
        }

        if let Some(active) = &self.active {
            if !active.analysis.is_finished() {
                warn!(consultation_id = %consultation_id, "capture already running, ignoring start");
                return Err(BiometricError::DeviceUnavailable(
                    "capture already running".to_string(),
                ));
            }
            // Previous loop ended on its own (device gone); clear it first.
            self.stop_capture().await;
        }

        self.transition_to(CaptureState::Acquiring);

        let sample_rate = match source.open(self.config.sample_rate).await {
            Ok(rate) => rate,
            Err(e) => {
                error!(source = source.name(), error = %e, "failed to acquire audio source");
                self.transition_to(CaptureState::Failed { error_msg: e.to_string() });
                return Err(e);
            }
        };

        let session = match CaptureSession::new(
            consultation_id.clone(),
            sample_rate,
            &self.config,
            epoch_millis(),
        ) {
            Ok(session) => session,
            Err(e) => {
                error!(sample_rate, error = %e, "cannot build filter chain for device rate");
                if let Err(close_err) = source.close().await {
                    warn!(error = %close_err, "failed to release audio source");
                }
                self.transition_to(CaptureState::Failed { error_msg: e.to_string() });
                return Err(e);
            }
        };

        let (queue_tx, queue_rx) = mpsc::channel(self.config.queue_capacity);
        let transport = tokio::spawn(run_transport(
            queue_rx,
            self.transport.clone(),
            consultation_id.clone(),
            self.metrics.clone(),
        ));

        let emitter = FrameEmitter::new(self.config.send_interval_ms, queue_tx, self.metrics.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        self.transition_to(CaptureState::Capturing {
            consultation_id: consultation_id.clone(),
            sample_rate,
        });
        info!(
            consultation_id = %consultation_id,
            source = source.name(),
            sample_rate,
            "capture started"
        );

        let analysis = tokio::spawn(run_capture_loop(
            source,
            session,
            emitter,
            shutdown_rx,
            LoopOutputs {
                preview_tx: self.preview_tx.clone(),
                heart_rate_tx: self.heart_rate_tx.clone(),
                state_tx: self.state_tx.clone(),
                metrics: self.metrics.clone(),
            },
        ));

        self.active = Some(ActiveCapture {
            shutdown_tx,
            analysis,
            transport,
        });
        Ok(())
    }

    /// Stop the capture, release the device and reset all session state.
    /// Idempotent and valid from any state, including `Failed`.
    pub async fn stop_capture(&mut self) {
        if let Some(active) = self.active.take() {
            let _ = active.shutdown_tx.send(());
            if let Err(e) = active.analysis.await {
                warn!(error = %e, "capture loop did not shut down cleanly");
            }

            let mut transport = active.transport;
            if tokio::time::timeout(TRANSPORT_DRAIN_TIMEOUT, &mut transport).await.is_err() {
                warn!("transport did not drain in time, abandoning queued frames");
                transport.abort();
            }
            info!("capture stopped");
        }

        self.heart_rate_tx.send_replace(0);
        if *self.state_tx.borrow() != CaptureState::Idle {
            self.transition_to(CaptureState::Idle);
        }
    }

    fn transition_to(&self, next: CaptureState) -> bool {
        apply_transition(&self.state_tx, next)
    }
}

/// Publish `next` if the state table allows it from the current state.
/// Illegal transitions are refused and logged; the state is left as is.
fn apply_transition(state_tx: &watch::Sender<CaptureState>, next: CaptureState) -> bool {
    state_tx.send_if_modified(|current| {
        if current.can_transition_to(&next) {
            *current = next;
            true
        } else {
            warn!(from = current.name(), to = next.name(), "refusing illegal capture state transition");
            false
        }
    })
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        // The loop closes the source itself once signalled.
        if let Some(active) = self.active.take() {
            let _ = active.shutdown_tx.send(());
        }
    }
}

struct LoopOutputs {
    preview_tx: broadcast::Sender<AudioFrame>,
    heart_rate_tx: Arc<watch::Sender<u32>>,
    state_tx: Arc<watch::Sender<CaptureState>>,
    metrics: Arc<CaptureMetrics>,
}

async fn run_capture_loop(
    mut source: Box<dyn AudioSource>,
    mut session: CaptureSession,
    mut emitter: FrameEmitter,
    mut shutdown_rx: oneshot::Receiver<()>,
    outputs: LoopOutputs,
) {
    let outcome: anyhow::Result<bool> = loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => break Ok(true),
            chunk = source.read_chunk() => match chunk {
                Ok(Some(samples)) => {
                    session.push_samples(&samples);
                    let frame = session.analyze();
                    outputs.metrics.record_frame_analyzed();
                    outputs.heart_rate_tx.send_replace(frame.heart_rate());
                    // No preview subscribers is fine.
                    let _ = outputs.preview_tx.send(frame.clone());
                    emitter.offer(frame);
                }
                Ok(None) => break Ok(false),
                Err(e) => break Err(e),
            },
        }
    };

    if let Err(e) = source.close().await {
        warn!(source = source.name(), error = %e, "failed to release audio source");
    }
    session.reset();

    match outcome {
        Ok(true) => debug!(
            consultation_id = session.consultation_id(),
            frames_sent = emitter.frames_sent(),
            "capture loop stopped on request"
        ),
        Ok(false) => {
            warn!(consultation_id = session.consultation_id(), "audio source disconnected");
            outputs.heart_rate_tx.send_replace(0);
            apply_transition(
                &outputs.state_tx,
                CaptureState::Failed {
                    error_msg: "audio source disconnected".to_string(),
                },
            );
        }
        Err(e) => {
            error!(consultation_id = session.consultation_id(), error = %e, "audio capture failed");
            outputs.heart_rate_tx.send_replace(0);
            apply_transition(
                &outputs.state_tx,
                CaptureState::Failed {
                    error_msg: e.to_string(),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_transition_refused() {
        let (state_tx, _rx) = watch::channel(CaptureState::Idle);
        let capturing = CaptureState::Capturing {
            consultation_id: "c".to_string(),
            sample_rate: 4000,
        };

        assert!(!apply_transition(&state_tx, capturing.clone()));
        assert_eq!(*state_tx.borrow(), CaptureState::Idle);

        assert!(apply_transition(&state_tx, CaptureState::Acquiring));
        assert!(apply_transition(&state_tx, capturing.clone()));
        assert_eq!(*state_tx.borrow(), capturing);
    }

    #[test]
    fn test_refused_transition_does_not_notify() {
        let (state_tx, rx) = watch::channel(CaptureState::Idle);
        apply_transition(
            &state_tx,
            CaptureState::Failed {
                error_msg: "x".to_string(),
            },
        );
        assert!(!rx.has_changed().unwrap());
    }
}
