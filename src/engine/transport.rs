use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::AudioFrame;
use crate::observability::CaptureMetrics;

/// Real-time channel towards the remote participant.
///
/// Implementations own reliability; callers never retry.
#[async_trait]
pub trait FrameTransport: Send + Sync {
    async fn send_frame(&self, consultation_id: &str, frame: &AudioFrame) -> Result<()>;
}

/// Envelope produced by [`ChannelTransport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundFrame {
    pub consultation_id: String,
    pub frame: AudioFrame,
}

/// Hands frames to an in-process consumer (a websocket writer, a test).
#[derive(Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<OutboundFrame>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl FrameTransport for ChannelTransport {
    async fn send_frame(&self, consultation_id: &str, frame: &AudioFrame) -> Result<()> {
        self.tx
            .send(OutboundFrame {
                consultation_id: consultation_id.to_string(),
                frame: frame.clone(),
            })
            .map_err(|_| anyhow!("frame consumer closed"))
    }
}

/// Discards everything. Used where no remote side exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

#[async_trait]
impl FrameTransport for NullTransport {
    async fn send_frame(&self, _consultation_id: &str, _frame: &AudioFrame) -> Result<()> {
        Ok(())
    }
}

/// Drain the outbound queue into `transport` until the queue closes.
/// Failed sends are counted and logged, never retried.
pub async fn run_transport(
    mut rx: mpsc::Receiver<AudioFrame>,
    transport: Arc<dyn FrameTransport>,
    consultation_id: String,
    metrics: Arc<CaptureMetrics>,
) {
    while let Some(frame) = rx.recv().await {
        match transport.send_frame(&consultation_id, &frame).await {
            Ok(()) => metrics.record_frame_sent(),
            Err(e) => {
                metrics.record_transport_error();
                warn!(consultation_id = %consultation_id, error = %e, "frame send failed");
            }
        }
    }
    debug!(consultation_id = %consultation_id, "transport queue closed");
}
