use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::core::AudioFrame;
use crate::observability::CaptureMetrics;

/// Log a progress line every this many transmitted frames
const LOG_EVERY_FRAMES: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    /// Queued for the transport
    Sent,
    /// Inside the send interval; nothing queued
    Throttled,
    /// Slot used but the queue was full or closed; frame discarded
    Dropped,
}

/// Rate-limits outbound frames independently of the analysis cadence.
///
/// Hand-off is a non-blocking `try_send` into a bounded queue so the
/// analysis loop never waits on the network. Delivery is fire-and-forget.
pub struct FrameEmitter {
    interval_ms: u64,
    last_sent_ms: Option<u64>,
    frames_sent: u64,
    queue: mpsc::Sender<AudioFrame>,
    metrics: Arc<CaptureMetrics>,
}

impl FrameEmitter {
    pub fn new(interval_ms: u64, queue: mpsc::Sender<AudioFrame>, metrics: Arc<CaptureMetrics>) -> Self {
        Self {
            interval_ms,
            last_sent_ms: None,
            frames_sent: 0,
            queue,
            metrics,
        }
    }

    /// Forward `frame` if at least one interval has passed since the last
    /// send, measured on the frame's own timestamp.
    pub fn offer(&mut self, frame: AudioFrame) -> EmitOutcome {
        let now_ms = frame.timestamp();
        if let Some(last) = self.last_sent_ms {
            if now_ms.saturating_sub(last) < self.interval_ms {
                return EmitOutcome::Throttled;
            }
        }
        self.last_sent_ms = Some(now_ms);

        match self.queue.try_send(frame) {
            Ok(()) => {
                self.frames_sent += 1;
                if self.frames_sent % LOG_EVERY_FRAMES == 0 {
                    debug!(frames_sent = self.frames_sent, "sent frame #{}", self.frames_sent);
                }
                EmitOutcome::Sent
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.record_frame_dropped();
                warn!("outbound queue full, dropping frame");
                EmitOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                self.metrics.record_frame_dropped();
                debug!("transport consumer gone, dropping frame");
                EmitOutcome::Dropped
            }
        }
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }
}
