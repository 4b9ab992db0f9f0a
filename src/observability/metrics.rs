use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the analysis loop, the transport consumer and
/// the BLE monitor. All updates are relaxed; readers only need totals.
#[derive(Debug, Default)]
pub struct CaptureMetrics {
    frames_analyzed: AtomicU64,
    frames_sent: AtomicU64,
    frames_dropped: AtomicU64,
    transport_errors: AtomicU64,
    readings_accepted: AtomicU64,
    readings_rejected: AtomicU64,
    payloads_malformed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub frames_analyzed: u64,
    pub frames_sent: u64,
    pub frames_dropped: u64,
    pub transport_errors: u64,
    pub readings_accepted: u64,
    pub readings_rejected: u64,
    pub payloads_malformed: u64,
}

impl CaptureMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame_analyzed(&self) {
        self.frames_analyzed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Frame discarded because the outbound queue was full
    pub fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reading_accepted(&self) {
        self.readings_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reading_rejected(&self) {
        self.readings_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_payload_malformed(&self) {
        self.payloads_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_analyzed(&self) -> u64 {
        self.frames_analyzed.load(Ordering::Relaxed)
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_analyzed: self.frames_analyzed.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            readings_accepted: self.readings_accepted.load(Ordering::Relaxed),
            readings_rejected: self.readings_rejected.load(Ordering::Relaxed),
            payloads_malformed: self.payloads_malformed.load(Ordering::Relaxed),
        }
    }
}
