use tracing::{info, warn};

use crate::config::ScaleConfig;
use crate::core::WeightReading;
use crate::error::{BiometricError, Result};

/// Bit in byte 1 set once the scale has settled
pub const FLAG_STABILIZED: u8 = 0x20;
/// Raw weight units per kilogram (0.005 kg resolution)
pub const RAW_UNITS_PER_KG: f64 = 200.0;

const MIN_PAYLOAD_LEN: usize = 4;
const IMPEDANCE_PAYLOAD_LEN: usize = 6;

/// Decode a body-composition scale notification.
///
/// Layout: byte 1 flags, bytes 2..4 weight (u16 LE, /200 kg), bytes 4..6
/// impedance (u16 LE ohms, optional). Gating is the caller's job, see
/// [`ScaleGate`].
pub fn decode_weight(payload: &[u8]) -> Result<WeightReading> {
    if payload.len() < MIN_PAYLOAD_LEN {
        return Err(BiometricError::MalformedPayload {
            payload: "weight",
            needed: MIN_PAYLOAD_LEN,
            actual: payload.len(),
        });
    }

    let flags = payload[1];
    let raw_weight = u16::from_le_bytes([payload[2], payload[3]]);
    let impedance_ohm = if payload.len() >= IMPEDANCE_PAYLOAD_LEN {
        u16::from_le_bytes([payload[4], payload[5]])
    } else {
        0
    };

    Ok(WeightReading {
        weight_kg: raw_weight as f64 / RAW_UNITS_PER_KG,
        impedance_ohm,
        is_stable: flags & FLAG_STABILIZED != 0,
        is_first_cached_sample: false,
    })
}

/// Outcome of gating one scale reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleVerdict {
    /// First notification after subscribing; replayed from device cache
    CachedSample(WeightReading),
    /// Still inside the settle window
    Settling { remaining_secs: u64 },
    /// Impedance too low: probably nobody on the scale
    LowImpedance(WeightReading),
    /// Weight still fluctuating
    Unstable(WeightReading),
    Accepted(WeightReading),
}

impl ScaleVerdict {
    pub fn accepted(&self) -> Option<WeightReading> {
        match self {
            ScaleVerdict::Accepted(reading) => Some(*reading),
            _ => None,
        }
    }
}

/// Per-subscription validity gate for scale readings.
///
/// Order of checks: cached first sample, settle window, impedance,
/// stability.
#[derive(Debug, Clone)]
pub struct ScaleGate {
    config: ScaleConfig,
    subscribed_at_ms: u64,
    seen_first: bool,
}

impl ScaleGate {
    pub fn new(config: ScaleConfig, subscribed_at_ms: u64) -> Self {
        Self {
            config,
            subscribed_at_ms,
            seen_first: false,
        }
    }

    pub fn subscribed_at_ms(&self) -> u64 {
        self.subscribed_at_ms
    }

    /// Whole seconds left in the settle window at `now_ms`, rounded up.
    pub fn remaining_settle_secs(&self, now_ms: u64) -> u64 {
        let elapsed = now_ms.saturating_sub(self.subscribed_at_ms);
        let remaining_ms = self.config.settle_ms.saturating_sub(elapsed);
        remaining_ms.div_ceil(1000)
    }

    pub fn evaluate(&mut self, mut reading: WeightReading, now_ms: u64) -> ScaleVerdict {
        if self.config.discard_first_notification && !self.seen_first {
            self.seen_first = true;
            reading.is_first_cached_sample = true;
            info!(weight_kg = reading.weight_kg, "ignoring cached first scale notification");
            return ScaleVerdict::CachedSample(reading);
        }
        self.seen_first = true;

        let elapsed = now_ms.saturating_sub(self.subscribed_at_ms);
        if elapsed < self.config.settle_ms {
            let remaining_secs = self.remaining_settle_secs(now_ms);
            info!(remaining_secs, "scale settling, ignoring reading");
            return ScaleVerdict::Settling { remaining_secs };
        }

        if reading.impedance_ohm <= self.config.min_impedance_ohm {
            warn!(
                impedance_ohm = reading.impedance_ohm,
                weight_kg = reading.weight_kg,
                "low impedance, scale empty?"
            );
            return ScaleVerdict::LowImpedance(reading);
        }

        if !reading.is_stable {
            return ScaleVerdict::Unstable(reading);
        }

        info!(
            weight_kg = reading.weight_kg,
            impedance_ohm = reading.impedance_ohm,
            "weight captured"
        );
        ScaleVerdict::Accepted(reading)
    }
}
