use serde::{Deserialize, Serialize};

/// One decoded body-composition scale notification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightReading {
    pub weight_kg: f64,
    /// Bioimpedance, 0 when the payload carries none
    pub impedance_ohm: u16,
    pub is_stable: bool,
    /// Set by the gate on the stale value replayed right after subscribing
    pub is_first_cached_sample: bool,
}

/// One decoded Blood Pressure Measurement notification, always in mmHg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodPressureReading {
    pub systolic: u16,
    pub diastolic: u16,
    /// 0 when the cuff did not report a pulse
    pub pulse_bpm: u16,
    pub unit_was_kpa: bool,
}

/// A reading that passed validity gating and can be handed to sinks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceReading {
    Weight(WeightReading),
    BloodPressure(BloodPressureReading),
}
