use crate::core::BloodPressureReading;
use crate::error::{BiometricError, Result};

pub const FLAG_UNITS_KPA: u8 = 0x01;
pub const FLAG_TIMESTAMP_PRESENT: u8 = 0x02;
pub const FLAG_PULSE_PRESENT: u8 = 0x04;

pub const KPA_TO_MMHG: f64 = 7.5006;

/// Flags + systolic + diastolic
const MIN_PAYLOAD_LEN: usize = 5;
/// Pulse follows the MAP field...
const PULSE_OFFSET: usize = 7;
/// ...or the 7-byte timestamp after it
const PULSE_OFFSET_AFTER_TIMESTAMP: usize = 14;

/// Decode a Blood Pressure Measurement (0x2A35) notification.
///
/// Systolic and diastolic are little-endian u16 at offsets 1 and 3,
/// converted from kPa when flagged. A pulse field that is flagged but
/// does not fit in the payload is reported as 0.
pub fn decode_blood_pressure(payload: &[u8]) -> Result<BloodPressureReading> {
    if payload.len() < MIN_PAYLOAD_LEN {
        return Err(BiometricError::MalformedPayload {
            payload: "blood pressure",
            needed: MIN_PAYLOAD_LEN,
            actual: payload.len(),
        });
    }

    let flags = payload[0];
    let unit_was_kpa = flags & FLAG_UNITS_KPA != 0;
    let mut systolic = read_u16_le(payload, 1).unwrap_or_default();
    let mut diastolic = read_u16_le(payload, 3).unwrap_or_default();

    if unit_was_kpa {
        systolic = kpa_to_mmhg(systolic);
        diastolic = kpa_to_mmhg(diastolic);
    }

    let pulse_bpm = if flags & FLAG_PULSE_PRESENT != 0 {
        let offset = if flags & FLAG_TIMESTAMP_PRESENT != 0 {
            PULSE_OFFSET_AFTER_TIMESTAMP
        } else {
            PULSE_OFFSET
        };
        read_u16_le(payload, offset).unwrap_or(0)
    } else {
        0
    };

    Ok(BloodPressureReading {
        systolic,
        diastolic,
        pulse_bpm,
        unit_was_kpa,
    })
}

fn kpa_to_mmhg(raw: u16) -> u16 {
    (raw as f64 * KPA_TO_MMHG).round().min(u16::MAX as f64) as u16
}

fn read_u16_le(payload: &[u8], offset: usize) -> Option<u16> {
    let bytes = payload.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}
