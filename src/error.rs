use thiserror::Error;

/// Failures surfaced by capture sessions and device decoders.
///
/// Sub-threshold audio and refractory rejections are not represented here:
/// they simply yield no new reading for that frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BiometricError {
    /// Audio or BLE access refused by the user or OS. Fatal to the attempt.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// No matching device, or the capture slot is already taken.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Payload too short to contain a mandatory fixed-offset field.
    #[error("malformed {payload} payload: need at least {needed} bytes, got {actual}")]
    MalformedPayload {
        payload: &'static str,
        needed: usize,
        actual: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, BiometricError>;
