use anyhow::Result;
use async_trait::async_trait;

use super::types::BleEvent;
use crate::error::BiometricError;

/// Live source of mono audio samples normalized to [-1, 1].
///
/// Where no audio stack exists, a stub that fails `open` is injected
/// instead of branching on the platform.
#[async_trait]
pub trait AudioSource: Send {
    /// Human-readable identity for logs
    fn name(&self) -> &str;

    /// Acquire the device, asking for `requested_rate`.
    ///
    /// Returns the rate the device actually delivers. A refusal by the user
    /// or OS is `PermissionDenied` and must not be retried automatically.
    async fn open(&mut self, requested_rate: u32) -> std::result::Result<u32, BiometricError>;

    /// Next block of samples, or `None` once the device has gone away.
    /// Must be cancel-safe: the capture loop races it against shutdown.
    async fn read_chunk(&mut self) -> Result<Option<Vec<f32>>>;

    /// Release the device. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Stream of GATT notifications and connection events from one or more
/// subscribed peripherals.
#[async_trait]
pub trait NotificationSource: Send {
    /// Next event, or `None` when the source is exhausted.
    async fn next_event(&mut self) -> Option<BleEvent>;
}

#[async_trait]
impl<T: NotificationSource + ?Sized> NotificationSource for Box<T> {
    async fn next_event(&mut self) -> Option<BleEvent> {
        (**self).next_event().await
    }
}
