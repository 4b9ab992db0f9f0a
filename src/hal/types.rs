use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a simulated or real audio device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    Unopened,
    Running,
    Closed,
}

/// Device discovery information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    /// Whether the host reports this as its default input
    pub is_default: bool,
}

/// One characteristic value push from a peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub device_id: String,
    pub characteristic: Uuid,
    pub payload: Vec<u8>,
    /// Receive time in milliseconds, on the same clock as `Subscribed::at_ms`
    pub received_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BleEvent {
    /// Notifications were enabled on `characteristic`
    Subscribed {
        device_id: String,
        characteristic: Uuid,
        at_ms: u64,
    },
    Notification(Notification),
    /// The GATT server dropped the connection
    Disconnected { device_id: String },
}
