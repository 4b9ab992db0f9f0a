pub mod audio;
pub mod ble;

pub use audio::{SimulatedHeartbeatSource, UnavailableAudioSource};
pub use ble::{NullNotificationSource, ScriptedNotificationSource};
