pub mod drivers;
pub mod mock;
pub mod traits;
pub mod types;

pub use drivers::{list_microphones, MicrophoneSource};
pub use traits::{AudioSource, NotificationSource};
pub use types::{BleEvent, DeviceInfo, DeviceState, Notification};
