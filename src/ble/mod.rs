pub mod blood_pressure;
pub mod gatt;
pub mod monitor;
pub mod weight;

pub use blood_pressure::decode_blood_pressure;
pub use gatt::CharacteristicKind;
pub use monitor::{BleMonitor, MonitorEvent, MonitorExit, RejectReason};
pub use weight::{decode_weight, ScaleGate, ScaleVerdict};
