pub mod frame;
pub mod reading;

pub use frame::AudioFrame;
pub use reading::{BloodPressureReading, DeviceReading, WeightReading};
