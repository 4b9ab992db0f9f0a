pub mod ble;
pub mod config;
pub mod core;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod hal;
pub mod observability;

pub use error::{BiometricError, Result};
