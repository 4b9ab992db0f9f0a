pub mod microphone;

pub use microphone::{list_microphones, MicrophoneSource};
