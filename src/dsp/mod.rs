pub mod buffer;
pub mod detector;
pub mod downsample;
pub mod filter;
pub mod heart_rate;

pub use buffer::SampleBuffer;
pub use detector::{detect_heart_sounds, peak_amplitude, HeartSounds};
pub use downsample::{downsample, downsample_into};
pub use filter::BandPassFilter;
pub use heart_rate::{EstimatorState, HeartRateEstimator, PeakOutcome};
