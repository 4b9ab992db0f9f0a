use biquad::{Biquad, Coefficients, DirectForm2Transposed, Hertz, Type};

use crate::config::CaptureConfig;
use crate::error::{BiometricError, Result};

/// High-pass followed by low-pass biquad, restricting audio to the
/// cardiac band (20-200 Hz by default).
///
/// Coefficients are fixed at construction; a new sample rate means a new
/// filter. Delay state persists across [`process`](Self::process) calls.
#[derive(Debug, Clone)]
pub struct BandPassFilter {
    sample_rate: u32,
    highpass_coeffs: Coefficients<f32>,
    lowpass_coeffs: Coefficients<f32>,
    highpass: DirectForm2Transposed<f32>,
    lowpass: DirectForm2Transposed<f32>,
}

impl BandPassFilter {
    pub fn new(sample_rate: u32, config: &CaptureConfig) -> Result<Self> {
        config.validate_for_rate(sample_rate)?;

        let fs = hertz(sample_rate as f32)?;
        let highpass_coeffs =
            Coefficients::<f32>::from_params(Type::HighPass, fs, hertz(config.highpass_hz)?, config.q)
                .map_err(|e| {
                    BiometricError::InvalidConfig(format!("high-pass stage: {:?}", e))
                })?;
        let lowpass_coeffs =
            Coefficients::<f32>::from_params(Type::LowPass, fs, hertz(config.lowpass_hz)?, config.q)
                .map_err(|e| BiometricError::InvalidConfig(format!("low-pass stage: {:?}", e)))?;

        Ok(Self {
            sample_rate,
            highpass_coeffs,
            lowpass_coeffs,
            highpass: DirectForm2Transposed::<f32>::new(highpass_coeffs),
            lowpass: DirectForm2Transposed::<f32>::new(lowpass_coeffs),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let high_passed = self.highpass.run(sample);
        self.lowpass.run(high_passed)
    }

    /// Clear the delay elements, keeping the coefficients.
    pub fn reset(&mut self) {
        self.highpass = DirectForm2Transposed::<f32>::new(self.highpass_coeffs);
        self.lowpass = DirectForm2Transposed::<f32>::new(self.lowpass_coeffs);
    }
}

fn hertz(value: f32) -> Result<Hertz<f32>> {
    Hertz::<f32>::from_hz(value)
        .map_err(|e| BiometricError::InvalidConfig(format!("frequency {} Hz: {:?}", value, e)))
}
