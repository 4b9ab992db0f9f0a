/// Amplitudes of the two loudest samples in a frame.
///
/// A coarse stand-in for the first and second heart sounds; no beat
/// segmentation is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeartSounds {
    pub s1: f32,
    pub s2: f32,
}

/// Single linear pass keeping the largest and second-largest absolute
/// values. `s1 >= s2` always holds; both are 0 for an empty or silent frame.
pub fn detect_heart_sounds(frame: &[f32]) -> HeartSounds {
    let mut max1 = 0.0f32;
    let mut max2 = 0.0f32;

    for &sample in frame {
        let value = sample.abs();
        if value > max1 {
            max2 = max1;
            max1 = value;
        } else if value > max2 {
            max2 = value;
        }
    }

    HeartSounds { s1: max1, s2: max2 }
}

/// Largest absolute sample, 0 for an empty frame.
pub fn peak_amplitude(frame: &[f32]) -> f32 {
    frame.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}
