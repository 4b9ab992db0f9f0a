use vitalstream::dsp::{downsample, downsample_into};

#[test]
fn test_averages_contiguous_windows() {
    assert_eq!(downsample(&[1.0, 2.0, 3.0, 4.0], 2), vec![1.5, 3.5]);
}

#[test]
fn test_identity_when_lengths_match() {
    let input = vec![0.1, -0.2, 0.3, -0.4];
    assert_eq!(downsample(&input, 4), input);
}

#[test]
fn test_analysis_frame_to_waveform() {
    let input: Vec<f32> = (0..256).map(|i| i as f32).collect();
    let out = downsample(&input, 128);
    assert_eq!(out.len(), 128);
    assert_eq!(out[0], 0.5);
    assert_eq!(out[127], 254.5);
}

#[test]
fn test_uneven_windows_keep_target_length() {
    let input: Vec<f32> = (0..10).map(|i| i as f32).collect();
    let out = downsample(&input, 3);
    assert_eq!(out.len(), 3);
    // windows 0..3, 3..6, 6..10
    assert_eq!(out, vec![1.0, 4.0, 7.5]);
}

#[test]
fn test_target_longer_than_input_repeats_samples() {
    assert_eq!(
        downsample(&[1.0, 2.0, 3.0], 6),
        vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0]
    );
}

#[test]
fn test_empty_input_yields_silence() {
    assert_eq!(downsample(&[], 4), vec![0.0; 4]);
}

#[test]
fn test_into_reuses_buffer() {
    let mut out = vec![9.0; 10];
    downsample_into(&[2.0, 4.0], 1, &mut out);
    assert_eq!(out, vec![3.0]);
}

#[test]
fn test_length_for_every_small_pair() {
    for len in 1..=64usize {
        let input: Vec<f32> = (0..len).map(|i| i as f32).collect();
        for target in 1..=64usize {
            let out = downsample(&input, target);
            assert_eq!(out.len(), target, "len {} -> {}", len, target);
            assert!(out.iter().all(|&v| v >= 0.0 && v <= (len - 1) as f32));
        }
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_output_has_target_length(
            input in proptest::collection::vec(-1.0f32..1.0, 1..600),
            target in 1usize..300
        ) {
            prop_assert_eq!(downsample(&input, target).len(), target);
        }

        #[test]
        fn prop_output_bounded_by_input(
            input in proptest::collection::vec(-1.0f32..1.0, 1..600),
            target in 1usize..300
        ) {
            let lo = input.iter().cloned().fold(f32::MAX, f32::min);
            let hi = input.iter().cloned().fold(f32::MIN, f32::max);
            for v in downsample(&input, target) {
                prop_assert!(v >= lo - 1e-5 && v <= hi + 1e-5);
            }
        }
    }
}
