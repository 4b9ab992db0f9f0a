use vitalstream::dsp::{detect_heart_sounds, peak_amplitude};

#[test]
fn test_silent_frame_has_no_sounds() {
    let sounds = detect_heart_sounds(&[0.0; 256]);
    assert_eq!(sounds.s1, 0.0);
    assert_eq!(sounds.s2, 0.0);
}

#[test]
fn test_two_loudest_by_magnitude() {
    let sounds = detect_heart_sounds(&[0.2, -0.7, 0.4, 0.1]);
    assert_eq!(sounds.s1, 0.7);
    assert_eq!(sounds.s2, 0.4);
}

#[test]
fn test_equal_peaks_fill_both_slots() {
    let sounds = detect_heart_sounds(&[0.1, -0.9, 0.5, 0.9]);
    assert_eq!(sounds.s1, 0.9);
    assert_eq!(sounds.s2, 0.9);
}

#[test]
fn test_s1_never_below_s2() {
    let frame: Vec<f32> = (0..200).map(|i| ((i * 37) % 101) as f32 / 100.0 - 0.5).collect();
    let sounds = detect_heart_sounds(&frame);
    assert!(sounds.s1 >= sounds.s2);
    assert_eq!(sounds.s1, peak_amplitude(&frame));
}

#[test]
fn test_empty_frame() {
    let sounds = detect_heart_sounds(&[]);
    assert_eq!((sounds.s1, sounds.s2), (0.0, 0.0));
    assert_eq!(peak_amplitude(&[]), 0.0);
}
