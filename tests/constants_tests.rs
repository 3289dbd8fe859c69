// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use camera_filter::constants::{self, CapturePreset, filter};

#[test]
fn test_capture_preset_values() {
    // Test that all presets exist (Low, Medium, High)
    assert_eq!(CapturePreset::ALL.len(), 3);
    assert_eq!(CapturePreset::default(), CapturePreset::Medium);
}

#[test]
fn test_capture_preset_ordering() {
    // Test that presets are ordered from smallest to largest
    let mut prev_pixels = 0u32;
    for preset in CapturePreset::ALL {
        let (width, height) = preset.resolution();
        assert!(width * height > prev_pixels, "Presets should grow in size");
        assert_eq!(width % 2, 0);
        assert_eq!(height % 2, 0);
        prev_pixels = width * height;
    }
}

#[test]
fn test_capture_preset_parse() {
    for preset in CapturePreset::ALL {
        assert!(!preset.display_name().is_empty());
        assert_eq!(preset.display_name().parse::<CapturePreset>(), Ok(preset));
    }
    assert_eq!("HIGH".parse::<CapturePreset>(), Ok(CapturePreset::High));
    assert!("ultra".parse::<CapturePreset>().is_err());
}

#[test]
fn test_luma_weights_sum_to_256() {
    assert_eq!(filter::LUMA_WEIGHTS_FIXED.iter().sum::<u32>(), 256);
}

#[test]
fn test_vignette_radii_are_ordered() {
    assert!(filter::VIGNETTE_INNER_RADIUS < filter::VIGNETTE_OUTER_RADIUS);
}

#[test]
fn test_frame_interval() {
    assert_eq!(constants::frame_interval(25).as_millis(), 40);
    // Zero is clamped to 1 fps
    assert_eq!(constants::frame_interval(0).as_secs(), 1);
}

#[test]
fn test_version_is_set() {
    assert!(!constants::app_info::version().is_empty());
}
