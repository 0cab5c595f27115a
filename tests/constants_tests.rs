// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use effectcam::BitratePreset;
use effectcam::constants::{audio, capture, zoom};

#[test]
fn test_bitrate_preset_values() {
    assert_eq!(BitratePreset::ALL.len(), 3);
}

#[test]
fn test_bitrate_preset_ordering() {
    // Presets are ordered from lowest to highest quality
    let mut prev_bitrate = 0u32;
    for preset in BitratePreset::ALL {
        let bitrate = preset.bitrate_kbps(1280, 720);
        assert!(
            bitrate >= prev_bitrate,
            "Presets should be ordered from lowest to highest"
        );
        prev_bitrate = bitrate;
    }
}

#[test]
fn test_bitrate_scales_with_resolution() {
    let sd_bitrate = BitratePreset::Medium.bitrate_kbps(640, 480);
    let hd_bitrate = BitratePreset::Medium.bitrate_kbps(1280, 720);
    let fhd_bitrate = BitratePreset::Medium.bitrate_kbps(1920, 1080);

    assert!(sd_bitrate < hd_bitrate);
    assert!(hd_bitrate < fhd_bitrate);
}

#[test]
fn test_bitrate_preset_display_names() {
    for preset in BitratePreset::ALL {
        assert!(
            !preset.display_name().is_empty(),
            "Preset {:?} has empty display name",
            preset
        );
    }
}

#[test]
fn test_capture_preset_is_consistent() {
    // Encoder caps and compositor buffers are all sized from these values
    assert!(capture::WIDTH % 2 == 0 && capture::HEIGHT % 2 == 0);
    assert!(capture::FRAMERATE > 0);
    assert_eq!(capture::BYTES_PER_PIXEL, 4);

    assert_eq!(audio::BYTES_PER_FRAME, 2 * audio::CHANNELS);
    assert!(zoom::DEFAULT_MAX_FACTOR >= zoom::MIN_FACTOR);
}
