// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use effectcam::{Config, EffectKind};

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(
        config.mirror_preview,
        "Mirror preview should be enabled by default"
    );
    assert_eq!(config.default_effect, EffectKind::Beautify);
    assert_eq!(config.intensity, 1.0);
    assert!(config.record_audio);
}

#[test]
fn test_config_serializes_with_stable_field_names() {
    let config = Config::default();
    let json = serde_json::to_string(&config).unwrap();

    // Field names are the on-disk format; renames break existing files
    for field in [
        "default_effect",
        "intensity",
        "mirror_preview",
        "bitrate_preset",
        "camera_position",
        "record_audio",
    ] {
        assert!(json.contains(field), "Missing config field: {}", field);
    }
}

#[test]
fn test_config_round_trip() {
    let mut config = Config::default();
    config.default_effect = EffectKind::Vintage;
    config.intensity = 0.4;

    let json = serde_json::to_string(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}
