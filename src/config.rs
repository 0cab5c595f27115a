// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Persisted as JSON under the user config directory. A missing or corrupt
//! file yields the defaults; saving is best-effort and never blocks the
//! pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::capture::DevicePosition;
use crate::constants::BitratePreset;
use crate::effects::EffectKind;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Effect selected at startup
    pub default_effect: EffectKind,
    /// Effect intensity in [0, 2]
    pub intensity: f32,
    /// Mirror frames from front-position cameras (selfie mode)
    pub mirror_preview: bool,
    /// Video encoder bitrate preset (Low, Medium, High)
    pub bitrate_preset: BitratePreset,
    /// Camera position preferred at startup
    pub camera_position: DevicePosition,
    /// Record microphone audio
    pub record_audio: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_effect: EffectKind::default(),
            intensity: 1.0,
            mirror_preview: true, // Default to mirrored (selfie mode)
            bitrate_preset: BitratePreset::default(),
            camera_position: DevicePosition::default(),
            record_audio: true,
        }
    }
}

impl Config {
    /// Path of the persisted configuration file
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("effectcam")
            .join("config.json")
    }

    /// Load configuration, falling back to defaults
    pub fn load() -> Config {
        let path = Config::path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Configuration loaded");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt configuration, using defaults");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    /// Persist configuration (best effort)
    pub fn save(&self) -> std::io::Result<()> {
        let path = Config::path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        std::fs::write(&path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trips_through_json() {
        let config = Config {
            default_effect: EffectKind::Wave,
            intensity: 1.5,
            mirror_preview: false,
            bitrate_preset: BitratePreset::High,
            camera_position: DevicePosition::Front,
            record_audio: false,
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_corrupt_json_falls_back_to_default() {
        let parsed: Result<Config, _> = serde_json::from_str("{\"default_effect\": 12}");
        assert!(parsed.is_err());
    }
}
