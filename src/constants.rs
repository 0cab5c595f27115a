// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants
//!
//! The capture and encode parameter set is fixed by design: one capture
//! preset feeds the GPU compositor and the recording muxer, so every stage
//! agrees on resolution, framerate and sample format without negotiation.

use serde::{Deserialize, Serialize};

/// Video encoder bitrate presets
///
/// These presets define the target bitrate for video encoding based on
/// resolution. Users can choose between quality and file size trade-offs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BitratePreset {
    /// Low bitrate - smaller files, reduced quality
    Low,
    /// Medium bitrate - balanced quality and file size (default)
    #[default]
    Medium,
    /// High bitrate - larger files, better quality
    High,
}

impl BitratePreset {
    /// Get all preset variants for CLI/UI iteration
    pub const ALL: [BitratePreset; 3] = [
        BitratePreset::Low,
        BitratePreset::Medium,
        BitratePreset::High,
    ];

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            BitratePreset::Low => "Low",
            BitratePreset::Medium => "Medium",
            BitratePreset::High => "High",
        }
    }

    /// Get bitrate in kbps for a given resolution
    ///
    /// Bitrates are tuned for good quality at each resolution tier:
    /// - SD (640x480): Low=1, Medium=2, High=4 Mbps
    /// - HD (1280x720): Low=2.5, Medium=5, High=10 Mbps
    /// - Full HD (1920x1080): Low=4, Medium=8, High=16 Mbps
    pub fn bitrate_kbps(&self, width: u32, _height: u32) -> u32 {
        let tier = resolution_tier(width);

        match (tier, self) {
            (ResolutionTier::SD, BitratePreset::Low) => 1_000,
            (ResolutionTier::SD, BitratePreset::Medium) => 2_000,
            (ResolutionTier::SD, BitratePreset::High) => 4_000,
            (ResolutionTier::HD, BitratePreset::Low) => 2_500,
            (ResolutionTier::HD, BitratePreset::Medium) => 5_000,
            (ResolutionTier::HD, BitratePreset::High) => 10_000,
            (ResolutionTier::FullHD, BitratePreset::Low) => 4_000,
            (ResolutionTier::FullHD, BitratePreset::Medium) => 8_000,
            (ResolutionTier::FullHD, BitratePreset::High) => 16_000,
        }
    }
}

/// Resolution tiers for bitrate calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// SD: 640x480 and below
    SD,
    /// HD: 1280x720
    HD,
    /// Full HD: 1920x1080 and above
    FullHD,
}

/// Get the resolution tier for a given width
pub fn resolution_tier(width: u32) -> ResolutionTier {
    match width {
        w if w >= 1920 => ResolutionTier::FullHD,
        w if w >= 1280 => ResolutionTier::HD,
        _ => ResolutionTier::SD,
    }
}

/// Fixed capture preset
///
/// Both the capture session caps and the muxer's video track use these
/// values, so composited frames can be appended without rescaling.
pub mod capture {
    /// Capture width in pixels
    pub const WIDTH: u32 = 1280;

    /// Capture height in pixels
    pub const HEIGHT: u32 = 720;

    /// Capture framerate (frames per second)
    pub const FRAMERATE: u32 = 30;

    /// Bytes per pixel for the canonical RGBA frame format
    pub const BYTES_PER_PIXEL: u32 = 4;
}

/// Fixed audio parameters
pub mod audio {
    /// Sample rate in Hz
    pub const SAMPLE_RATE: u32 = 48_000;

    /// Channel count (stereo)
    pub const CHANNELS: u32 = 2;

    /// Bytes per interleaved S16LE frame (all channels)
    pub const BYTES_PER_FRAME: u32 = 2 * CHANNELS;

    /// Audio encoder bitrate in bits per second
    pub const ENCODE_BITRATE_BPS: i32 = 128_000;
}

/// Zoom factor bounds
pub mod zoom {
    /// Minimum zoom factor (no zoom)
    pub const MIN_FACTOR: f32 = 1.0;

    /// Default device maximum when the backend reports none
    pub const DEFAULT_MAX_FACTOR: f32 = 8.0;
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Maximum appsink buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Video track appsrc depth; submissions beyond this are dropped,
    /// bounding frames in flight at O(1)
    pub const VIDEO_TRACK_DEPTH: u64 = 4;

    /// Audio track appsrc depth
    pub const AUDIO_TRACK_DEPTH: u64 = 16;

    /// Worker command channel depth
    pub const WORKER_QUEUE_DEPTH: usize = 8;
}

/// Timing constants
pub mod timing {
    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Upper bound on waiting for the muxer to drain and finalize
    pub const FINALIZE_TIMEOUT_SECS: u64 = 10;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_tiers() {
        assert_eq!(resolution_tier(640), ResolutionTier::SD);
        assert_eq!(resolution_tier(1280), ResolutionTier::HD);
        assert_eq!(resolution_tier(1920), ResolutionTier::FullHD);
        assert_eq!(resolution_tier(3840), ResolutionTier::FullHD);
    }

    #[test]
    fn test_capture_preset_matches_bitrate_table() {
        // The fixed preset must land in a tier the bitrate table covers
        let kbps = BitratePreset::Medium.bitrate_kbps(capture::WIDTH, capture::HEIGHT);
        assert_eq!(kbps, 5_000);
    }
}
