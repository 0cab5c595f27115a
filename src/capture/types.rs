// SPDX-License-Identifier: MPL-2.0

//! Shared types for the capture session

use gstreamer as gst;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::{audio, capture};

/// Physical position of a camera on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DevicePosition {
    /// User-facing camera
    Front,
    /// World-facing camera
    #[default]
    Back,
}

impl DevicePosition {
    /// The opposite position, used by the flip operation
    pub fn opposite(&self) -> DevicePosition {
        match self {
            DevicePosition::Front => DevicePosition::Back,
            DevicePosition::Back => DevicePosition::Front,
        }
    }
}

impl std::fmt::Display for DevicePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DevicePosition::Front => write!(f, "front"),
            DevicePosition::Back => write!(f, "back"),
        }
    }
}

/// A camera discovered on the system
#[derive(Debug, Clone)]
pub struct CameraDescriptor {
    /// Human-readable name
    pub name: String,
    /// PipeWire object serial used as pipewiresrc target
    pub serial: String,
    /// Physical position, derived from device properties
    pub position: DevicePosition,
    /// Maximum zoom factor the device supports
    pub max_zoom: f32,
}

/// An audio input discovered on the system
#[derive(Debug, Clone)]
pub struct MicrophoneDescriptor {
    /// Human-readable name
    pub name: String,
    /// PipeWire object serial used as pipewiresrc target
    pub serial: String,
    /// PipeWire node name
    pub node_name: String,
    /// Whether this is the session default source
    pub is_default: bool,
}

/// One captured and decoded video frame (RGBA, tightly packed)
#[derive(Debug, Clone)]
pub struct VideoSample {
    pub width: u32,
    pub height: u32,
    /// Row stride in bytes
    pub stride: u32,
    /// RGBA pixel data
    pub data: Arc<[u8]>,
    /// Presentation timestamp on the capture pipeline clock
    pub pts: gst::ClockTime,
}

impl VideoSample {
    /// Expected tightly-packed byte length for the frame dimensions
    pub fn packed_len(&self) -> usize {
        (self.width * self.height * capture::BYTES_PER_PIXEL) as usize
    }
}

/// One captured audio chunk (interleaved S16LE)
#[derive(Debug, Clone)]
pub struct AudioSample {
    /// Interleaved S16LE samples for all channels
    pub data: Arc<[u8]>,
    /// Frames in this chunk (one frame = one sample per channel)
    pub n_frames: usize,
    pub rate: u32,
    pub channels: u32,
    /// Presentation timestamp on the capture pipeline clock
    pub pts: gst::ClockTime,
}

impl AudioSample {
    /// Number of frames represented by a raw byte length
    pub fn frames_for_len(len: usize) -> usize {
        len / audio::BYTES_PER_FRAME as usize
    }
}

/// Sink receiving every captured sample
///
/// Injected into the capture session at configuration time; the session
/// calls it from its streaming threads, so implementations must hand off
/// without blocking (drop on overflow, never queue unboundedly).
pub trait SampleSink: Send + Sync {
    fn video_sample(&self, sample: VideoSample);
    fn audio_sample(&self, sample: AudioSample);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_opposite() {
        assert_eq!(DevicePosition::Front.opposite(), DevicePosition::Back);
        assert_eq!(DevicePosition::Back.opposite(), DevicePosition::Front);
    }

    #[test]
    fn test_audio_frames_for_len() {
        // 4 bytes per stereo S16LE frame
        assert_eq!(AudioSample::frames_for_len(4800 * 4), 4800);
        assert_eq!(AudioSample::frames_for_len(0), 0);
    }
}
