// SPDX-License-Identifier: MPL-2.0

//! Encoder selection for the recording muxer
//!
//! Probes GStreamer element factories in priority order: hardware H.264
//! first, software fallbacks after; Opus first for audio with AAC as the
//! compatibility fallback. Selection happens once per recording session so
//! a missing encoder surfaces as a typed start failure, never mid-write.

use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::{debug, info};

use crate::constants::capture;
use crate::errors::RecordError;

/// H.264 encoder candidates, best first
const VIDEO_ENCODER_CANDIDATES: &[&str] = &["vah264enc", "vaapih264enc", "x264enc", "openh264enc"];

/// Selected video encoder with its parser
pub struct SelectedVideoEncoder {
    /// The encoder element, bitrate already configured
    pub encoder: gst::Element,
    /// Stream-format parser required by the muxer
    pub parser: gst::Element,
    /// Factory name, for logging
    pub name: &'static str,
}

/// Audio codec types in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    /// Opus codec (preferred - best quality)
    Opus,
    /// AAC codec (fallback - good compatibility)
    Aac,
}

/// Selected audio encoder with configuration
pub struct SelectedAudioEncoder {
    pub encoder: gst::Element,
    pub codec: AudioCodec,
}

/// Select the best available H.264 encoder and configure its bitrate
pub fn select_video_encoder(bitrate_kbps: u32) -> Result<SelectedVideoEncoder, RecordError> {
    for &name in VIDEO_ENCODER_CANDIDATES {
        if gst::ElementFactory::find(name).is_none() {
            debug!(encoder = name, "Encoder factory not available");
            continue;
        }

        let encoder = match gst::ElementFactory::make(name).build() {
            Ok(e) => e,
            Err(e) => {
                debug!(encoder = name, error = %e, "Failed to create encoder");
                continue;
            }
        };

        configure_video_bitrate(&encoder, name, bitrate_kbps);

        let parser = gst::ElementFactory::make("h264parse").build().map_err(|e| {
            RecordError::EncoderNotAvailable(format!("Failed to create h264parse: {}", e))
        })?;

        info!(encoder = name, bitrate_kbps, "Selected video encoder");
        return Ok(SelectedVideoEncoder {
            encoder,
            parser,
            name,
        });
    }

    Err(RecordError::EncoderNotAvailable(
        "No H.264 encoder found (tried VA-API, x264, openh264)".to_string(),
    ))
}

/// Select the best available audio encoder
///
/// Priority order:
/// 1. Opus (best quality)
/// 2. AAC (good fallback)
pub fn select_audio_encoder(bitrate_bps: i32) -> Result<SelectedAudioEncoder, RecordError> {
    if gst::ElementFactory::find("opusenc").is_some() {
        let encoder = gst::ElementFactory::make("opusenc")
            .property("bitrate", bitrate_bps)
            .build()
            .map_err(|e| {
                RecordError::EncoderNotAvailable(format!("Failed to create opusenc: {}", e))
            })?;
        info!(bitrate_bps, "Selected Opus audio encoder");
        return Ok(SelectedAudioEncoder {
            encoder,
            codec: AudioCodec::Opus,
        });
    }

    if gst::ElementFactory::find("avenc_aac").is_some() {
        // avenc_aac's generated bitrate property type varies across gst-libav
        // versions; the default track bitrate is acceptable for the fallback
        let encoder = gst::ElementFactory::make("avenc_aac").build().map_err(|e| {
            RecordError::EncoderNotAvailable(format!("Failed to create avenc_aac: {}", e))
        })?;
        info!("Selected AAC audio encoder");
        return Ok(SelectedAudioEncoder {
            encoder,
            codec: AudioCodec::Aac,
        });
    }

    Err(RecordError::EncoderNotAvailable(
        "No audio encoder found (tried Opus, AAC)".to_string(),
    ))
}

/// Apply the target bitrate using each encoder family's property convention
fn configure_video_bitrate(encoder: &gst::Element, name: &str, bitrate_kbps: u32) {
    match name {
        // VA-API and x264 take kbps
        "vah264enc" | "vaapih264enc" | "x264enc" => {
            encoder.set_property("bitrate", bitrate_kbps);
        }
        // openh264 takes bps
        "openh264enc" => {
            encoder.set_property("bitrate", bitrate_kbps.saturating_mul(1000));
        }
        _ => {}
    }

    if name == "x264enc" {
        // Keyframe each second at the fixed framerate; realtime-friendly preset
        encoder.set_property("key-int-max", capture::FRAMERATE);
        encoder.set_property_from_str("speed-preset", "veryfast");
        encoder.set_property_from_str("tune", "zerolatency");
    }
}

/// Log which encoders are present; used by the CLI `list` command
pub fn log_available_encoders() {
    for &name in VIDEO_ENCODER_CANDIDATES {
        let available = gst::ElementFactory::find(name).is_some();
        info!(encoder = name, available, "Video encoder probe");
    }
    for name in ["opusenc", "avenc_aac"] {
        let available = gst::ElementFactory::find(name).is_some();
        info!(encoder = name, available, "Audio encoder probe");
    }
}
