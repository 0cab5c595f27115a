// SPDX-License-Identifier: MPL-2.0

//! Recording: timestamp alignment, encoder selection and muxing

pub mod clock;
pub mod encoders;
pub mod muxer;

pub use clock::EpochClock;
pub use encoders::{
    AudioCodec, SelectedAudioEncoder, SelectedVideoEncoder, log_available_encoders,
    select_audio_encoder, select_video_encoder,
};
pub use muxer::{RecordOptions, RecordingMuxer, RecordingPhase};
