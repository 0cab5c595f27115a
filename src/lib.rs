// SPDX-License-Identifier: MPL-2.0

//! EffectCam - camera recording with real-time GPU effects
//!
//! This library implements the capture → composite → record pipeline behind
//! the EffectCam application: camera and microphone capture, a GPU effect
//! compositor, a backpressure-aware recording muxer, and the orchestrator
//! serializing the per-sample flow.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`capture`]: camera/microphone session, device controls, sample types
//! - [`effects`]: effect catalog and the wgpu compositor
//! - [`record`]: epoch-aligned muxing into an MP4 container
//! - [`pipeline`]: the single-worker orchestrator tying the above together
//! - [`config`]: user configuration handling
//! - [`storage`]: output paths and the video-library sink

pub mod capture;
pub mod config;
pub mod constants;
pub mod effects;
pub mod errors;
pub mod pipeline;
pub mod record;
pub mod storage;

// Re-export commonly used types
pub use capture::{CaptureSession, DevicePosition, SessionOptions};
pub use config::Config;
pub use constants::BitratePreset;
pub use effects::{EffectCompositor, EffectKind, EffectState};
pub use errors::{AppError, AppResult, DeviceError, RecordError, RenderError};
pub use pipeline::{CameraPipeline, PipelineEvent, PipelineOptions};
pub use record::{RecordOptions, RecordingMuxer};
