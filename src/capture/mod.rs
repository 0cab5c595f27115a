// SPDX-License-Identifier: MPL-2.0

//! Device capture: camera + microphone acquisition and sample delivery
//!
//! The session delivers every captured sample to an injected [`SampleSink`];
//! the pipeline orchestrator owns the sink implementation and the worker
//! that consumes it.

pub mod enumeration;
pub mod session;
pub mod torch;
pub mod types;

pub use enumeration::{camera_for_position, enumerate_cameras, enumerate_microphones};
pub use session::{CaptureSession, SessionOptions, clamp_zoom, crop_for_zoom};
pub use torch::TorchControl;
pub use types::{
    AudioSample, CameraDescriptor, DevicePosition, MicrophoneDescriptor, SampleSink, VideoSample,
};
