// SPDX-License-Identifier: MPL-2.0

//! Capture session owning the camera and microphone devices
//!
//! One GStreamer pipeline carries both media branches so video and audio
//! timestamps come from the same pipeline clock and can be aligned by the
//! recording muxer:
//!
//! ```text
//! pipewiresrc ─ videoconvert ─ videoscale ─ caps(RGBA WxH@fps) ─ videoflip ─
//!     videocrop ─ videoscale ─ caps(RGBA WxH) ─ appsink
//! pipewiresrc(audio) ─ audioconvert ─ audioresample ─ caps(S16LE) ─ appsink
//! ```
//!
//! Every accepted sample is handed to the injected [`SampleSink`] exactly
//! once, on the pipeline's streaming threads; sinks must not block.

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use super::enumeration::{camera_for_position, enumerate_cameras, enumerate_microphones};
use super::torch::TorchControl;
use super::types::{
    AudioSample, CameraDescriptor, DevicePosition, MicrophoneDescriptor, SampleSink, VideoSample,
};
use crate::constants::{audio, capture, pipeline as pipeline_consts, timing, zoom};
use crate::errors::DeviceError;

static VIDEO_FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);
static AUDIO_CHUNK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Options for opening a capture session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Preferred camera position
    pub position: DevicePosition,
    /// Mirror frames from front-position cameras (selfie view)
    pub mirror_front: bool,
    /// Capture microphone audio
    pub enable_audio: bool,
    /// Explicit camera index into the enumeration, overriding `position`
    pub camera_index: Option<usize>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            position: DevicePosition::Back,
            mirror_front: true,
            enable_audio: true,
            camera_index: None,
        }
    }
}

/// Capture session owning camera + microphone wiring
pub struct CaptureSession {
    pipeline: gst::Pipeline,
    video_source: gst::Element,
    video_entry: gst::Element,
    videoflip: gst::Element,
    videocrop: gst::Element,
    _video_appsink: AppSink,
    _audio_appsink: Option<AppSink>,
    cameras: Vec<CameraDescriptor>,
    current: CameraDescriptor,
    zoom_factor: f32,
    torch: TorchControl,
    mirror_front: bool,
    running: bool,
}

impl CaptureSession {
    /// Acquire devices and wire the capture pipeline
    ///
    /// The injected sink receives every accepted sample; delivery starts
    /// once [`CaptureSession::start`] is called.
    pub fn configure(
        sink: Arc<dyn SampleSink>,
        options: &SessionOptions,
    ) -> Result<CaptureSession, DeviceError> {
        gst::init().map_err(|e| DeviceError::InitializationFailed(e.to_string()))?;

        let cameras = enumerate_cameras();
        if cameras.is_empty() {
            return Err(DeviceError::NoCameraFound);
        }

        let current = match options.camera_index {
            Some(index) => cameras
                .get(index)
                .cloned()
                .ok_or_else(|| DeviceError::NoCameraFound)?,
            None => camera_for_position(&cameras, options.position)
                .ok_or(DeviceError::NoCameraFound)?,
        };

        info!(
            camera = %current.name,
            position = %current.position,
            audio = options.enable_audio,
            "Configuring capture session"
        );

        let pipeline = gst::Pipeline::new();

        // Video branch
        let video_source = build_video_source(&current.serial)?;
        let convert_in = make_element("videoconvert")?;
        let scale_in = make_element("videoscale")?;
        let caps_in = make_element("capsfilter")?;
        caps_in.set_property("caps", video_caps(true));
        let videoflip = make_element("videoflip")?;
        let videocrop = make_element("videocrop")?;
        let scale_out = make_element("videoscale")?;
        let caps_out = make_element("capsfilter")?;
        caps_out.set_property("caps", video_caps(false));

        let video_appsink = build_appsink(video_caps(false))?;

        pipeline
            .add_many([
                &video_source,
                &convert_in,
                &scale_in,
                &caps_in,
                &videoflip,
                &videocrop,
                &scale_out,
                &caps_out,
                video_appsink.upcast_ref::<gst::Element>(),
            ])
            .map_err(|e| DeviceError::InitializationFailed(e.to_string()))?;

        gst::Element::link_many([
            &video_source,
            &convert_in,
            &scale_in,
            &caps_in,
            &videoflip,
            &videocrop,
            &scale_out,
            &caps_out,
            video_appsink.upcast_ref::<gst::Element>(),
        ])
        .map_err(|_| {
            DeviceError::InitializationFailed("Failed to link video branch".to_string())
        })?;

        install_video_callback(&video_appsink, Arc::clone(&sink));

        // Audio branch
        let audio_appsink = if options.enable_audio {
            let microphones = enumerate_microphones();
            let audio_source = build_audio_source(microphones.first())?;
            let audioconvert = make_element("audioconvert")?;
            let audioresample = make_element("audioresample")?;
            let audio_caps_filter = make_element("capsfilter")?;
            audio_caps_filter.set_property("caps", audio_caps());
            let audio_appsink = build_appsink(audio_caps())?;

            pipeline
                .add_many([
                    &audio_source,
                    &audioconvert,
                    &audioresample,
                    &audio_caps_filter,
                    audio_appsink.upcast_ref::<gst::Element>(),
                ])
                .map_err(|e| DeviceError::InitializationFailed(e.to_string()))?;

            gst::Element::link_many([
                &audio_source,
                &audioconvert,
                &audioresample,
                &audio_caps_filter,
                audio_appsink.upcast_ref::<gst::Element>(),
            ])
            .map_err(|_| {
                DeviceError::InitializationFailed("Failed to link audio branch".to_string())
            })?;

            install_audio_callback(&audio_appsink, sink);
            Some(audio_appsink)
        } else {
            None
        };

        let session = CaptureSession {
            pipeline,
            video_source,
            video_entry: convert_in,
            videoflip,
            videocrop,
            _video_appsink: video_appsink,
            _audio_appsink: audio_appsink,
            cameras,
            current: current.clone(),
            zoom_factor: zoom::MIN_FACTOR,
            torch: TorchControl::discover(),
            mirror_front: options.mirror_front,
            running: false,
        };
        session.apply_mirroring();

        Ok(session)
    }

    /// Start hardware capture
    ///
    /// Idempotent; the blocking state change runs on a background thread so
    /// the caller is never stalled on device spin-up.
    pub fn start(&mut self) {
        if self.running {
            debug!("Capture session already running");
            return;
        }
        self.running = true;

        let pipeline = self.pipeline.clone();
        std::thread::spawn(move || {
            if let Err(e) = pipeline.set_state(gst::State::Playing) {
                warn!(error = %e, "Failed to start capture pipeline");
                return;
            }
            let (result, state, _) = pipeline.state(gst::ClockTime::from_seconds(
                timing::START_TIMEOUT_SECS,
            ));
            match result {
                Ok(_) => info!(state = ?state, "Capture pipeline running"),
                Err(e) => warn!(error = %e, state = ?state, "Capture pipeline failed to start"),
            }
        });
    }

    /// Stop hardware capture
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;

        info!("Stopping capture pipeline");
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            warn!(error = %e, "Failed to stop capture pipeline");
        }
        let _ = self
            .pipeline
            .state(gst::ClockTime::from_seconds(timing::STOP_TIMEOUT_SECS));
    }

    /// Whether capture has been started
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current camera position
    pub fn position(&self) -> DevicePosition {
        self.current.position
    }

    /// Current camera descriptor
    pub fn current_camera(&self) -> &CameraDescriptor {
        &self.current
    }

    /// Current zoom factor
    pub fn zoom_factor(&self) -> f32 {
        self.zoom_factor
    }

    /// Whether the torch is currently on
    pub fn torch_on(&self) -> bool {
        self.torch.is_on()
    }

    /// Switch to the opposite-position camera under one reconfiguration
    /// transaction
    ///
    /// If the new input cannot be installed the old input is restored and an
    /// error is returned; the session is never left without a video input.
    /// Zoom resets to 1.0 because lens limits differ by position.
    pub fn flip_position(&mut self) -> Result<DevicePosition, DeviceError> {
        let target = self.current.position.opposite();
        let next = self
            .cameras
            .iter()
            .find(|c| c.position == target)
            .cloned()
            .ok_or_else(|| DeviceError::PositionUnavailable(target.to_string()))?;

        info!(from = %self.current.position, to = %target, camera = %next.name, "Flipping camera");

        let new_source = build_video_source(&next.serial)?;

        let was_playing = self.running;
        if was_playing {
            let _ = self.pipeline.set_state(gst::State::Paused);
        }

        let old_source = self.video_source.clone();
        old_source.unlink(&self.video_entry);
        let _ = old_source.set_state(gst::State::Null);
        if let Err(e) = self.pipeline.remove(&old_source) {
            self.restore_source(&old_source, was_playing);
            return Err(DeviceError::ReconfigurationFailed(e.to_string()));
        }

        let installed = self
            .pipeline
            .add(&new_source)
            .map_err(|e| e.to_string())
            .and_then(|_| {
                new_source.link(&self.video_entry).map_err(|_| {
                    let _ = self.pipeline.remove(&new_source);
                    "Failed to link new video source".to_string()
                })
            });

        if let Err(msg) = installed {
            warn!(error = %msg, "Flip failed, restoring previous camera");
            self.restore_source(&old_source, was_playing);
            return Err(DeviceError::ReconfigurationFailed(msg));
        }

        let _ = new_source.sync_state_with_parent();
        if was_playing {
            let _ = self.pipeline.set_state(gst::State::Playing);
        }

        self.video_source = new_source;
        self.current = next;
        self.zoom_factor = zoom::MIN_FACTOR;
        self.apply_crop();
        self.apply_mirroring();

        Ok(target)
    }

    /// Apply a zoom factor, clamped into [1.0, device max]
    ///
    /// Returns the factor actually applied.
    pub fn set_zoom(&mut self, factor: f32) -> f32 {
        let clamped = clamp_zoom(factor, self.current.max_zoom);
        self.zoom_factor = clamped;
        self.apply_crop();
        debug!(requested = factor, applied = clamped, "Zoom updated");
        clamped
    }

    /// Toggle the torch; returns the resulting state
    ///
    /// No-op returning `false` when the hardware lacks a torch.
    pub fn toggle_torch(&mut self) -> bool {
        self.torch.toggle()
    }

    /// Re-add the previous source after a failed flip
    fn restore_source(&mut self, old_source: &gst::Element, was_playing: bool) {
        if old_source.parent().is_none() {
            if self.pipeline.add(old_source).is_err() {
                warn!("Could not restore previous camera source");
                return;
            }
        }
        if old_source.link(&self.video_entry).is_err() {
            warn!("Could not relink previous camera source");
        }
        let _ = old_source.sync_state_with_parent();
        if was_playing {
            let _ = self.pipeline.set_state(gst::State::Playing);
        }
    }

    fn apply_crop(&self) {
        let (left, right, top, bottom) =
            crop_for_zoom(capture::WIDTH, capture::HEIGHT, self.zoom_factor);
        self.videocrop.set_property("left", left as i32);
        self.videocrop.set_property("right", right as i32);
        self.videocrop.set_property("top", top as i32);
        self.videocrop.set_property("bottom", bottom as i32);
    }

    fn apply_mirroring(&self) {
        let mirror = self.mirror_front && self.current.position == DevicePosition::Front;
        let method = if mirror { "horizontal-flip" } else { "none" };
        self.videoflip.set_property_from_str("method", method);
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        // Release the devices immediately rather than waiting on GC
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

/// Clamp a requested zoom factor into the device's supported range
pub fn clamp_zoom(factor: f32, device_max: f32) -> f32 {
    let max = device_max.max(zoom::MIN_FACTOR);
    if factor.is_nan() {
        return zoom::MIN_FACTOR;
    }
    factor.clamp(zoom::MIN_FACTOR, max)
}

/// Centered crop rectangle realizing a digital zoom factor
///
/// Returns (left, right, top, bottom) pixel counts for videocrop. Values are
/// kept even so downstream chroma-subsampled converters stay happy.
pub fn crop_for_zoom(width: u32, height: u32, factor: f32) -> (u32, u32, u32, u32) {
    if factor <= 1.0 {
        return (0, 0, 0, 0);
    }
    let visible_w = (width as f32 / factor) as u32;
    let visible_h = (height as f32 / factor) as u32;
    let crop_x = ((width - visible_w.min(width)) / 2) & !1;
    let crop_y = ((height - visible_h.min(height)) / 2) & !1;
    (crop_x, crop_x, crop_y, crop_y)
}

fn make_element(name: &str) -> Result<gst::Element, DeviceError> {
    gst::ElementFactory::make(name)
        .build()
        .map_err(|e| DeviceError::InitializationFailed(format!("Failed to create {}: {}", name, e)))
}

fn build_video_source(serial: &str) -> Result<gst::Element, DeviceError> {
    let mut builder = gst::ElementFactory::make("pipewiresrc").property("do-timestamp", true);
    if serial != "0" {
        builder = builder.property("target-object", serial);
    }
    builder
        .build()
        .map_err(|e| DeviceError::InitializationFailed(format!("Failed to create pipewiresrc: {}", e)))
}

fn build_audio_source(device: Option<&MicrophoneDescriptor>) -> Result<gst::Element, DeviceError> {
    let mut builder = gst::ElementFactory::make("pipewiresrc")
        .property("do-timestamp", true)
        .property("keepalive-time", 1000)
        .property("resend-last", false);

    if let Some(device) = device {
        info!(microphone = %device.name, "Using audio source");
        builder = builder.property("target-object", device.serial.as_str());
    } else {
        info!("Using default PipeWire audio source");
    }

    builder.build().map_err(|e| {
        DeviceError::InitializationFailed(format!("Failed to create audio source: {}", e))
    })
}

fn video_caps(with_framerate: bool) -> gst::Caps {
    let mut builder = gst::Caps::builder("video/x-raw")
        .field("format", "RGBA")
        .field("width", capture::WIDTH as i32)
        .field("height", capture::HEIGHT as i32);
    if with_framerate {
        builder = builder.field(
            "framerate",
            gst::Fraction::new(capture::FRAMERATE as i32, 1),
        );
    }
    builder.build()
}

fn audio_caps() -> gst::Caps {
    gst::Caps::builder("audio/x-raw")
        .field("format", "S16LE")
        .field("layout", "interleaved")
        .field("rate", audio::SAMPLE_RATE as i32)
        .field("channels", audio::CHANNELS as i32)
        .build()
}

fn build_appsink(caps: gst::Caps) -> Result<AppSink, DeviceError> {
    let appsink = gst::ElementFactory::make("appsink")
        .build()
        .map_err(|e| DeviceError::InitializationFailed(format!("Failed to create appsink: {}", e)))?
        .dynamic_cast::<AppSink>()
        .map_err(|_| DeviceError::InitializationFailed("Failed to cast appsink".to_string()))?;

    appsink.set_caps(Some(&caps));
    appsink.set_property("emit-signals", false);
    appsink.set_property("sync", false);
    appsink.set_property("max-buffers", pipeline_consts::MAX_BUFFERS);
    appsink.set_property("drop", true);
    appsink.set_property("enable-last-sample", false);
    Ok(appsink)
}

fn install_video_callback(appsink: &AppSink, sink: Arc<dyn SampleSink>) {
    appsink.set_callbacks(
        gstreamer_app::AppSinkCallbacks::builder()
            .new_sample(move |appsink| {
                let frame_num = VIDEO_FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);

                let sample = appsink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;

                let Some(pts) = buffer.pts() else {
                    // A frame without a timestamp cannot be aligned downstream
                    if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                        warn!(frame = frame_num, "Dropping video frame without pts");
                    }
                    return Ok(gst::FlowSuccess::Ok);
                };

                let caps = sample.caps().ok_or(gst::FlowError::Error)?;
                let video_info =
                    VideoInfo::from_caps(caps).map_err(|_| gst::FlowError::Error)?;
                let map = buffer.map_readable().map_err(|_| gst::FlowError::Error)?;

                let frame = VideoSample {
                    width: video_info.width(),
                    height: video_info.height(),
                    stride: video_info.stride()[0] as u32,
                    data: Arc::from(map.as_slice()),
                    pts,
                };

                if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                    debug!(
                        frame = frame_num,
                        width = frame.width,
                        height = frame.height,
                        pts = %pts,
                        "Video frame captured"
                    );
                }

                sink.video_sample(frame);
                Ok(gst::FlowSuccess::Ok)
            })
            .build(),
    );
}

fn install_audio_callback(appsink: &AppSink, sink: Arc<dyn SampleSink>) {
    appsink.set_callbacks(
        gstreamer_app::AppSinkCallbacks::builder()
            .new_sample(move |appsink| {
                let chunk_num = AUDIO_CHUNK_COUNTER.fetch_add(1, Ordering::Relaxed);

                let sample = appsink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;

                let Some(pts) = buffer.pts() else {
                    return Ok(gst::FlowSuccess::Ok);
                };

                let map = buffer.map_readable().map_err(|_| gst::FlowError::Error)?;
                let chunk = AudioSample {
                    n_frames: AudioSample::frames_for_len(map.len()),
                    data: Arc::from(map.as_slice()),
                    rate: audio::SAMPLE_RATE,
                    channels: audio::CHANNELS,
                    pts,
                };

                if chunk_num % (timing::FRAME_LOG_INTERVAL * 4) == 0 {
                    debug!(
                        chunk = chunk_num,
                        frames = chunk.n_frames,
                        pts = %pts,
                        "Audio chunk captured"
                    );
                }

                sink.audio_sample(chunk);
                Ok(gst::FlowSuccess::Ok)
            })
            .build(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_zoom_bounds() {
        assert_eq!(clamp_zoom(50.0, 5.0), 5.0);
        assert_eq!(clamp_zoom(0.1, 5.0), 1.0);
        assert_eq!(clamp_zoom(2.5, 5.0), 2.5);
        assert_eq!(clamp_zoom(f32::NAN, 5.0), 1.0);
        // A bogus device max never allows zooming below 1.0
        assert_eq!(clamp_zoom(3.0, 0.5), 1.0);
    }

    #[test]
    fn test_crop_for_zoom_identity() {
        assert_eq!(crop_for_zoom(1280, 720, 1.0), (0, 0, 0, 0));
        assert_eq!(crop_for_zoom(1280, 720, 0.5), (0, 0, 0, 0));
    }

    #[test]
    fn test_crop_for_zoom_is_centered_and_even() {
        let (l, r, t, b) = crop_for_zoom(1280, 720, 2.0);
        assert_eq!(l, r);
        assert_eq!(t, b);
        assert_eq!(l % 2, 0);
        assert_eq!(t % 2, 0);
        // 2x zoom keeps half the image: 1280 -> 640 visible, 320 per side
        assert_eq!(l, 320);
        assert_eq!(t, 180);
    }

    #[test]
    fn test_crop_for_zoom_extreme_factor() {
        let (l, r, t, b) = crop_for_zoom(1280, 720, 1000.0);
        assert!(l + r < 1280);
        assert!(t + b < 720);
    }
}
