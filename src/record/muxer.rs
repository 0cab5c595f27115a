// SPDX-License-Identifier: MPL-2.0

//! Recording muxer: composited video + captured audio into one MP4
//!
//! The muxer owns a GStreamer encode pipeline fed by two appsrc elements.
//! Submission is gated twice: the session must be in the `Writing` phase and
//! the track's appsrc must have room. A full track means the sample is
//! dropped on the spot — nothing is queued on our side, so memory stays at
//! O(1) frames in flight and the encoder's own flow control is the only
//! backpressure signal.
//!
//! All timestamps pushed into the container are relative to the session
//! epoch (see [`EpochClock`]): the first accepted sample of either media
//! type lands at exactly zero.

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::AppSrc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::clock::EpochClock;
use super::encoders::{select_audio_encoder, select_video_encoder};
use crate::capture::types::{AudioSample, VideoSample};
use crate::constants::{BitratePreset, audio, capture, pipeline as pipeline_consts, timing};
use crate::errors::RecordError;

/// Muxer lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingPhase {
    /// Accepting samples
    Writing,
    /// Stop requested; samples are dropped while the container finalizes
    Finishing,
}

/// Options for a recording session
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub bitrate: BitratePreset,
    pub enable_audio: bool,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            bitrate: BitratePreset::default(),
            enable_audio: true,
        }
    }
}

/// An open recording session writing one video and one audio track
pub struct RecordingMuxer {
    pipeline: gst::Pipeline,
    video_appsrc: AppSrc,
    audio_appsrc: Option<AppSrc>,
    clock: EpochClock,
    phase: RecordingPhase,
    output_path: PathBuf,
    video_submitted: u64,
    video_dropped: u64,
    audio_submitted: u64,
}

impl RecordingMuxer {
    /// Create the write session and start its pipeline
    ///
    /// Fails with a typed error when an encoder or element is missing; a
    /// failure here never disturbs the capture side.
    pub fn start(output_path: PathBuf, options: &RecordOptions) -> Result<Self, RecordError> {
        gst::init().map_err(|e| RecordError::StartFailed(e.to_string()))?;

        info!(
            path = %output_path.display(),
            bitrate = options.bitrate.display_name(),
            audio = options.enable_audio,
            "Starting recording session"
        );

        let bitrate_kbps = options.bitrate.bitrate_kbps(capture::WIDTH, capture::HEIGHT);
        let video_encoder = select_video_encoder(bitrate_kbps)?;
        let audio_encoder = if options.enable_audio {
            match select_audio_encoder(audio::ENCODE_BITRATE_BPS) {
                Ok(encoder) => Some(encoder),
                Err(e) => {
                    warn!("{}; recording without audio", e);
                    None
                }
            }
        } else {
            None
        };

        let pipeline = gst::Pipeline::new();

        // Video track: appsrc -> convert -> encode -> parse -> mux
        let video_appsrc = build_appsrc(video_track_caps(), pipeline_consts::VIDEO_TRACK_DEPTH)?;
        let videoconvert = make_element("videoconvert")?;
        let muxer = make_element("mp4mux")?;
        // Non-streamable output writes the index for seekable playback
        if muxer.has_property("streamable") {
            muxer.set_property("streamable", false);
        }
        let filesink = make_element("filesink")?;
        filesink.set_property("location", output_path.to_string_lossy().as_ref());

        pipeline
            .add_many([
                video_appsrc.upcast_ref::<gst::Element>(),
                &videoconvert,
                &video_encoder.encoder,
                &video_encoder.parser,
                &muxer,
                &filesink,
            ])
            .map_err(|e| RecordError::StartFailed(e.to_string()))?;

        gst::Element::link_many([
            video_appsrc.upcast_ref::<gst::Element>(),
            &videoconvert,
            &video_encoder.encoder,
            &video_encoder.parser,
            &muxer,
        ])
        .map_err(|_| RecordError::StartFailed("Failed to link video track".to_string()))?;

        muxer
            .link(&filesink)
            .map_err(|_| RecordError::StartFailed("Failed to link muxer to filesink".to_string()))?;

        // Audio track: appsrc -> convert -> resample -> encode -> mux
        let audio_appsrc = if let Some(selected) = audio_encoder {
            let appsrc = build_appsrc(audio_track_caps(), pipeline_consts::AUDIO_TRACK_DEPTH)?;
            let audioconvert = make_element("audioconvert")?;
            let audioresample = make_element("audioresample")?;

            pipeline
                .add_many([
                    appsrc.upcast_ref::<gst::Element>(),
                    &audioconvert,
                    &audioresample,
                    &selected.encoder,
                ])
                .map_err(|e| RecordError::StartFailed(e.to_string()))?;

            gst::Element::link_many([
                appsrc.upcast_ref::<gst::Element>(),
                &audioconvert,
                &audioresample,
                &selected.encoder,
            ])
            .map_err(|_| RecordError::StartFailed("Failed to link audio track".to_string()))?;

            selected.encoder.link(&muxer).map_err(|_| {
                RecordError::StartFailed("Failed to link audio encoder to muxer".to_string())
            })?;

            Some(appsrc)
        } else {
            None
        };

        pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| RecordError::StartFailed(e.to_string()))?;

        // Surface immediate failures (bad sink path, encoder refusal) now
        if let Some(bus) = pipeline.bus() {
            if let Some(msg) = bus.timed_pop_filtered(
                gst::ClockTime::from_mseconds(500),
                &[gst::MessageType::Error],
            ) {
                if let gst::MessageView::Error(err) = msg.view() {
                    error!(
                        error = %err.error(),
                        debug = ?err.debug(),
                        "Recording pipeline failed to start"
                    );
                    let _ = pipeline.set_state(gst::State::Null);
                    return Err(RecordError::StartFailed(err.error().to_string()));
                }
            }
        }

        Ok(RecordingMuxer {
            pipeline,
            video_appsrc,
            audio_appsrc,
            clock: EpochClock::new(),
            phase: RecordingPhase::Writing,
            output_path,
            video_submitted: 0,
            video_dropped: 0,
            audio_submitted: 0,
        })
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> RecordingPhase {
        self.phase
    }

    /// Destination file
    pub fn output_path(&self) -> &PathBuf {
        &self.output_path
    }

    /// Whether the epoch has been established yet
    pub fn epoch_established(&self) -> bool {
        self.clock.is_established()
    }

    /// Whether the video track can accept another frame right now
    pub fn video_ready(&self) -> bool {
        self.phase == RecordingPhase::Writing && appsrc_has_room(&self.video_appsrc)
    }

    /// Whether the audio track can accept another chunk right now
    pub fn audio_ready(&self) -> bool {
        self.phase == RecordingPhase::Writing
            && self
                .audio_appsrc
                .as_ref()
                .map(appsrc_has_room)
                .unwrap_or(false)
    }

    /// Append one composited frame to the video track
    ///
    /// Silently drops the frame unless the session is writing and the track
    /// has room; a dropped frame is simply absent from the track.
    pub fn submit_video(&mut self, sample: &VideoSample) {
        if !self.video_ready() {
            if self.phase == RecordingPhase::Writing {
                self.video_dropped += 1;
                debug!(dropped = self.video_dropped, "Video track full, dropping frame");
            }
            return;
        }

        let pts = self.clock.align(sample.pts);
        let mut buffer = gst::Buffer::from_slice(Arc::clone(&sample.data));
        {
            let buffer = buffer.get_mut().expect("freshly created buffer");
            buffer.set_pts(pts);
            buffer.set_duration(gst::ClockTime::from_nseconds(
                1_000_000_000 / capture::FRAMERATE as u64,
            ));
        }

        match self.video_appsrc.push_buffer(buffer) {
            Ok(_) => {
                self.video_submitted += 1;
                if self.video_submitted % timing::FRAME_LOG_INTERVAL == 1 {
                    debug!(frames = self.video_submitted, pts = %pts, "Video frame written");
                }
            }
            Err(flow) => {
                self.video_dropped += 1;
                debug!(error = ?flow, "Video push rejected, frame dropped");
            }
        }
    }

    /// Append one captured audio chunk to the audio track
    pub fn submit_audio(&mut self, sample: &AudioSample) {
        if !self.audio_ready() {
            return;
        }
        let Some(appsrc) = self.audio_appsrc.as_ref() else {
            return;
        };

        let pts = self.clock.align(sample.pts);
        let mut buffer = gst::Buffer::from_slice(Arc::clone(&sample.data));
        {
            let buffer = buffer.get_mut().expect("freshly created buffer");
            buffer.set_pts(pts);
            if sample.rate > 0 {
                let duration_ns = sample.n_frames as u64 * 1_000_000_000 / sample.rate as u64;
                buffer.set_duration(gst::ClockTime::from_nseconds(duration_ns));
            }
        }

        if let Err(flow) = appsrc.push_buffer(buffer) {
            debug!(error = ?flow, "Audio push rejected, chunk dropped");
        } else {
            self.audio_submitted += 1;
        }
    }

    /// Finish both tracks and finalize the container asynchronously
    ///
    /// Consumes the session; submissions racing the stop are dropped by the
    /// caller no longer holding the muxer. `reply` resolves exactly once,
    /// with the finished file path or the finalize error.
    pub fn finish(mut self, reply: oneshot::Sender<Result<PathBuf, RecordError>>) {
        self.phase = RecordingPhase::Finishing;
        info!(
            frames = self.video_submitted,
            dropped = self.video_dropped,
            audio_chunks = self.audio_submitted,
            "Finishing recording"
        );

        let _ = self.video_appsrc.end_of_stream();
        if let Some(audio) = &self.audio_appsrc {
            let _ = audio.end_of_stream();
        }

        let pipeline = self.pipeline.clone();
        let output_path = self.output_path.clone();

        // The drain can take a moment while encoders flush; wait off-worker
        std::thread::spawn(move || {
            let result = wait_for_finalize(&pipeline, output_path);
            let _ = pipeline.set_state(gst::State::Null);
            let _ = reply.send(result);
        });
    }

    /// Convenience wrapper over [`RecordingMuxer::finish`]
    pub fn request_stop(self) -> oneshot::Receiver<Result<PathBuf, RecordError>> {
        let (sender, receiver) = oneshot::channel();
        self.finish(sender);
        receiver
    }
}

impl Drop for RecordingMuxer {
    fn drop(&mut self) {
        // Once finishing, the finalize thread owns pipeline teardown; tearing
        // it down here would race the EOS drain
        if self.phase == RecordingPhase::Writing {
            let _ = self.pipeline.set_state(gst::State::Null);
        }
    }
}

fn wait_for_finalize(
    pipeline: &gst::Pipeline,
    output_path: PathBuf,
) -> Result<PathBuf, RecordError> {
    let Some(bus) = pipeline.bus() else {
        return Err(RecordError::FinalizeFailed("No pipeline bus".to_string()));
    };

    match bus.timed_pop_filtered(
        gst::ClockTime::from_seconds(timing::FINALIZE_TIMEOUT_SECS),
        &[gst::MessageType::Eos, gst::MessageType::Error],
    ) {
        Some(msg) => match msg.view() {
            gst::MessageView::Eos(_) => {
                info!(path = %output_path.display(), "Recording finalized");
                Ok(output_path)
            }
            gst::MessageView::Error(err) => {
                error!(error = %err.error(), debug = ?err.debug(), "Finalize failed");
                Err(RecordError::FinalizeFailed(err.error().to_string()))
            }
            _ => Err(RecordError::FinalizeFailed(
                "Unexpected bus message".to_string(),
            )),
        },
        None => Err(RecordError::FinalizeFailed(
            "Timed out waiting for end of stream".to_string(),
        )),
    }
}

fn appsrc_has_room(appsrc: &AppSrc) -> bool {
    let max: u64 = appsrc.property("max-buffers");
    let level: u64 = appsrc.property("current-level-buffers");
    max == 0 || level < max
}

fn make_element(name: &str) -> Result<gst::Element, RecordError> {
    gst::ElementFactory::make(name)
        .build()
        .map_err(|e| RecordError::StartFailed(format!("Failed to create {}: {}", name, e)))
}

fn build_appsrc(caps: gst::Caps, depth: u64) -> Result<AppSrc, RecordError> {
    let appsrc = gst::ElementFactory::make("appsrc")
        .build()
        .map_err(|e| RecordError::StartFailed(format!("Failed to create appsrc: {}", e)))?
        .dynamic_cast::<AppSrc>()
        .map_err(|_| RecordError::StartFailed("Failed to cast appsrc".to_string()))?;

    appsrc.set_caps(Some(&caps));
    appsrc.set_format(gst::Format::Time);
    appsrc.set_property("is-live", true);
    appsrc.set_property("block", false);
    appsrc.set_property("do-timestamp", false);
    appsrc.set_property("max-buffers", depth);
    Ok(appsrc)
}

fn video_track_caps() -> gst::Caps {
    gst::Caps::builder("video/x-raw")
        .field("format", "RGBA")
        .field("width", capture::WIDTH as i32)
        .field("height", capture::HEIGHT as i32)
        .field("framerate", gst::Fraction::new(capture::FRAMERATE as i32, 1))
        .build()
}

fn audio_track_caps() -> gst::Caps {
    gst::Caps::builder("audio/x-raw")
        .field("format", "S16LE")
        .field("layout", "interleaved")
        .field("rate", audio::SAMPLE_RATE as i32)
        .field("channels", audio::CHANNELS as i32)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pts_ms: u64) -> VideoSample {
        let data = vec![0u8; (capture::WIDTH * capture::HEIGHT * 4) as usize];
        VideoSample {
            width: capture::WIDTH,
            height: capture::HEIGHT,
            stride: capture::WIDTH * 4,
            data: Arc::from(data.into_boxed_slice()),
            pts: gst::ClockTime::from_mseconds(pts_ms),
        }
    }

    // End-to-end mux exercising epoch alignment and finalize; skipped when
    // the needed GStreamer elements are not installed.
    #[test]
    fn test_record_writes_playable_file() {
        if gst::init().is_err() {
            println!("Skipping test (no GStreamer)");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        let options = RecordOptions {
            enable_audio: false,
            ..Default::default()
        };

        let mut muxer = match RecordingMuxer::start(path.clone(), &options) {
            Ok(m) => m,
            Err(e) => {
                println!("Skipping test (encoder unavailable): {}", e);
                return;
            }
        };

        assert!(!muxer.epoch_established());
        for i in 0..10u64 {
            muxer.submit_video(&frame(100_000 + i * 33));
        }
        assert!(muxer.epoch_established());

        let receiver = muxer.request_stop();
        let result = receiver.blocking_recv().expect("stop resolves once");
        let finished = result.expect("finalize reports success");
        assert_eq!(finished, path);

        let len = std::fs::metadata(&path).unwrap().len();
        assert!(len > 0, "finished file must not be empty");
    }

    #[test]
    fn test_submissions_after_stop_are_dropped() {
        if gst::init().is_err() {
            println!("Skipping test (no GStreamer)");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let options = RecordOptions {
            enable_audio: false,
            ..Default::default()
        };
        let mut muxer = match RecordingMuxer::start(dir.path().join("clip.mp4"), &options) {
            Ok(m) => m,
            Err(e) => {
                println!("Skipping test (encoder unavailable): {}", e);
                return;
            }
        };

        muxer.submit_video(&frame(0));
        muxer.phase = RecordingPhase::Finishing;
        assert!(!muxer.video_ready());
        let before = muxer.video_submitted;
        muxer.submit_video(&frame(33));
        assert_eq!(muxer.video_submitted, before);
    }

    #[test]
    fn test_audio_submit_without_track_is_noop() {
        if gst::init().is_err() {
            println!("Skipping test (no GStreamer)");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let options = RecordOptions {
            enable_audio: false,
            ..Default::default()
        };
        let mut muxer = match RecordingMuxer::start(dir.path().join("clip.mp4"), &options) {
            Ok(m) => m,
            Err(e) => {
                println!("Skipping test (encoder unavailable): {}", e);
                return;
            }
        };

        assert!(!muxer.audio_ready());
        let chunk = AudioSample {
            data: Arc::from(vec![0u8; 1920].into_boxed_slice()),
            n_frames: 480,
            rate: audio::SAMPLE_RATE,
            channels: audio::CHANNELS,
            pts: gst::ClockTime::ZERO,
        };
        muxer.submit_audio(&chunk);
        assert_eq!(muxer.audio_submitted, 0);
        // Audio must not establish the epoch when it was never accepted
        assert!(!muxer.epoch_established());
    }
}
