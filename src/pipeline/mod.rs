// SPDX-License-Identifier: MPL-2.0

//! Pipeline orchestrator
//!
//! One worker thread serializes every capture callback and recording-state
//! change: samples and control messages enter the same bounded channel, so
//! the muxer only ever sees frames in arrival order and an epoch can never
//! be established twice. The worker exclusively owns the GPU compositor and
//! the live muxer; callers interact through the [`CameraPipeline`] handle.
//!
//! Per video sample the worker first presents the preview (only when a
//! display surface is attached; failures skip the frame) and then, when
//! recording, runs the blocking record composite and submits the result.
//! The two composites are independent GPU submissions: a record failure
//! leaves the preview untouched and vice versa. Audio is forwarded only
//! while recording.

use futures::SinkExt;
use futures::StreamExt;
use futures::channel::mpsc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::capture::types::{AudioSample, SampleSink, VideoSample};
use crate::capture::{CaptureSession, DevicePosition, SessionOptions};
use crate::constants::pipeline as pipeline_consts;
use crate::effects::{EffectCompositor, EffectKind, EffectState};
use crate::errors::{AppError, DeviceError, RecordError};
use crate::record::{RecordOptions, RecordingMuxer};

/// Latest-value event published to the UI-facing sink
///
/// Carried over a `watch` channel: readers always see the newest state and
/// can never block the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// No recording in progress
    Idle,
    /// A recording session is writing
    Recording,
    /// The last recording finalized successfully
    Saved(PathBuf),
    /// The last recording failed
    RecordingFailed(String),
}

/// Recording lifecycle as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordState {
    Idle,
    Writing,
    Finishing,
}

/// Guard for "exactly one recording session at a time"
fn try_begin_recording(state: &mut RecordState) -> Result<(), RecordError> {
    match state {
        RecordState::Idle => {
            *state = RecordState::Writing;
            Ok(())
        }
        // A live or still-finalizing session blocks a new start and is left
        // untouched
        RecordState::Writing | RecordState::Finishing => Err(RecordError::AlreadyRecording),
    }
}

/// Returns whether a stop request should proceed; stop while idle is a no-op
fn try_finish_recording(state: &mut RecordState) -> bool {
    match state {
        RecordState::Writing => {
            *state = RecordState::Finishing;
            true
        }
        RecordState::Idle | RecordState::Finishing => false,
    }
}

/// Messages draining through the worker, in arrival order
enum WorkerMessage {
    Video(VideoSample),
    Audio(AudioSample),
    StartRecording(RecordingMuxer),
    StopRecording {
        reply: oneshot::Sender<Result<PathBuf, RecordError>>,
    },
    AttachDisplay {
        target: wgpu::SurfaceTarget<'static>,
        width: u32,
        height: u32,
        reply: oneshot::Sender<Result<(), crate::errors::RenderError>>,
    },
    DetachDisplay,
    Shutdown,
}

/// Sample sink feeding the worker channel
///
/// Capture threads never block: a full channel drops the sample (preview
/// loss is acceptable; timestamps stay truthful because they are
/// pts-derived, not counted).
struct ChannelSink {
    sender: mpsc::Sender<WorkerMessage>,
    dropped: AtomicU64,
}

impl ChannelSink {
    fn forward(&self, message: WorkerMessage) {
        let mut sender = self.sender.clone();
        if sender.try_send(message).is_err() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if dropped % 30 == 1 {
                debug!(dropped, "Worker queue full, sample dropped");
            }
        }
    }
}

impl SampleSink for ChannelSink {
    fn video_sample(&self, sample: VideoSample) {
        self.forward(WorkerMessage::Video(sample));
    }

    fn audio_sample(&self, sample: AudioSample) {
        self.forward(WorkerMessage::Audio(sample));
    }
}

/// Options for building the full pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub session: SessionOptions,
    pub effect: EffectKind,
    pub intensity: f32,
}

/// The capture → composite → record pipeline
pub struct CameraPipeline {
    session: CaptureSession,
    effects: Arc<EffectState>,
    sender: mpsc::Sender<WorkerMessage>,
    worker: Option<JoinHandle<()>>,
    record_state: Arc<Mutex<RecordState>>,
    recording: Arc<AtomicBool>,
    events: Arc<watch::Sender<PipelineEvent>>,
    events_rx: watch::Receiver<PipelineEvent>,
}

impl CameraPipeline {
    /// Build the pipeline: spawn the worker (which owns the GPU compositor)
    /// and configure the capture session wired into it
    pub fn new(options: PipelineOptions) -> Result<CameraPipeline, AppError> {
        let effects = Arc::new(EffectState::new(options.effect, options.intensity));
        let (sender, receiver) = mpsc::channel(pipeline_consts::WORKER_QUEUE_DEPTH);
        let (events_tx, events_rx) = watch::channel(PipelineEvent::Idle);
        let events = Arc::new(events_tx);

        // The worker owns all GPU state; report compositor bring-up before
        // any device is touched
        let (init_tx, init_rx) = std::sync::mpsc::channel();
        let worker_effects = Arc::clone(&effects);
        let worker = std::thread::Builder::new()
            .name("effectcam-worker".to_string())
            .spawn(move || worker_loop(receiver, worker_effects, init_tx))
            .map_err(|e| AppError::Other(format!("Failed to spawn worker: {}", e)))?;

        match init_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = worker.join();
                return Err(e.into());
            }
            Err(_) => return Err(AppError::Other("Worker exited during init".to_string())),
        }

        let sink = Arc::new(ChannelSink {
            sender: sender.clone(),
            dropped: AtomicU64::new(0),
        });
        let session = CaptureSession::configure(sink, &options.session)?;

        info!(
            camera = %session.current_camera().name,
            effect = %effects.effect(),
            "Camera pipeline ready"
        );

        Ok(CameraPipeline {
            session,
            effects,
            sender,
            worker: Some(worker),
            record_state: Arc::new(Mutex::new(RecordState::Idle)),
            recording: Arc::new(AtomicBool::new(false)),
            events,
            events_rx,
        })
    }

    /// Start hardware capture (idempotent, non-blocking)
    pub fn start(&mut self) {
        self.session.start();
    }

    /// Stop hardware capture
    pub fn stop(&mut self) {
        self.session.stop();
    }

    /// Shared effect parameters handle
    pub fn effect_state(&self) -> Arc<EffectState> {
        Arc::clone(&self.effects)
    }

    /// Select the active effect; takes effect on the next frame
    pub fn set_effect(&self, kind: EffectKind) {
        self.effects.set_effect(kind);
    }

    /// Set effect intensity in [0, 2]; takes effect on the next frame
    pub fn set_intensity(&self, intensity: f32) {
        self.effects.set_intensity(intensity);
    }

    /// Switch between front and back cameras
    pub fn flip_camera(&mut self) -> Result<DevicePosition, DeviceError> {
        self.session.flip_position()
    }

    /// Apply a zoom factor; returns the clamped value actually applied
    pub fn set_zoom(&mut self, factor: f32) -> f32 {
        self.session.set_zoom(factor)
    }

    /// Toggle the torch; returns the resulting state
    pub fn toggle_torch(&mut self) -> bool {
        self.session.toggle_torch()
    }

    /// Whether a recording session is currently writing
    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Relaxed)
    }

    /// Subscribe to pipeline events (latest value wins)
    pub fn events(&self) -> watch::Receiver<PipelineEvent> {
        self.events_rx.clone()
    }

    /// Open a recording session writing to `output_path`
    ///
    /// Fails with [`RecordError::AlreadyRecording`] while a session is
    /// writing or still finalizing; the live session is unaffected.
    pub fn start_recording(
        &mut self,
        output_path: PathBuf,
        options: &RecordOptions,
    ) -> Result<(), RecordError> {
        {
            let mut state = self.record_state.lock().expect("state mutex");
            try_begin_recording(&mut state)?;
        }

        let muxer = match RecordingMuxer::start(output_path, options) {
            Ok(muxer) => muxer,
            Err(e) => {
                *self.record_state.lock().expect("state mutex") = RecordState::Idle;
                return Err(e);
            }
        };

        self.send_control(WorkerMessage::StartRecording(muxer));
        self.recording.store(true, Ordering::Relaxed);
        let _ = self.events.send(PipelineEvent::Recording);
        Ok(())
    }

    /// Request the end of the current recording
    ///
    /// Returns `None` when no recording is writing (stop while idle is a
    /// no-op). Otherwise the receiver resolves exactly once with the
    /// finished file path or the finalize error; a new `start_recording`
    /// is accepted only after it settles.
    pub fn stop_recording(&mut self) -> Option<oneshot::Receiver<Result<PathBuf, RecordError>>> {
        {
            let mut state = self.record_state.lock().expect("state mutex");
            if !try_finish_recording(&mut state) {
                debug!("stop_recording without active session is a no-op");
                return None;
            }
        }
        self.recording.store(false, Ordering::Relaxed);

        let (reply_tx, reply_rx) = oneshot::channel();
        self.send_control(WorkerMessage::StopRecording { reply: reply_tx });

        // Settle the state machine and the event sink when finalize resolves,
        // then hand the result to the caller
        let (caller_tx, caller_rx) = oneshot::channel();
        let record_state = Arc::clone(&self.record_state);
        let events = Arc::clone(&self.events);
        std::thread::spawn(move || {
            let result = reply_rx.blocking_recv().unwrap_or_else(|_| {
                Err(RecordError::FinalizeFailed(
                    "Recording worker dropped the stop request".to_string(),
                ))
            });

            *record_state.lock().expect("state mutex") = RecordState::Idle;
            let event = match &result {
                Ok(path) => PipelineEvent::Saved(path.clone()),
                Err(e) => PipelineEvent::RecordingFailed(e.to_string()),
            };
            let _ = events.send(event);
            let _ = caller_tx.send(result);
        });

        Some(caller_rx)
    }

    /// Attach a display surface for the live preview
    pub fn attach_display(
        &mut self,
        target: wgpu::SurfaceTarget<'static>,
        width: u32,
        height: u32,
    ) -> Result<(), crate::errors::RenderError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send_control(WorkerMessage::AttachDisplay {
            target,
            width,
            height,
            reply: reply_tx,
        });
        reply_rx.blocking_recv().unwrap_or_else(|_| {
            Err(crate::errors::RenderError::SurfaceUnavailable(
                "Worker dropped the attach request".to_string(),
            ))
        })
    }

    /// Detach the display surface; preview composites become skips
    pub fn detach_display(&mut self) {
        self.send_control(WorkerMessage::DetachDisplay);
    }

    /// Control messages must not be lost; block briefly if the queue is full
    fn send_control(&self, message: WorkerMessage) {
        let mut sender = self.sender.clone();
        if futures::executor::block_on(sender.send(message)).is_err() {
            warn!("Worker channel closed, control message lost");
        }
    }
}

impl Drop for CameraPipeline {
    fn drop(&mut self) {
        self.session.stop();
        self.send_control(WorkerMessage::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// The single serial worker: owns the compositor and the live muxer
fn worker_loop(
    mut receiver: mpsc::Receiver<WorkerMessage>,
    effects: Arc<EffectState>,
    init_tx: std::sync::mpsc::Sender<Result<(), crate::errors::RenderError>>,
) {
    let mut compositor = match EffectCompositor::new(effects) {
        Ok(compositor) => {
            let _ = init_tx.send(Ok(()));
            compositor
        }
        Err(e) => {
            error!(error = %e, "Compositor initialization failed");
            let _ = init_tx.send(Err(e));
            return;
        }
    };

    let mut live_muxer: Option<RecordingMuxer> = None;

    futures::executor::block_on(async {
        while let Some(message) = receiver.next().await {
            match message {
                WorkerMessage::Video(sample) => {
                    // Preview first; its failure must not affect recording
                    if compositor.has_display() {
                        if let Err(e) = compositor.composite_to_display(&sample) {
                            debug!(error = %e, "Preview composite failed, frame skipped");
                        }
                    }

                    if let Some(muxer) = live_muxer.as_mut() {
                        match compositor.composite_to_buffer(&sample) {
                            Ok(composited) => muxer.submit_video(&composited),
                            Err(e) => {
                                // Frame-loss-over-crash: the frame is simply
                                // absent from the track
                                debug!(error = %e, "Record composite failed, frame dropped");
                            }
                        }
                    }
                }
                WorkerMessage::Audio(sample) => {
                    if let Some(muxer) = live_muxer.as_mut() {
                        muxer.submit_audio(&sample);
                    }
                }
                WorkerMessage::StartRecording(muxer) => {
                    debug!("Worker accepted recording session");
                    live_muxer = Some(muxer);
                }
                WorkerMessage::StopRecording { reply } => match live_muxer.take() {
                    Some(muxer) => muxer.finish(reply),
                    None => {
                        let _ = reply.send(Err(RecordError::FinalizeFailed(
                            "No active recording session".to_string(),
                        )));
                    }
                },
                WorkerMessage::AttachDisplay {
                    target,
                    width,
                    height,
                    reply,
                } => {
                    let _ = reply.send(compositor.attach_display(target, width, height));
                }
                WorkerMessage::DetachDisplay => {
                    compositor.detach_display();
                }
                WorkerMessage::Shutdown => break,
            }
        }
    });

    // A still-live muxer means the pipeline dropped mid-recording; its Drop
    // tears the write session down
    if live_muxer.is_some() {
        warn!("Pipeline shut down with an open recording session");
    }
    info!("Worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_start_is_rejected() {
        let mut state = RecordState::Idle;
        assert!(try_begin_recording(&mut state).is_ok());
        assert_eq!(state, RecordState::Writing);

        // The second start fails and leaves the first session writing
        assert!(matches!(
            try_begin_recording(&mut state),
            Err(RecordError::AlreadyRecording)
        ));
        assert_eq!(state, RecordState::Writing);
    }

    #[test]
    fn test_start_blocked_while_finishing() {
        let mut state = RecordState::Finishing;
        assert!(matches!(
            try_begin_recording(&mut state),
            Err(RecordError::AlreadyRecording)
        ));
        assert_eq!(state, RecordState::Finishing);
    }

    #[test]
    fn test_stop_while_idle_is_noop() {
        let mut state = RecordState::Idle;
        assert!(!try_finish_recording(&mut state));
        assert_eq!(state, RecordState::Idle);
    }

    #[test]
    fn test_lifecycle_round_trip() {
        let mut state = RecordState::Idle;
        try_begin_recording(&mut state).unwrap();
        assert!(try_finish_recording(&mut state));
        assert_eq!(state, RecordState::Finishing);
        // Duplicate stop while finishing stays a no-op
        assert!(!try_finish_recording(&mut state));

        // Only after the finalize settles may a new session begin
        state = RecordState::Idle;
        assert!(try_begin_recording(&mut state).is_ok());
    }
}
