// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for headless pipeline operation
//!
//! This module provides command-line functionality for:
//! - Listing available cameras and microphones
//! - Showing the effect catalog
//! - Recording an effect-composited clip

use effectcam::capture::{enumerate_cameras, enumerate_microphones};
use effectcam::record::log_available_encoders;
use effectcam::storage;
use effectcam::{
    Config, EffectKind, PipelineOptions, RecordOptions, CameraPipeline, SessionOptions,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// List cameras, microphones and encoder availability
pub fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    let cameras = enumerate_cameras();
    if cameras.is_empty() {
        println!("No cameras found.");
    } else {
        println!("Available cameras:");
        println!();
        for (index, camera) in cameras.iter().enumerate() {
            println!(
                "  [{}] {} ({}, max zoom {:.1}x)",
                index, camera.name, camera.position, camera.max_zoom
            );
        }
        println!();
    }

    let microphones = enumerate_microphones();
    if microphones.is_empty() {
        println!("No audio inputs found.");
    } else {
        println!("Available audio inputs:");
        println!();
        for mic in &microphones {
            let marker = if mic.is_default { " (default)" } else { "" };
            println!("  {}{}", mic.name, marker);
        }
        println!();
    }

    log_available_encoders();
    Ok(())
}

/// Print the effect catalog
pub fn list_effects() {
    println!("Available effects:");
    println!();
    for effect in EffectKind::ALL {
        println!("  {:<10} {}", effect.display_name(), effect.description());
    }
    println!();
    println!("Intensity range: 0.0 to 2.0 (default 1.0)");
}

/// Arguments for the record command
pub struct RecordArgs {
    pub duration: u64,
    pub effect: Option<String>,
    pub intensity: Option<f32>,
    pub output: Option<PathBuf>,
    pub camera: Option<usize>,
    pub zoom: Option<f32>,
    pub no_audio: bool,
}

/// Record an effect-composited clip
pub fn record(args: RecordArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();

    let effect = match args.effect.as_deref() {
        Some(name) => EffectKind::from_name(name)
            .ok_or_else(|| format!("Unknown effect: {} (see 'effectcam effects')", name))?,
        None => config.default_effect,
    };
    let intensity = args.intensity.unwrap_or(config.intensity);
    let enable_audio = !args.no_audio && config.record_audio;

    let options = PipelineOptions {
        session: SessionOptions {
            position: config.camera_position,
            mirror_front: config.mirror_preview,
            enable_audio,
            camera_index: args.camera,
        },
        effect,
        intensity,
    };

    println!("Effect: {} (intensity {:.2})", effect, intensity);

    let mut pipeline = CameraPipeline::new(options)?;
    if let Some(zoom) = args.zoom {
        let applied = pipeline.set_zoom(zoom);
        println!("Zoom: {:.2}x", applied);
    }
    pipeline.start();

    // Camera warm-up so the first recorded frames are exposed properly
    std::thread::sleep(Duration::from_millis(500));

    // Record to a scratch path and publish afterwards unless the caller
    // picked an explicit destination
    let (record_path, publish) = match args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            (path, false)
        }
        None => (storage::scratch_output_path(), true),
    };

    let record_options = RecordOptions {
        bitrate: config.bitrate_preset,
        enable_audio,
    };
    pipeline.start_recording(record_path.clone(), &record_options)?;

    println!();
    println!("Recording... (press Ctrl+C to stop early)");

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, std::sync::atomic::Ordering::SeqCst);
    })?;

    // Wait for duration or Ctrl+C
    let start = Instant::now();
    let target_duration = Duration::from_secs(args.duration);

    while start.elapsed() < target_duration {
        if stop_flag.load(std::sync::atomic::Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        let elapsed = start.elapsed().as_secs();
        print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
        std::io::Write::flush(&mut std::io::stdout())?;

        std::thread::sleep(Duration::from_millis(100));
    }
    println!();

    // Stop and await the asynchronous finalize
    let receiver = pipeline
        .stop_recording()
        .ok_or("No recording session was active")?;
    let rt = tokio::runtime::Runtime::new()?;
    let finished = rt.block_on(receiver)??;

    pipeline.stop();

    let final_path = if publish {
        storage::publish_to_library(&finished)?
    } else {
        finished
    };
    println!("Video saved: {}", final_path.display());

    Ok(())
}
