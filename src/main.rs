// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "effectcam")]
#[command(about = "Camera recorder with real-time GPU effects")]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras, microphones and encoders
    List,

    /// Show the effect catalog
    Effects,

    /// Record a video with the selected effect
    Record {
        /// Recording duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Effect to apply (see 'effectcam effects')
        #[arg(short, long)]
        effect: Option<String>,

        /// Effect intensity in [0, 2]
        #[arg(short, long)]
        intensity: Option<f32>,

        /// Output file path (default: ~/Videos/EffectCam/video_TIMESTAMP.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Camera index to use (from 'effectcam list')
        #[arg(short, long)]
        camera: Option<usize>,

        /// Zoom factor (clamped to the device range)
        #[arg(short, long)]
        zoom: Option<f32>,

        /// Disable audio recording
        #[arg(long)]
        no_audio: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=effectcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => cli::list_devices(),
        Commands::Effects => {
            cli::list_effects();
            Ok(())
        }
        Commands::Record {
            duration,
            effect,
            intensity,
            output,
            camera,
            zoom,
            no_audio,
        } => cli::record(cli::RecordArgs {
            duration,
            effect,
            intensity,
            output,
            camera,
            zoom,
            no_audio,
        }),
    }
}
