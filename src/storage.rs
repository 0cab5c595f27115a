// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for finished recordings

use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::AppError;

/// Default folder name for saved recordings
const DEFAULT_SAVE_FOLDER: &str = "EffectCam";

/// Get the default recordings directory (`~/Videos/EffectCam`)
pub fn default_video_dir() -> PathBuf {
    dirs::video_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(DEFAULT_SAVE_FOLDER)
}

/// Build a timestamped output path inside a directory
pub fn timestamped_output_path(dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("video_{}.mp4", timestamp))
}

/// A scratch path for an in-progress recording, finalized next to the
/// system temp dir until it is published
pub fn scratch_output_path() -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S%.3f");
    std::env::temp_dir().join(format!("effectcam_{}.mp4", timestamp))
}

/// Publish a finished recording into the user's video library
///
/// Moves the file into the default recordings directory and returns the
/// final path.
pub fn publish_to_library(finished: &Path) -> Result<PathBuf, AppError> {
    publish_into(finished, &default_video_dir())
}

/// Move a finished recording into `library`, creating it if needed
///
/// Falls back to copy + remove when the rename crosses filesystems (temp
/// dir on tmpfs is common).
pub fn publish_into(finished: &Path, library: &Path) -> Result<PathBuf, AppError> {
    std::fs::create_dir_all(library)?;

    let file_name = finished
        .file_name()
        .ok_or_else(|| AppError::Storage(format!("Invalid file path: {}", finished.display())))?;
    let destination = library.join(file_name);

    match std::fs::rename(finished, &destination) {
        Ok(()) => {}
        Err(e) => {
            debug!(error = %e, "Rename failed, copying instead");
            std::fs::copy(finished, &destination)?;
            std::fs::remove_file(finished)?;
        }
    }

    info!(path = %destination.display(), "Recording published to library");
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamped_path_shape() {
        let path = timestamped_output_path(Path::new("/tmp"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("video_"));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn test_publish_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"data").unwrap();

        let library = dir.path().join("library");
        let destination = publish_into(&source, &library).unwrap();

        assert_eq!(destination, library.join("clip.mp4"));
        assert!(destination.exists());
        assert!(!source.exists());
        assert_eq!(std::fs::read(&destination).unwrap(), b"data");
    }

    #[test]
    fn test_publish_rejects_invalid_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(publish_into(Path::new("/"), dir.path()).is_err());
    }
}
