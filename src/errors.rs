// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture/render/record pipeline

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Capture device errors
    Device(DeviceError),
    /// GPU rendering errors
    Render(RenderError),
    /// Recording/muxing errors
    Record(RecordError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Capture-device errors
#[derive(Debug, Clone)]
pub enum DeviceError {
    /// No camera devices found
    NoCameraFound,
    /// No camera at the requested position
    PositionUnavailable(String),
    /// Device initialization failed
    InitializationFailed(String),
    /// Device disconnected or busy during operation
    Busy(String),
    /// Session reconfiguration failed (old input restored)
    ReconfigurationFailed(String),
    /// Backend error (GStreamer / PipeWire)
    BackendError(String),
}

/// GPU rendering errors
#[derive(Debug, Clone)]
pub enum RenderError {
    /// No suitable GPU adapter found
    AdapterNotFound(String),
    /// Device/queue creation failed
    DeviceCreationFailed(String),
    /// Render pipeline missing for the selected effect
    PipelineNotFound(String),
    /// Frame could not be imported as a texture
    TextureImportFailed(String),
    /// No display surface attached or surface not ready
    SurfaceUnavailable(String),
    /// Readback of the composited frame failed
    ReadbackFailed(String),
}

/// Recording/muxing errors
#[derive(Debug, Clone)]
pub enum RecordError {
    /// A recording session is already open
    AlreadyRecording,
    /// Encoder element not available
    EncoderNotAvailable(String),
    /// Writer/pipeline creation failed
    StartFailed(String),
    /// Finalize failed; the file may be unplayable
    FinalizeFailed(String),
    /// Pipeline error while writing
    PipelineError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Device(e) => write!(f, "Device error: {}", e),
            AppError::Render(e) => write!(f, "Render error: {}", e),
            AppError::Record(e) => write!(f, "Recording error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NoCameraFound => write!(f, "No camera devices found"),
            DeviceError::PositionUnavailable(pos) => {
                write!(f, "No camera available at position: {}", pos)
            }
            DeviceError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            DeviceError::Busy(msg) => write!(f, "Device busy: {}", msg),
            DeviceError::ReconfigurationFailed(msg) => {
                write!(f, "Reconfiguration failed: {}", msg)
            }
            DeviceError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::AdapterNotFound(msg) => write!(f, "No GPU adapter: {}", msg),
            RenderError::DeviceCreationFailed(msg) => {
                write!(f, "GPU device creation failed: {}", msg)
            }
            RenderError::PipelineNotFound(effect) => {
                write!(f, "No render pipeline for effect: {}", effect)
            }
            RenderError::TextureImportFailed(msg) => write!(f, "Texture import failed: {}", msg),
            RenderError::SurfaceUnavailable(msg) => write!(f, "Display surface: {}", msg),
            RenderError::ReadbackFailed(msg) => write!(f, "Frame readback failed: {}", msg),
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::AlreadyRecording => write!(f, "Recording already in progress"),
            RecordError::EncoderNotAvailable(msg) => write!(f, "Encoder not available: {}", msg),
            RecordError::StartFailed(msg) => write!(f, "Failed to start recording: {}", msg),
            RecordError::FinalizeFailed(msg) => write!(f, "Failed to finalize recording: {}", msg),
            RecordError::PipelineError(msg) => write!(f, "Pipeline error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for DeviceError {}
impl std::error::Error for RenderError {}
impl std::error::Error for RecordError {}

// Conversions from sub-errors to AppError
impl From<DeviceError> for AppError {
    fn from(err: DeviceError) -> Self {
        AppError::Device(err)
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Render(err)
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        AppError::Record(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}
