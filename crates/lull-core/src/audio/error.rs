//! Output device error types

use thiserror::Error;

/// Errors that can occur while opening or driving an output device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// No audio devices available
    #[error("No audio output devices found")]
    NoDevices,

    /// Failed to get default device
    #[error("Failed to get default audio device: {0}")]
    NoDefaultDevice(String),

    /// Device not found
    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    /// Failed to get device configuration
    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    /// Failed to build audio stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    /// Failed to start/pause the stream
    #[error("Failed to control audio stream: {0}")]
    StreamPlayError(String),

    /// Unsupported sample format
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The device thread has shut down
    #[error("Audio device is closed")]
    Closed,
}

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;
