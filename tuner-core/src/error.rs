//! Error types for the tuner core

use thiserror::Error;

/// Tuner engine errors
#[derive(Debug, Error)]
pub enum TunerError {
    /// No audio input device is available
    #[error("No audio input device available")]
    NoInputDevice,

    /// The input device offers no usable mono f32 format
    #[error("No suitable f32 input format found")]
    NoSupportedConfig,

    /// Failed to read the input device name
    #[error("Failed to read device name: {0}")]
    DeviceName(#[from] cpal::DeviceNameError),

    /// Failed to enumerate the input device's supported formats
    #[error("Failed to query supported input formats: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    /// Failed to open the capture stream
    #[error("Failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    /// Failed to start the capture stream
    #[error("Failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// A configuration value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for tuner operations
pub type TunerResult<T> = Result<T, TunerError>;
