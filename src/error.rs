//! Error types for utterd.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UtterdError {
    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Frame decoding errors
    #[error("Audio frame of {len} bytes is not a whole number of 16-bit samples")]
    MalformedFrame { len: usize },

    // Transcription errors
    #[error("Transcription model not found at {path}")]
    TranscriptionModelNotFound { path: String },

    #[error("Transcription inference failed: {message}")]
    TranscriptionInferenceFailed { message: String },

    #[error("Transcription error: {message}")]
    Transcription { message: String },

    // Sink errors
    #[error("Sink write failed: {message}")]
    SinkWrite { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, UtterdError>;
