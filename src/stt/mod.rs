//! Speech-to-text engine abstraction and implementations.

pub mod transcriber;
pub mod whisper;

pub use transcriber::{MockTranscriber, Transcriber, Transcription};
pub use whisper::{WhisperConfig, WhisperTranscriber};
