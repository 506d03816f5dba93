//! utterd - Streaming utterance segmentation and transcription server
//!
//! Accepts raw PCM audio over WebSocket, segments it into utterances by
//! energy and silence timing, transcribes each utterance, and publishes the
//! latest accepted transcript.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod dispatch;
pub mod error;
pub mod segment;
pub mod segmenter;
pub mod server;
pub mod sink;
pub mod stt;

// Core pipeline (decode → segment → dispatch → sink)
pub use audio::{decode_frame, mean_amplitude};
pub use dispatch::Dispatcher;
pub use segment::{CloseReason, ClosedSegment, SpeechRecord};
pub use segmenter::{Segmenter, SegmenterConfig};
pub use sink::{LatestSink, RtdbSink, SpeechSink};
pub use stt::{Transcriber, Transcription};

// Error handling
pub use error::{Result, UtterdError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
