//! Segment and transcript data types shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Why a segment was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Speech was followed by a sustained quiet gap.
    Natural,
    /// The buffer hit the maximum duration bound.
    Forced,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::Natural => write!(f, "natural"),
            CloseReason::Forced => write!(f, "forced"),
        }
    }
}

/// An immutable snapshot of one closed utterance.
///
/// Produced exactly once per closure by the segmenter; the samples are moved
/// out of the segmenter's buffer, so the buffer is empty the moment this
/// value exists.
#[derive(Debug, Clone)]
pub struct ClosedSegment {
    /// Accumulated 16-bit PCM samples, including leading/trailing low-energy audio.
    pub samples: Vec<i16>,
    /// Audio duration in seconds, derived from the sample count.
    pub duration_secs: f64,
    /// Which closure condition fired. Diagnostic only.
    pub reason: CloseReason,
}

/// The latest accepted transcript, as published to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRecord {
    /// Transcribed text in original case.
    pub text: String,
    /// Transcription processing time in seconds.
    pub proc_time: f64,
    /// Capture timestamp in epoch milliseconds.
    pub timestamp: i64,
}

impl SpeechRecord {
    /// Create a record stamped with the current wall-clock time.
    pub fn new(text: String, proc_time: f64) -> Self {
        Self {
            text,
            proc_time,
            timestamp: epoch_millis(),
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
