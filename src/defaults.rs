//! Default configuration constants for utterd.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default address the WebSocket server binds to.
pub const HOST: &str = "0.0.0.0";

/// Default listening port for inbound device connections.
pub const PORT: u16 = 4000;

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Default silence threshold in raw 16-bit amplitude units.
///
/// Chunks whose mean absolute amplitude is at or below this value are treated
/// as silence. 500 is tuned for typical embedded microphone input where the
/// noise floor sits well under that level.
pub const SILENCE_THRESHOLD: f32 = 500.0;

/// Minimum accumulated audio duration in seconds before a natural close is allowed.
///
/// Prevents a short noise burst followed by silence from producing a segment.
pub const MIN_RECORD_SECS: f64 = 1.0;

/// Maximum accumulated audio duration in seconds before a segment is force-cut.
///
/// Bounds both memory use and transcription latency under continuous speech
/// or constant loud noise.
pub const MAX_RECORD_SECS: f64 = 10.0;

/// Silence duration in seconds that must elapse before speech is considered ended.
///
/// 1 second allows for natural pauses without prematurely closing the segment.
pub const SILENCE_DURATION_SECS: f64 = 1.0;

/// Default Whisper model path.
pub const DEFAULT_MODEL: &str = "models/ggml-tiny.bin";

/// Default language code for transcription.
///
/// Set to "auto" to let Whisper detect the spoken language instead.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Default beam width for Whisper decoding. 1 selects greedy sampling.
pub const BEAM_SIZE: u32 = 1;

/// Transcript substrings that mark a result as captioning noise.
///
/// Whisper hallucinates these on silent or near-silent audio; any transcript
/// containing one of them (case-insensitive) is dropped instead of published.
pub const NOISE_PHRASES: &[&str] = &["subtitles", "watching", "mbc", "amara", "copyright"];

/// Report the GPU backend compiled into this build.
///
/// Returns a human-readable name based on the compile-time feature flags.
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else if cfg!(feature = "hipblas") {
        "HipBLAS (AMD)"
    } else if cfg!(feature = "openblas") {
        "OpenBLAS"
    } else {
        "CPU"
    }
}
