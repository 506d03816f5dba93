use crate::error::{Result, UtterdError};
use std::sync::Arc;

/// Result of transcribing one segment.
#[derive(Debug, Clone, Default)]
pub struct Transcription {
    /// Ordered text fragments, one per span of recognized speech.
    pub fragments: Vec<String>,
    /// Language the engine settled on (configured or detected).
    pub language: String,
}

/// Trait for speech-to-text transcription.
///
/// This trait allows swapping implementations (real Whisper vs mock).
/// Implementations must tolerate concurrent invocation from multiple
/// connections.
pub trait Transcriber: Send + Sync {
    /// Transcribe normalized mono audio to text fragments.
    ///
    /// # Arguments
    /// * `audio` - Samples normalized to [-1.0, 1.0] at the configured sample rate
    fn transcribe(&self, audio: &[f32]) -> Result<Transcription>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the transcriber is ready
    fn is_ready(&self) -> bool;
}

/// Implement Transcriber for Arc<T> to allow sharing across connections.
impl<T: Transcriber + ?Sized> Transcriber for Arc<T> {
    fn transcribe(&self, audio: &[f32]) -> Result<Transcription> {
        (**self).transcribe(audio)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock transcriber for testing
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    model_name: String,
    fragments: Vec<String>,
    should_fail: bool,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            fragments: vec!["mock transcription".to_string()],
            should_fail: false,
        }
    }

    /// Configure the mock to return specific fragments
    pub fn with_fragments(mut self, fragments: &[&str]) -> Self {
        self.fragments = fragments.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, _audio: &[f32]) -> Result<Transcription> {
        if self.should_fail {
            Err(UtterdError::Transcription {
                message: "mock transcription failure".to_string(),
            })
        } else {
            Ok(Transcription {
                fragments: self.fragments.clone(),
                language: "en".to_string(),
            })
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
