//! Segment dispatch: transcription, filtering, publication.
//!
//! One dispatcher is shared by all connections. `dispatch` is synchronous
//! and blocking; the server runs it on a blocking task and awaits it so each
//! connection processes segments strictly in order.

use crate::segment::{ClosedSegment, SpeechRecord};
use crate::sink::SpeechSink;
use crate::stt::Transcriber;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Peak i16 magnitude, used to normalize samples into [-1.0, 1.0].
const I16_SCALE: f32 = 32768.0;

/// Runs a closed segment through transcription and filtering, then
/// publishes the surviving transcript.
pub struct Dispatcher {
    transcriber: Arc<dyn Transcriber>,
    sink: Arc<dyn SpeechSink>,
    noise_phrases: Vec<String>,
}

impl Dispatcher {
    pub fn new(transcriber: Arc<dyn Transcriber>, sink: Arc<dyn SpeechSink>) -> Self {
        Self {
            transcriber,
            sink,
            noise_phrases: Vec::new(),
        }
    }

    /// Set the noise phrases that cause a transcript to be dropped.
    /// Matching is case-insensitive substring containment.
    pub fn with_noise_phrases(mut self, phrases: &[String]) -> Self {
        self.noise_phrases = phrases.iter().map(|p| p.to_lowercase()).collect();
        self
    }

    /// Process one closed segment end to end.
    ///
    /// Returns the published record, or None when the transcript was empty,
    /// matched a noise phrase, or transcription failed. Sink failures are
    /// logged but do not suppress the record.
    pub fn dispatch(&self, segment: ClosedSegment) -> Option<SpeechRecord> {
        let audio = normalize(&segment.samples);

        let started = Instant::now();
        let transcription = match self.transcriber.transcribe(&audio) {
            Ok(t) => t,
            Err(e) => {
                warn!("Transcription failed for {:.2}s segment: {}", segment.duration_secs, e);
                return None;
            }
        };
        let proc_time = started.elapsed().as_secs_f64();

        let text = join_fragments(&transcription.fragments);
        if text.is_empty() {
            debug!("Dropping empty transcript ({:.2}s of audio)", segment.duration_secs);
            return None;
        }

        if let Some(phrase) = self.matched_noise_phrase(&text) {
            debug!("Dropping transcript matching noise phrase {:?}: {:?}", phrase, text);
            return None;
        }

        let record = SpeechRecord::new(text, proc_time);
        if let Err(e) = self.sink.publish(&record) {
            warn!("Failed to publish to {} sink: {}", self.sink.name(), e);
        }

        Some(record)
    }

    fn matched_noise_phrase(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.noise_phrases
            .iter()
            .find(|phrase| lowered.contains(phrase.as_str()))
            .map(|phrase| phrase.as_str())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("model", &self.transcriber.model_name())
            .field("sink", &self.sink.name())
            .field("noise_phrases", &self.noise_phrases)
            .finish()
    }
}

/// Convert raw 16-bit samples to normalized f32.
fn normalize(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / I16_SCALE).collect()
}

/// Join fragments into one transcript, skipping blank fragments.
fn join_fragments(fragments: &[String]) -> String {
    fragments
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::CloseReason;
    use crate::sink::LatestSink;
    use crate::stt::MockTranscriber;

    fn segment(samples: Vec<i16>) -> ClosedSegment {
        let duration_secs = samples.len() as f64 / 16_000.0;
        ClosedSegment {
            samples,
            duration_secs,
            reason: CloseReason::Natural,
        }
    }

    fn dispatcher(transcriber: MockTranscriber, sink: Arc<LatestSink>) -> Dispatcher {
        Dispatcher::new(Arc::new(transcriber), sink).with_noise_phrases(&[
            "subtitles".to_string(),
            "watching".to_string(),
        ])
    }

    #[test]
    fn normalize_maps_i16_range_into_unit_interval() {
        let audio = normalize(&[0, 16384, -16384, i16::MAX, i16::MIN]);
        assert_eq!(audio[0], 0.0);
        assert_eq!(audio[1], 0.5);
        assert_eq!(audio[2], -0.5);
        assert!((audio[3] - 0.99997).abs() < 1e-4);
        assert_eq!(audio[4], -1.0);
    }

    #[test]
    fn join_trims_and_skips_blank_fragments() {
        let fragments = vec![
            " Hello".to_string(),
            "   ".to_string(),
            "world ".to_string(),
        ];
        assert_eq!(join_fragments(&fragments), "Hello world");
    }

    #[test]
    fn dispatch_publishes_accepted_transcript() {
        let sink = Arc::new(LatestSink::new());
        let d = dispatcher(
            MockTranscriber::new("tiny").with_fragments(&[" Turn on", "the lights. "]),
            sink.clone(),
        );

        let record = d.dispatch(segment(vec![1000; 16_000])).unwrap();

        assert_eq!(record.text, "Turn on the lights.");
        assert!(record.proc_time >= 0.0);
        assert_eq!(sink.latest().unwrap(), record);
    }

    #[test]
    fn dispatch_drops_empty_transcript() {
        let sink = Arc::new(LatestSink::new());
        let d = dispatcher(MockTranscriber::new("tiny").with_fragments(&["  ", ""]), sink.clone());

        assert!(d.dispatch(segment(vec![1000; 16_000])).is_none());
        assert!(sink.latest().is_none());
    }

    #[test]
    fn dispatch_drops_noise_phrases_case_insensitively() {
        let sink = Arc::new(LatestSink::new());
        let d = dispatcher(
            MockTranscriber::new("tiny").with_fragments(&["Thanks for WATCHING!"]),
            sink.clone(),
        );

        assert!(d.dispatch(segment(vec![1000; 16_000])).is_none());
        assert!(sink.latest().is_none());
    }

    #[test]
    fn dispatch_returns_none_on_transcription_failure() {
        let sink = Arc::new(LatestSink::new());
        let d = dispatcher(MockTranscriber::new("tiny").with_failure(), sink.clone());

        assert!(d.dispatch(segment(vec![1000; 16_000])).is_none());
        assert!(sink.latest().is_none());
    }

    #[test]
    fn dispatch_survives_sink_failure() {
        struct FailingSink;
        impl SpeechSink for FailingSink {
            fn publish(&self, _record: &SpeechRecord) -> crate::error::Result<()> {
                Err(crate::error::UtterdError::SinkWrite {
                    message: "down".to_string(),
                })
            }
            fn name(&self) -> &'static str {
                "failing"
            }
        }

        let d = Dispatcher::new(
            Arc::new(MockTranscriber::new("tiny").with_fragments(&["hello"])),
            Arc::new(FailingSink),
        );

        let record = d.dispatch(segment(vec![1000; 16_000])).unwrap();
        assert_eq!(record.text, "hello");
    }

    #[test]
    fn transcript_case_is_preserved_in_published_record() {
        let sink = Arc::new(LatestSink::new());
        let d = dispatcher(
            MockTranscriber::new("tiny").with_fragments(&["Hello World"]),
            sink.clone(),
        );

        let record = d.dispatch(segment(vec![1000; 16_000])).unwrap();
        assert_eq!(record.text, "Hello World");
    }
}
