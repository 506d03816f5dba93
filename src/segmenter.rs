//! Utterance segmentation state machine.
//!
//! Converts an unbounded stream of PCM chunks into discrete, bounded
//! utterance segments. Every chunk is appended to the open buffer regardless
//! of energy; a segment closes either when speech has been followed by a
//! sustained quiet gap (natural end) or when the buffer reaches its maximum
//! duration (forced cut). Closure moves the samples out and resets the
//! segmenter unconditionally.

use crate::audio::energy::mean_amplitude;
use crate::defaults;
use crate::segment::{CloseReason, ClosedSegment};
use std::time::Instant;

/// Trait for time operations, allowing mock time in tests.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Real system clock using `std::time::Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Configuration for utterance segmentation.
#[derive(Debug, Clone, Copy)]
pub struct SegmenterConfig {
    /// Sample rate in Hz, used for buffer duration arithmetic.
    pub sample_rate: u32,
    /// Mean absolute amplitude above which a chunk counts as speech.
    pub silence_threshold: f32,
    /// Minimum buffer duration (seconds) for a natural close.
    pub min_record_secs: f64,
    /// Maximum buffer duration (seconds) before a forced cut.
    pub max_record_secs: f64,
    /// Quiet gap (seconds) that must elapse before a natural close.
    pub silence_duration_secs: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            silence_threshold: defaults::SILENCE_THRESHOLD,
            min_record_secs: defaults::MIN_RECORD_SECS,
            max_record_secs: defaults::MAX_RECORD_SECS,
            silence_duration_secs: defaults::SILENCE_DURATION_SECS,
        }
    }
}

/// Whether the current segment has been judged as speech since the last closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    /// No chunk has exceeded the threshold since the last closure.
    Idle,
    /// At least one chunk exceeded the threshold.
    Speaking,
}

/// Utterance segmenter. One instance per connection; never shared.
pub struct Segmenter<C: Clock = SystemClock> {
    config: SegmenterConfig,
    buffer: Vec<i16>,
    state: SegmentState,
    silence_start: Option<Instant>,
    clock: C,
}

impl<C: Clock> Segmenter<C> {
    /// Creates a new segmenter with the given configuration and clock.
    pub fn with_clock(config: SegmenterConfig, clock: C) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            state: SegmentState::Idle,
            silence_start: None,
            clock,
        }
    }

    /// Feed one decoded chunk. Returns a closed segment when either closure
    /// condition fires, with the buffer already reset.
    pub fn push(&mut self, chunk: &[i16]) -> Option<ClosedSegment> {
        // Append unconditionally: leading/trailing low-energy audio is part
        // of the segment.
        self.buffer.extend_from_slice(chunk);

        let amplitude = mean_amplitude(chunk);
        let now = self.clock.now();

        if amplitude > self.config.silence_threshold {
            self.state = SegmentState::Speaking;
            self.silence_start = None;
        } else if self.silence_start.is_none() {
            // Only the first low-energy chunk of a run starts the timer, so
            // it measures wall-clock time since silence began.
            self.silence_start = Some(now);
        }

        let duration = self.buffer_duration_secs();

        let natural = self.state == SegmentState::Speaking
            && self
                .silence_start
                .is_some_and(|start| {
                    now.duration_since(start).as_secs_f64() > self.config.silence_duration_secs
                })
            && duration >= self.config.min_record_secs;

        // The max bound applies independently of speaking state, so an
        // all-silence buffer still force-closes.
        if duration >= self.config.max_record_secs {
            Some(self.close(CloseReason::Forced))
        } else if natural {
            Some(self.close(CloseReason::Natural))
        } else {
            None
        }
    }

    /// Buffer duration in seconds, always derived from the sample count.
    pub fn buffer_duration_secs(&self) -> f64 {
        self.buffer.len() as f64 / self.config.sample_rate as f64
    }

    /// Number of samples currently buffered.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the current segment state.
    pub fn state(&self) -> SegmentState {
        self.state
    }

    /// True if a silence run is currently being timed.
    pub fn silence_pending(&self) -> bool {
        self.silence_start.is_some()
    }

    /// Discard all accumulated state without producing a segment.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = SegmentState::Idle;
        self.silence_start = None;
    }

    fn close(&mut self, reason: CloseReason) -> ClosedSegment {
        let samples = std::mem::take(&mut self.buffer);
        let duration_secs = samples.len() as f64 / self.config.sample_rate as f64;
        self.state = SegmentState::Idle;
        self.silence_start = None;

        ClosedSegment {
            samples,
            duration_secs,
            reason,
        }
    }
}

impl Segmenter<SystemClock> {
    /// Creates a new segmenter with the given configuration using the system clock.
    pub fn new(config: SegmenterConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock clock for testing that allows manual time advancement.
    #[derive(Debug, Clone)]
    struct MockClock {
        current: Arc<Mutex<Instant>>,
    }

    impl MockClock {
        fn new() -> Self {
            Self {
                current: Arc::new(Mutex::new(Instant::now())),
            }
        }

        fn advance(&self, duration: Duration) {
            let mut current = self.current.lock().unwrap();
            *current += duration;
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            *self.current.lock().unwrap()
        }
    }

    fn test_config() -> SegmenterConfig {
        SegmenterConfig {
            sample_rate: 16000,
            silence_threshold: 500.0,
            min_record_secs: 1.0,
            max_record_secs: 10.0,
            silence_duration_secs: 1.0,
        }
    }

    fn speech_chunk(millis: u64) -> Vec<i16> {
        vec![2000i16; (16 * millis) as usize]
    }

    fn quiet_chunk(millis: u64) -> Vec<i16> {
        vec![50i16; (16 * millis) as usize]
    }

    #[test]
    fn starts_idle_and_empty() {
        let segmenter = Segmenter::new(test_config());
        assert_eq!(segmenter.state(), SegmentState::Idle);
        assert_eq!(segmenter.buffer_len(), 0);
        assert!(!segmenter.silence_pending());
    }

    #[test]
    fn appends_all_samples_regardless_of_energy() {
        let mut segmenter = Segmenter::new(test_config());
        segmenter.push(&quiet_chunk(100));
        segmenter.push(&speech_chunk(100));
        segmenter.push(&quiet_chunk(100));
        assert_eq!(segmenter.buffer_len(), 3 * 1600);
    }

    #[test]
    fn speech_sets_speaking_and_clears_silence_timer() {
        let mut segmenter = Segmenter::new(test_config());

        segmenter.push(&quiet_chunk(100));
        assert_eq!(segmenter.state(), SegmentState::Idle);
        assert!(segmenter.silence_pending());

        segmenter.push(&speech_chunk(100));
        assert_eq!(segmenter.state(), SegmentState::Speaking);
        assert!(!segmenter.silence_pending());
    }

    #[test]
    fn speech_clears_timer_from_any_prior_state() {
        let clock = MockClock::new();
        let mut segmenter = Segmenter::with_clock(test_config(), clock.clone());

        // Mid-utterance pause, well under the close threshold.
        segmenter.push(&speech_chunk(100));
        segmenter.push(&quiet_chunk(100));
        assert!(segmenter.silence_pending());

        clock.advance(Duration::from_millis(500));
        segmenter.push(&speech_chunk(100));
        assert!(!segmenter.silence_pending());
        assert_eq!(segmenter.state(), SegmentState::Speaking);
    }

    #[test]
    fn only_first_quiet_chunk_starts_the_timer() {
        let clock = MockClock::new();
        let mut segmenter = Segmenter::with_clock(test_config(), clock.clone());

        segmenter.push(&speech_chunk(1000));
        segmenter.push(&quiet_chunk(100));
        let first_pending = segmenter.silence_pending();

        // Later quiet chunks must not restart the clock: advance almost to
        // the threshold, feed more silence, then cross it.
        clock.advance(Duration::from_millis(950));
        assert!(segmenter.push(&quiet_chunk(100)).is_none());

        clock.advance(Duration::from_millis(100));
        let closed = segmenter.push(&quiet_chunk(100));

        assert!(first_pending);
        let segment = closed.expect("timer measured from first quiet chunk");
        assert_eq!(segment.reason, CloseReason::Natural);
    }

    #[test]
    fn natural_close_requires_minimum_duration() {
        let clock = MockClock::new();
        let mut segmenter = Segmenter::with_clock(test_config(), clock.clone());

        // 0.2s of speech, then a long silence run: under min_record_secs the
        // natural condition never fires, however long the silence lasts.
        segmenter.push(&speech_chunk(200));
        segmenter.push(&quiet_chunk(100));

        for _ in 0..5 {
            clock.advance(Duration::from_secs(1));
            assert!(segmenter.push(&quiet_chunk(100)).is_none());
        }
        assert_eq!(segmenter.state(), SegmentState::Speaking);
    }

    #[test]
    fn natural_close_fires_after_sustained_silence() {
        let clock = MockClock::new();
        let mut segmenter = Segmenter::with_clock(test_config(), clock.clone());

        segmenter.push(&speech_chunk(1200));
        segmenter.push(&quiet_chunk(100));

        clock.advance(Duration::from_millis(1100));
        let closed = segmenter.push(&quiet_chunk(100));

        let segment = closed.expect("sustained silence after speech closes the segment");
        assert_eq!(segment.reason, CloseReason::Natural);
    }

    #[test]
    fn momentary_silence_does_not_close() {
        let clock = MockClock::new();
        let mut segmenter = Segmenter::with_clock(test_config(), clock.clone());

        segmenter.push(&speech_chunk(1200));
        segmenter.push(&quiet_chunk(100));

        clock.advance(Duration::from_millis(800));
        assert!(segmenter.push(&quiet_chunk(100)).is_none());
    }

    #[test]
    fn continuous_speech_force_closes_at_max_duration() {
        let mut segmenter = Segmenter::new(test_config());

        let mut closed = None;
        for i in 0..200 {
            if let Some(segment) = segmenter.push(&speech_chunk(100)) {
                closed = Some((i, segment));
                break;
            }
        }

        let (i, segment) = closed.expect("continuous speech must force-close");
        // 10s of audio at 100ms per chunk.
        assert_eq!(i, 99);
        assert_eq!(segment.reason, CloseReason::Forced);
        assert_eq!(segment.samples.len(), 160_000);
        assert!((segment.duration_secs - 10.0).abs() < 1e-9);
    }

    #[test]
    fn all_silence_from_start_still_force_closes() {
        let mut segmenter = Segmenter::new(test_config());

        let mut closed = None;
        for _ in 0..100 {
            if let Some(segment) = segmenter.push(&quiet_chunk(100)) {
                closed = Some(segment);
                break;
            }
        }

        // Never spoke, still bounded.
        let segment = closed.expect("all-silence buffer must force-close at max duration");
        assert_eq!(segment.reason, CloseReason::Forced);
        assert_eq!(segment.samples.len(), 160_000);
    }

    #[test]
    fn forced_reason_wins_when_both_conditions_fire() {
        let clock = MockClock::new();
        let config = SegmenterConfig {
            max_record_secs: 2.0,
            ..test_config()
        };
        let mut segmenter = Segmenter::with_clock(config, clock.clone());

        // Speaking, silence timer expired, and the same chunk pushes the
        // buffer over the max bound.
        segmenter.push(&speech_chunk(1500));
        segmenter.push(&quiet_chunk(100));
        clock.advance(Duration::from_millis(1100));
        let segment = segmenter.push(&quiet_chunk(400)).unwrap();

        assert_eq!(segment.reason, CloseReason::Forced);
    }

    #[test]
    fn closure_resets_buffer_state_and_timer() {
        let clock = MockClock::new();
        let mut segmenter = Segmenter::with_clock(test_config(), clock.clone());

        segmenter.push(&speech_chunk(1200));
        segmenter.push(&quiet_chunk(100));
        clock.advance(Duration::from_millis(1100));
        assert!(segmenter.push(&quiet_chunk(100)).is_some());

        assert_eq!(segmenter.buffer_len(), 0);
        assert_eq!(segmenter.state(), SegmentState::Idle);
        assert!(!segmenter.silence_pending());
    }

    #[test]
    fn reset_discards_partial_segment() {
        let mut segmenter = Segmenter::new(test_config());
        segmenter.push(&speech_chunk(500));
        segmenter.push(&quiet_chunk(100));

        segmenter.reset();

        assert_eq!(segmenter.buffer_len(), 0);
        assert_eq!(segmenter.state(), SegmentState::Idle);
        assert!(!segmenter.silence_pending());
    }

    #[test]
    fn empty_chunks_count_as_silence() {
        let mut segmenter = Segmenter::new(test_config());
        segmenter.push(&[]);
        assert!(segmenter.silence_pending());
        assert_eq!(segmenter.state(), SegmentState::Idle);
        assert_eq!(segmenter.buffer_len(), 0);
    }

    #[test]
    fn buffer_duration_tracks_sample_count() {
        let mut segmenter = Segmenter::new(test_config());
        segmenter.push(&quiet_chunk(250));
        assert!((segmenter.buffer_duration_secs() - 0.25).abs() < 1e-9);
    }

    /// End-to-end scenario: 1.2s at amplitude 2000 followed by 1.3s at
    /// amplitude 50 yields exactly one natural closure at ~2.2s containing
    /// all 2.5s of audio, then a full reset.
    #[test]
    fn speech_then_silence_scenario() {
        let clock = MockClock::new();
        let mut segmenter = Segmenter::with_clock(test_config(), clock.clone());

        let mut closures = Vec::new();

        // 1.2s of speech in 100ms chunks, arriving in real time.
        for _ in 0..12 {
            if let Some(segment) = segmenter.push(&speech_chunk(100)) {
                closures.push(segment);
            }
            clock.advance(Duration::from_millis(100));
        }

        // The trailing silence: one long quiet chunk starts the timer, then
        // a last quiet chunk arrives after the gap has elapsed.
        if let Some(segment) = segmenter.push(&quiet_chunk(1200)) {
            closures.push(segment);
        }
        clock.advance(Duration::from_millis(1050));
        if let Some(segment) = segmenter.push(&quiet_chunk(100)) {
            closures.push(segment);
        }

        assert_eq!(closures.len(), 1, "expected exactly one closure");
        let segment = &closures[0];
        assert_eq!(segment.reason, CloseReason::Natural);
        // All 2.5s of audio: 1.2s speech + 1.3s trailing silence.
        assert_eq!(segment.samples.len(), 40_000);
        assert!((segment.duration_secs - 2.5).abs() < 1e-9);

        assert_eq!(segmenter.buffer_len(), 0);
        assert_eq!(segmenter.state(), SegmentState::Idle);
        assert!(!segmenter.silence_pending());
    }
}
