//! Data types shared by the dubbing pipeline stages.

use crate::audio::AudioTrack;
use serde::Serialize;
use std::fmt;

/// Half-open millisecond range `[start_ms, end_ms)` in the original track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Interval {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Interval {
    /// Creates an interval. `start_ms` must be strictly less than `end_ms`.
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        debug_assert!(start_ms < end_ms, "empty interval {}..{}", start_ms, end_ms);
        Self { start_ms, end_ms }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    /// Whether two intervals share at least one millisecond.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}ms", self.start_ms, self.end_ms)
    }
}

/// One unit of work: an interval of the original audio and its samples.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Position in segmenter order (0-based).
    pub index: usize,
    pub interval: Interval,
    pub audio: AudioTrack,
}

/// A segment-local fallback that was taken instead of failing the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Degradation {
    /// Transcription errored; source text is empty.
    TranscriptionFailed(String),
    /// Translation errored; source text passed through.
    TranslationFailed(String),
    /// Synthesis errored; placeholder silence used.
    SynthesisFailed(String),
    /// Nothing to say; placeholder silence used.
    NothingToSynthesize,
    /// Time-stretch errored; the unstretched clip was kept.
    StretchFailed(String),
    /// Segment exceeded its time budget; replaced by silence.
    TimedOut,
    /// Segment task panicked or was cancelled; replaced by silence.
    Aborted(String),
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::TranscriptionFailed(msg) => write!(f, "transcription failed: {}", msg),
            Degradation::TranslationFailed(msg) => write!(f, "translation failed: {}", msg),
            Degradation::SynthesisFailed(msg) => write!(f, "synthesis failed: {}", msg),
            Degradation::NothingToSynthesize => f.write_str("nothing to synthesize"),
            Degradation::StretchFailed(msg) => write!(f, "time-stretch failed: {}", msg),
            Degradation::TimedOut => f.write_str("timed out"),
            Degradation::Aborted(msg) => write!(f, "aborted: {}", msg),
        }
    }
}

/// What happened to one segment, in segmenter order.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentReport {
    pub index: usize,
    pub interval: Interval,
    pub source_text: String,
    pub translated_text: String,
    /// Length of the synthesized clip before alignment.
    pub synthesized_ms: u64,
    /// Length of the clip laid onto the timeline.
    pub aligned_ms: u64,
    pub degradations: Vec<Degradation>,
}

impl SegmentReport {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}
