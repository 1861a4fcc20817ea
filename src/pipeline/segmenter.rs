//! Silence-based segmentation.
//!
//! Slides a window of `min_silence_ms` across the track one millisecond at a
//! time. A window is silent when its level is at or below the threshold.
//! Overlapping or touching silent windows merge into one silent range, and the
//! non-silent intervals are whatever lies between those ranges. A pause
//! shorter than `min_silence_ms` can never hold a whole silent window, so
//! speech on both sides of it always ends up in one interval.

use crate::audio::level::{self, LevelMetric, db_to_amplitude};
use crate::audio::AudioTrack;
use crate::defaults;
use crate::pipeline::types::{Interval, Segment};
use std::collections::VecDeque;

/// Configuration for the segmenter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmenterConfig {
    /// Shortest quiet stretch (ms) that separates two segments.
    pub min_silence_ms: u32,
    /// Level (dBFS) at or below which a window counts as silent.
    pub silence_thresh_db: f64,
    /// How a window's level is measured.
    pub metric: LevelMetric,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_silence_ms: defaults::MIN_SILENCE_MS,
            silence_thresh_db: defaults::SILENCE_THRESH_DB,
            metric: LevelMetric::default(),
        }
    }
}

/// Splits a track into speech-bearing intervals.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Silent ranges of the track, sorted and non-overlapping.
    pub fn detect_silence(&self, track: &AudioTrack) -> Vec<Interval> {
        let total_ms = track.duration_ms();
        if total_ms == 0 {
            return Vec::new();
        }

        let window = (self.config.min_silence_ms.max(1)) as u64;
        let threshold = db_to_amplitude(self.config.silence_thresh_db);

        if total_ms < window {
            let whole = &track.samples()[..track.index_at(total_ms)];
            return if level::measure(whole, self.config.metric) <= threshold {
                vec![Interval::new(0, total_ms)]
            } else {
                Vec::new()
            };
        }

        let levels = WindowLevels::new(track, total_ms, window, self.config.metric);

        let mut ranges = Vec::new();
        // (first silent window start, previous silent window start)
        let mut current: Option<(u64, u64)> = None;
        for start in 0..=(total_ms - window) {
            if levels.level(start) > threshold {
                continue;
            }
            current = match current {
                None => Some((start, start)),
                Some((first, prev)) => {
                    let continuous = start == prev + 1;
                    let has_gap = start > prev + window;
                    if !continuous && has_gap {
                        ranges.push(Interval::new(first, prev + window));
                        Some((start, start))
                    } else {
                        Some((first, start))
                    }
                }
            };
        }
        if let Some((first, prev)) = current {
            ranges.push(Interval::new(first, prev + window));
        }
        ranges
    }

    /// Non-silent intervals of the track, sorted and non-overlapping.
    pub fn detect_nonsilent(&self, track: &AudioTrack) -> Vec<Interval> {
        let total_ms = track.duration_ms();
        if total_ms == 0 {
            return Vec::new();
        }

        let silent = self.detect_silence(track);
        let mut intervals = Vec::with_capacity(silent.len() + 1);
        let mut cursor = 0u64;
        for range in &silent {
            if range.start_ms > cursor {
                intervals.push(Interval::new(cursor, range.start_ms));
            }
            cursor = range.end_ms;
        }
        if cursor < total_ms {
            intervals.push(Interval::new(cursor, total_ms));
        }
        intervals
    }

    /// Cuts the track into segments, one per non-silent interval.
    pub fn segment(&self, track: &AudioTrack) -> Vec<Segment> {
        self.detect_nonsilent(track)
            .into_iter()
            .enumerate()
            .map(|(index, interval)| Segment {
                index,
                interval,
                audio: track.slice(interval.start_ms, interval.end_ms),
            })
            .collect()
    }
}

/// Splits `track` into segments using the peak metric.
pub fn segment(track: &AudioTrack, min_silence_ms: u32, silence_thresh_db: f64) -> Vec<Segment> {
    Segmenter::new(SegmenterConfig {
        min_silence_ms,
        silence_thresh_db,
        metric: LevelMetric::Peak,
    })
    .segment(track)
}

/// Level of every `window`-millisecond window, computed from per-millisecond blocks.
enum WindowLevels {
    /// Sliding-window maxima, one per window start.
    Peak(Vec<u16>),
    /// Prefix sums of squares and sample counts over millisecond blocks.
    Rms {
        squares: Vec<u128>,
        counts: Vec<usize>,
        window: usize,
    },
}

impl WindowLevels {
    fn new(track: &AudioTrack, total_ms: u64, window: u64, metric: LevelMetric) -> Self {
        let blocks = total_ms as usize;
        let window = window as usize;
        let block = |ms: usize| {
            let start = track.index_at(ms as u64);
            let end = track.index_at(ms as u64 + 1);
            &track.samples()[start..end]
        };

        match metric {
            LevelMetric::Peak => {
                let peaks: Vec<u16> = (0..blocks).map(|ms| level::peak(block(ms))).collect();
                let mut maxima = Vec::with_capacity(blocks - window + 1);
                let mut deque: VecDeque<usize> = VecDeque::new();
                for (i, &value) in peaks.iter().enumerate() {
                    while deque.back().is_some_and(|&j| peaks[j] <= value) {
                        deque.pop_back();
                    }
                    deque.push_back(i);
                    if deque.front().is_some_and(|&j| j + window <= i) {
                        deque.pop_front();
                    }
                    if i + 1 >= window {
                        maxima.push(deque.front().map_or(0, |&j| peaks[j]));
                    }
                }
                WindowLevels::Peak(maxima)
            }
            LevelMetric::Rms => {
                let mut squares = Vec::with_capacity(blocks + 1);
                let mut counts = Vec::with_capacity(blocks + 1);
                squares.push(0u128);
                counts.push(0usize);
                for ms in 0..blocks {
                    let samples = block(ms);
                    squares.push(squares[ms] + level::sum_of_squares(samples) as u128);
                    counts.push(counts[ms] + samples.len());
                }
                WindowLevels::Rms {
                    squares,
                    counts,
                    window,
                }
            }
        }
    }

    fn level(&self, start_ms: u64) -> f64 {
        let start = start_ms as usize;
        match self {
            WindowLevels::Peak(maxima) => maxima[start] as f64,
            WindowLevels::Rms {
                squares,
                counts,
                window,
            } => {
                let count = counts[start + window] - counts[start];
                if count == 0 {
                    return 0.0;
                }
                let sum = squares[start + window] - squares[start];
                (sum as f64 / count as f64).sqrt()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16000;

    /// Builds a track of `total_ms` silence with square-wave bursts of `amplitude`.
    fn track_with_bursts(total_ms: u64, bursts: &[(u64, u64)], amplitude: i16) -> AudioTrack {
        let mut track = AudioTrack::silent(total_ms, RATE);
        for &(start, end) in bursts {
            let len = AudioTrack::silent(end - start, RATE).len();
            let burst: Vec<i16> = (0..len)
                .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
                .collect();
            track.overlay(&AudioTrack::new(burst, RATE), start);
        }
        track
    }

    fn config(min_silence_ms: u32, silence_thresh_db: f64) -> SegmenterConfig {
        SegmenterConfig {
            min_silence_ms,
            silence_thresh_db,
            metric: LevelMetric::Peak,
        }
    }

    #[test]
    fn all_silent_track_has_no_intervals() {
        let track = AudioTrack::silent(10_000, RATE);
        assert!(segment(&track, 700, -40.0).is_empty());
    }

    #[test]
    fn empty_track_has_no_intervals() {
        let track = AudioTrack::new(Vec::new(), RATE);
        assert!(segment(&track, 700, -40.0).is_empty());
    }

    #[test]
    fn finds_two_separated_bursts() {
        let track = track_with_bursts(10_000, &[(500, 2500), (6000, 9000)], 10_000);

        let intervals = Segmenter::new(config(300, -40.0)).detect_nonsilent(&track);

        assert_eq!(
            intervals,
            vec![Interval::new(500, 2500), Interval::new(6000, 9000)]
        );
    }

    #[test]
    fn leading_quiet_shorter_than_min_silence_joins_first_interval() {
        let track = track_with_bursts(10_000, &[(500, 2500), (6000, 9000)], 10_000);

        let intervals = Segmenter::new(config(700, -40.0)).detect_nonsilent(&track);

        assert_eq!(intervals, vec![Interval::new(0, 2500), Interval::new(6000, 9000)]);
    }

    #[test]
    fn short_gap_merges_adjacent_bursts() {
        let track = track_with_bursts(5000, &[(1000, 2000), (2400, 3000)], 8000);

        let intervals = Segmenter::new(config(700, -40.0)).detect_nonsilent(&track);

        assert_eq!(intervals, vec![Interval::new(1000, 3000)]);
    }

    #[test]
    fn gap_of_exactly_min_silence_splits() {
        let track = track_with_bursts(5000, &[(1000, 2000), (2700, 3000)], 8000);

        let intervals = Segmenter::new(config(700, -40.0)).detect_nonsilent(&track);

        assert_eq!(
            intervals,
            vec![Interval::new(1000, 2000), Interval::new(2700, 3000)]
        );
    }

    #[test]
    fn trailing_speech_runs_to_track_end() {
        let track = track_with_bursts(4000, &[(3000, 4000)], 8000);

        let intervals = Segmenter::new(config(500, -40.0)).detect_nonsilent(&track);

        assert_eq!(intervals, vec![Interval::new(3000, 4000)]);
    }

    #[test]
    fn level_equal_to_threshold_counts_as_silence() {
        // -40 dBFS is 327.68; a peak of 327 sits at or below it.
        let quiet = track_with_bursts(3000, &[(1000, 2000)], 327);
        assert!(segment(&quiet, 500, -40.0).is_empty());

        let loud = track_with_bursts(3000, &[(1000, 2000)], 328);
        assert_eq!(segment(&loud, 500, -40.0).len(), 1);
    }

    #[test]
    fn rms_metric_ignores_isolated_clicks() {
        let mut samples = vec![0i16; 3 * RATE as usize];
        samples[RATE as usize + 100] = 2000;
        let track = AudioTrack::new(samples, RATE);

        let peak = Segmenter::new(config(500, -40.0)).detect_nonsilent(&track);
        assert_eq!(peak.len(), 1);

        let rms = Segmenter::new(SegmenterConfig {
            metric: LevelMetric::Rms,
            ..config(500, -40.0)
        })
        .detect_nonsilent(&track);
        assert!(rms.is_empty());
    }

    #[test]
    fn rms_metric_finds_sustained_speech() {
        let track = track_with_bursts(6000, &[(1000, 3000)], 5000);

        let intervals = Segmenter::new(SegmenterConfig {
            metric: LevelMetric::Rms,
            ..config(400, -40.0)
        })
        .detect_nonsilent(&track);

        assert_eq!(intervals.len(), 1);
        // RMS windows straddling the edges still average above threshold
        assert!(intervals[0].start_ms <= 1000 && intervals[0].end_ms >= 3000);
    }

    #[test]
    fn track_shorter_than_window_is_judged_whole() {
        let quiet = AudioTrack::silent(300, RATE);
        assert!(segment(&quiet, 700, -40.0).is_empty());

        let loud = track_with_bursts(300, &[(100, 200)], 9000);
        let segments = segment(&loud, 700, -40.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].interval, Interval::new(0, 300));
    }

    #[test]
    fn segments_carry_their_slice_and_index() {
        let track = track_with_bursts(10_000, &[(500, 2500), (6000, 9000)], 10_000);

        let segments = segment(&track, 300, -40.0);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].index, 0);
        assert_eq!(segments[1].index, 1);
        assert_eq!(segments[0].audio.duration_ms(), 2000);
        assert_eq!(segments[1].audio.duration_ms(), 3000);
        assert_eq!(segments[1].audio.samples()[0], 10_000);
    }

    #[test]
    fn silence_ranges_complement_intervals() {
        let track = track_with_bursts(8000, &[(1000, 2000), (5000, 6000)], 4000);
        let segmenter = Segmenter::new(config(500, -40.0));

        let silent = segmenter.detect_silence(&track);
        let speech = segmenter.detect_nonsilent(&track);

        let covered: u64 = silent
            .iter()
            .chain(speech.iter())
            .map(|i| i.duration_ms())
            .sum();
        assert_eq!(covered, 8000);
    }

    #[test]
    fn intervals_are_sorted_disjoint_and_bounded() {
        // xorshift keeps the burst layout deterministic
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };

        for _ in 0..20 {
            let total = 2000 + next() % 20_000;
            let mut bursts = Vec::new();
            let mut cursor = next() % 1500;
            while cursor + 50 < total {
                let len = 20 + next() % 1200;
                let end = (cursor + len).min(total);
                bursts.push((cursor, end));
                cursor = end + next() % 2000;
            }
            let track = track_with_bursts(total, &bursts, 3000);
            let min_silence = 100 + (next() % 1500) as u32;

            let intervals = Segmenter::new(config(min_silence, -40.0)).detect_nonsilent(&track);

            let sum: u64 = intervals.iter().map(|i| i.duration_ms()).sum();
            assert!(sum <= total);
            for pair in intervals.windows(2) {
                assert!(pair[0].end_ms <= pair[1].start_ms, "{:?}", pair);
                assert!(!pair[0].overlaps(&pair[1]));
            }
            for interval in &intervals {
                assert!(interval.start_ms < interval.end_ms);
                assert!(interval.end_ms <= total);
            }
            // every burst lies inside some interval
            for &(start, end) in &bursts {
                assert!(
                    intervals
                        .iter()
                        .any(|i| i.start_ms <= start && end <= i.end_ms),
                    "burst {}..{} not covered by {:?}",
                    start,
                    end,
                    intervals
                );
            }
        }
    }
}
