//! In-memory mono audio track.
//!
//! Millisecond positions map to sample indices with `floor(ms * rate / 1000)`
//! and a track reports `round(len * 1000 / rate)` milliseconds. With those two
//! rules `AudioTrack::silent(d, rate).duration_ms() == d` for every rate at or
//! above 2 kHz, and slicing `[a, b)` yields exactly `b - a` milliseconds.

/// Mono 16-bit PCM samples at a fixed sample rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl AudioTrack {
    /// Wraps existing samples.
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Creates `duration_ms` of digital silence.
    pub fn silent(duration_ms: u64, sample_rate: u32) -> Self {
        Self {
            samples: vec![0; samples_for_ms(duration_ms, sample_rate)],
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in milliseconds, rounded to the nearest millisecond.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        let rate = self.sample_rate as u64;
        (self.samples.len() as u64 * 1000 + rate / 2) / rate
    }

    /// Sample index of a millisecond position, clamped to the track length.
    pub fn index_at(&self, ms: u64) -> usize {
        samples_for_ms(ms, self.sample_rate).min(self.samples.len())
    }

    /// Copies the half-open range `[start_ms, end_ms)`; out-of-range parts are dropped.
    pub fn slice(&self, start_ms: u64, end_ms: u64) -> AudioTrack {
        let start = self.index_at(start_ms);
        let end = self.index_at(end_ms).max(start);
        AudioTrack::new(self.samples[start..end].to_vec(), self.sample_rate)
    }

    /// Adds `other` into this track starting at `position_ms`.
    ///
    /// Samples are summed with saturation; anything past the end of this track
    /// is discarded and the length never changes. Both tracks must share a
    /// sample rate (callers resample first).
    pub fn overlay(&mut self, other: &AudioTrack, position_ms: u64) {
        debug_assert_eq!(self.sample_rate, other.sample_rate);
        let start = self.index_at(position_ms);
        for (dst, &src) in self.samples[start..].iter_mut().zip(other.samples.iter()) {
            *dst = dst.saturating_add(src);
        }
    }

    /// Forces the track to exactly `duration_ms`, padding with silence or truncating.
    pub fn fit_to(mut self, duration_ms: u64) -> AudioTrack {
        let target = samples_for_ms(duration_ms, self.sample_rate);
        self.samples.resize(target, 0);
        self
    }

    /// Linear-interpolation resample to `sample_rate`.
    pub fn resampled(self, sample_rate: u32) -> AudioTrack {
        if self.sample_rate == sample_rate || self.sample_rate == 0 {
            return AudioTrack::new(self.samples, sample_rate);
        }
        let samples = resample(&self.samples, self.sample_rate, sample_rate);
        AudioTrack::new(samples, sample_rate)
    }
}

/// Number of samples covering `ms` milliseconds at `sample_rate`.
pub fn samples_for_ms(ms: u64, sample_rate: u32) -> usize {
    (ms as u128 * sample_rate as u128 / 1000) as usize
}

/// Simple linear interpolation resampling.
pub(crate) fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx.min(samples.len() - 1)]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}
