//! Waveform-similarity overlap-add (WSOLA) time-stretching.
//!
//! Output frames are laid down every `N / 2` samples under a Hann window.
//! The matching input frame is taken near `k * hop * tempo`, shifted within a
//! small tolerance to the position whose waveform best continues the previous
//! frame. Only the read positions move, so the local waveform (and the pitch)
//! is preserved.
//!
//! The similarity search first scans the tolerance window at a coarse stride
//! and then refines around the best coarse match. Its cost still grows with
//! the sample rate, so the `ffmpeg` backend is faster for long clips.

use super::TimeStretcher;
use crate::audio::AudioTrack;
use crate::audio::track::samples_for_ms;
use crate::error::{DubError, Result};

const FRAME_MS: u64 = 40;
const TOLERANCE_MS: u64 = 5;
const MIN_FRAME: usize = 32;
/// Every n-th sample contributes to the similarity search.
const CORRELATION_STEP: usize = 4;
/// Stride of the coarse similarity scan.
const SEARCH_STEP: usize = 4;

/// In-process WSOLA stretcher.
#[derive(Debug, Clone)]
pub struct WsolaStretcher {
    frame_ms: u64,
    tolerance_ms: u64,
}

impl Default for WsolaStretcher {
    fn default() -> Self {
        Self {
            frame_ms: FRAME_MS,
            tolerance_ms: TOLERANCE_MS,
        }
    }
}

impl WsolaStretcher {
    pub fn new(frame_ms: u64, tolerance_ms: u64) -> Self {
        Self {
            frame_ms: frame_ms.max(1),
            tolerance_ms,
        }
    }
}

impl TimeStretcher for WsolaStretcher {
    fn stretch(&self, clip: &AudioTrack, tempo: f64) -> Result<AudioTrack> {
        if !tempo.is_finite() || tempo <= 0.0 {
            return Err(DubError::TimeStretch {
                message: format!("invalid tempo {}", tempo),
            });
        }
        if clip.is_empty() || (tempo - 1.0).abs() < 1e-9 {
            return Ok(clip.clone());
        }

        let rate = clip.sample_rate();
        let frame = (samples_for_ms(self.frame_ms, rate).max(MIN_FRAME) / 2) * 2;
        let tolerance = samples_for_ms(self.tolerance_ms, rate);
        let samples = wsola(clip.samples(), tempo, frame, tolerance);

        Ok(AudioTrack::new(samples, rate))
    }

    fn name(&self) -> &str {
        "native"
    }
}

/// Periodic Hann window of length `n`.
fn hann(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            (0.5 - 0.5 * phase.cos()) as f32
        })
        .collect()
}

fn wsola(samples: &[i16], tempo: f64, frame: usize, tolerance: usize) -> Vec<i16> {
    let out_len = (samples.len() as f64 / tempo).round() as usize;
    if out_len == 0 {
        return Vec::new();
    }

    let hop = frame / 2;
    let window = hann(frame);

    // Zero padding lets every frame and search position read in bounds.
    let pad = frame * 2 + tolerance * 2 + hop;
    let mut input: Vec<f32> = Vec::with_capacity(samples.len() + pad);
    input.extend(samples.iter().map(|&s| s as f32));
    input.resize(samples.len() + pad, 0.0);

    let mut output = vec![0.0f32; out_len + frame];
    let mut norm = vec![0.0f32; out_len + frame];

    let mut previous = 0usize;
    let mut k = 0usize;
    loop {
        let out_pos = k * hop;
        if out_pos >= out_len {
            break;
        }

        let offset = if k == 0 {
            0
        } else {
            let nominal = (out_pos as f64 * tempo).round() as usize;
            let natural = previous + hop;
            best_offset(&input, natural, nominal, frame, tolerance)
        };

        let source = &input[offset..offset + frame];
        for (i, (&x, &w)) in source.iter().zip(window.iter()).enumerate() {
            output[out_pos + i] += x * w;
            norm[out_pos + i] += w;
        }

        previous = offset;
        k += 1;
    }

    output
        .iter()
        .zip(norm.iter())
        .take(out_len)
        .map(|(&value, &weight)| {
            let value = if weight > 1e-6 { value / weight } else { value };
            value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
        })
        .collect()
}

/// Input position near `nominal` whose frame best matches the one starting at `natural`.
fn best_offset(input: &[f32], natural: usize, nominal: usize, frame: usize, tolerance: usize) -> usize {
    let limit = input.len().saturating_sub(frame);
    let natural = natural.min(limit);
    let low = nominal.saturating_sub(tolerance);
    let high = (nominal + tolerance).min(limit);
    let nominal = nominal.min(limit);
    if low >= high {
        return nominal;
    }

    let reference = &input[natural..natural + frame];
    let score = |candidate: usize| correlation(reference, &input[candidate..candidate + frame]);

    let mut best = nominal;
    let mut best_score = score(nominal);
    for candidate in (low..=high).step_by(SEARCH_STEP) {
        let value = score(candidate);
        if value > best_score {
            best_score = value;
            best = candidate;
        }
    }

    let coarse = best;
    let fine_low = coarse.saturating_sub(SEARCH_STEP - 1).max(low);
    let fine_high = (coarse + SEARCH_STEP - 1).min(high);
    for candidate in fine_low..=fine_high {
        let value = score(candidate);
        if value > best_score {
            best_score = value;
            best = candidate;
        }
    }
    best
}

fn correlation(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .step_by(CORRELATION_STEP)
        .map(|(x, y)| x * y)
        .sum()
}
