//! Duration alignment: forces a synthesized clip to fill its interval exactly.

use crate::audio::AudioTrack;
use crate::audio::track::samples_for_ms;
use crate::defaults::{MAX_TEMPO_STAGE, MIN_TEMPO_STAGE};
use crate::pipeline::types::Degradation;
use crate::stretch::TimeStretcher;
use std::sync::Arc;

/// Splits a speed ratio into stages each within `[0.5, 2.0]`.
///
/// The product of the returned stages equals `ratio`. Non-positive or
/// non-finite ratios yield the identity chain.
pub fn tempo_chain(ratio: f64) -> Vec<f64> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return vec![1.0];
    }

    let mut chain = Vec::new();
    let mut residual = ratio;
    while residual < MIN_TEMPO_STAGE {
        chain.push(MIN_TEMPO_STAGE);
        residual /= MIN_TEMPO_STAGE;
    }
    while residual > MAX_TEMPO_STAGE {
        chain.push(MAX_TEMPO_STAGE);
        residual /= MAX_TEMPO_STAGE;
    }
    chain.push(residual);
    chain
}

/// Result of aligning one clip.
#[derive(Debug, Clone)]
pub struct Aligned {
    pub clip: AudioTrack,
    /// Set when the stretcher failed and the clip was left unstretched.
    pub degradation: Option<Degradation>,
}

/// Time-stretches clips to target durations.
#[derive(Clone)]
pub struct DurationAligner {
    stretcher: Arc<dyn TimeStretcher>,
}

impl DurationAligner {
    pub fn new(stretcher: Arc<dyn TimeStretcher>) -> Self {
        Self { stretcher }
    }

    pub fn stretcher_name(&self) -> &str {
        self.stretcher.name()
    }

    /// Returns `clip` re-timed to exactly `target_ms`.
    ///
    /// An empty clip or a zero target gives silence. If the stretcher fails,
    /// the original clip is returned unchanged along with a degradation.
    pub fn align(&self, clip: &AudioTrack, target_ms: u64) -> Aligned {
        let rate = clip.sample_rate();
        let target_len = samples_for_ms(target_ms, rate);
        if clip.is_empty() || target_len == 0 {
            return Aligned {
                clip: AudioTrack::silent(target_ms, rate),
                degradation: None,
            };
        }

        let ratio = clip.len() as f64 / target_len as f64;
        if clip.len() == target_len {
            return Aligned {
                clip: clip.clone(),
                degradation: None,
            };
        }

        let chain = tempo_chain(ratio);
        log::debug!(
            "Aligning {}ms clip to {}ms (ratio {:.3}, {} stage(s), {})",
            clip.duration_ms(),
            target_ms,
            ratio,
            chain.len(),
            self.stretcher.name()
        );

        match self.stretcher.stretch_chain(clip, &chain) {
            Ok(stretched) => Aligned {
                clip: stretched.fit_to(target_ms),
                degradation: None,
            },
            Err(e) => {
                log::warn!("Time-stretch failed, keeping unstretched clip: {}", e);
                Aligned {
                    clip: clip.clone(),
                    degradation: Some(Degradation::StretchFailed(e.to_string())),
                }
            }
        }
    }
}
