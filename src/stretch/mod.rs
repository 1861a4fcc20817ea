//! Pitch-preserving time-stretch backends.

pub mod ffmpeg;
pub mod wsola;

pub use ffmpeg::FfmpegStretcher;
pub use wsola::WsolaStretcher;

use crate::audio::AudioTrack;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Changes playback speed without changing pitch.
///
/// A tempo of 2.0 plays twice as fast (half the length), 0.5 half as fast.
pub trait TimeStretcher: Send + Sync {
    /// Applies a single tempo factor.
    fn stretch(&self, clip: &AudioTrack, tempo: f64) -> Result<AudioTrack>;

    /// Applies a chain of tempo factors one stage after another.
    fn stretch_chain(&self, clip: &AudioTrack, chain: &[f64]) -> Result<AudioTrack> {
        let mut current = clip.clone();
        for &tempo in chain {
            current = self.stretch(&current, tempo)?;
        }
        Ok(current)
    }

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

impl<T: TimeStretcher + ?Sized> TimeStretcher for Arc<T> {
    fn stretch(&self, clip: &AudioTrack, tempo: f64) -> Result<AudioTrack> {
        (**self).stretch(clip, tempo)
    }

    fn stretch_chain(&self, clip: &AudioTrack, chain: &[f64]) -> Result<AudioTrack> {
        (**self).stretch_chain(clip, chain)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Which time-stretcher the aligner uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StretchBackend {
    /// In-process WSOLA.
    #[default]
    Native,
    /// ffmpeg `atempo` filter chain.
    Ffmpeg,
}

impl std::fmt::Display for StretchBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StretchBackend::Native => f.write_str("native"),
            StretchBackend::Ffmpeg => f.write_str("ffmpeg"),
        }
    }
}

impl std::str::FromStr for StretchBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "wsola" => Ok(StretchBackend::Native),
            "ffmpeg" | "atempo" => Ok(StretchBackend::Ffmpeg),
            other => Err(format!(
                "unknown stretch backend '{}' (expected native or ffmpeg)",
                other
            )),
        }
    }
}

/// Builds the stretcher for `backend`.
pub fn create_stretcher(backend: StretchBackend, ffmpeg: &Path) -> Arc<dyn TimeStretcher> {
    match backend {
        StretchBackend::Native => Arc::new(WsolaStretcher::default()),
        StretchBackend::Ffmpeg => Arc::new(FfmpegStretcher::new(ffmpeg)),
    }
}
