//! Time-stretching through ffmpeg's `atempo` filter.
//!
//! Runs synchronously; the aligner calls it from the blocking pool.

use super::TimeStretcher;
use crate::audio::AudioTrack;
use crate::audio::wav;
use crate::error::{DubError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Stretcher that shells out to ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegStretcher {
    ffmpeg: PathBuf,
}

impl FfmpegStretcher {
    pub fn new(ffmpeg: &Path) -> Self {
        Self {
            ffmpeg: ffmpeg.to_path_buf(),
        }
    }
}

/// Renders a tempo chain as an ffmpeg filter, e.g. `atempo=2,atempo=1.5`.
pub fn atempo_filter(chain: &[f64]) -> String {
    chain
        .iter()
        .map(|tempo| format!("atempo={}", tempo))
        .collect::<Vec<_>>()
        .join(",")
}

fn stretch_error(message: impl Into<String>) -> DubError {
    DubError::TimeStretch {
        message: message.into(),
    }
}

impl TimeStretcher for FfmpegStretcher {
    fn stretch(&self, clip: &AudioTrack, tempo: f64) -> Result<AudioTrack> {
        self.stretch_chain(clip, &[tempo])
    }

    fn stretch_chain(&self, clip: &AudioTrack, chain: &[f64]) -> Result<AudioTrack> {
        if chain.is_empty() || clip.is_empty() {
            return Ok(clip.clone());
        }
        if let Some(bad) = chain.iter().find(|t| !t.is_finite() || **t <= 0.0) {
            return Err(stretch_error(format!("invalid tempo {}", bad)));
        }

        let dir = tempfile::tempdir()
            .map_err(|e| stretch_error(format!("failed to create temp dir: {}", e)))?;
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        wav::write_track(clip, &input)?;

        let filter = atempo_filter(chain);
        log::debug!("{} -i {} -filter:a {}", self.ffmpeg.display(), input.display(), filter);

        let result = Command::new(&self.ffmpeg)
            .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(&input)
            .args(["-filter:a", &filter, "-ac", "1", "-ar"])
            .arg(clip.sample_rate().to_string())
            .args(["-acodec", "pcm_s16le"])
            .arg(&output)
            .output()
            .map_err(|e| stretch_error(format!("failed to run {}: {}", self.ffmpeg.display(), e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(stretch_error(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        wav::read_track_from_path(&output)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}
