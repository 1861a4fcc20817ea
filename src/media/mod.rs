//! Media demuxing, probing and muxing.

pub mod ffmpeg;

pub use ffmpeg::FfmpegMedia;

use crate::audio::AudioTrack;
use crate::error::Result;
use std::path::Path;

/// Container-level operations the dubbing run depends on.
#[async_trait::async_trait]
pub trait MediaBackend: Send + Sync {
    /// Decodes the audio of `video` to a mono 16-bit WAV at `sample_rate`.
    async fn extract_audio(&self, video: &Path, output: &Path, sample_rate: u32) -> Result<()>;

    /// Container duration in seconds.
    async fn probe_duration(&self, media: &Path) -> Result<f64>;

    /// Copies the video stream of `video` without any audio.
    async fn strip_audio(&self, video: &Path, output: &Path) -> Result<()>;

    /// Combines a video-only file with a new audio track.
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()>;

    /// Decodes compressed audio bytes (e.g. MP3) into a mono track.
    async fn transcode_to_wav(&self, encoded: &[u8], sample_rate: u32) -> Result<AudioTrack>;
}

#[async_trait::async_trait]
impl<T: MediaBackend + ?Sized> MediaBackend for std::sync::Arc<T> {
    async fn extract_audio(&self, video: &Path, output: &Path, sample_rate: u32) -> Result<()> {
        (**self).extract_audio(video, output, sample_rate).await
    }

    async fn probe_duration(&self, media: &Path) -> Result<f64> {
        (**self).probe_duration(media).await
    }

    async fn strip_audio(&self, video: &Path, output: &Path) -> Result<()> {
        (**self).strip_audio(video, output).await
    }

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        (**self).mux(video, audio, output).await
    }

    async fn transcode_to_wav(&self, encoded: &[u8], sample_rate: u32) -> Result<AudioTrack> {
        (**self).transcode_to_wav(encoded, sample_rate).await
    }
}
