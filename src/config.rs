use crate::audio::LevelMetric;
use crate::defaults;
use crate::error::{DubError, Result};
use crate::language::Language;
use crate::pipeline::{PipelineConfig, SegmenterConfig};
use crate::stretch::StretchBackend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub dub: DubConfig,
    pub segmenter: SegmenterSection,
    pub pipeline: PipelineSection,
    pub stretch: StretchSection,
    pub media: MediaSection,
    pub services: ServicesSection,
}

/// What to dub into and where to put the results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DubConfig {
    pub target_language: Language,
    /// Output directory; the input's directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

/// Silence detection tunables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmenterSection {
    pub min_silence_ms: u32,
    pub silence_thresh_db: f64,
    pub level: LevelMetric,
}

/// Concurrency and fallback settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSection {
    pub workers: usize,
    pub segment_timeout_secs: u64,
    pub placeholder_silence_ms: u64,
}

/// Time-stretch backend selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StretchSection {
    pub backend: StretchBackend,
}

/// External media tools
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MediaSection {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    /// Sample rate of the extracted audio and the dubbed track
    pub sample_rate: u32,
}

/// Remote service endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServicesSection {
    pub transcription_model: String,
    pub openai_base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    pub translate_url: String,
    pub tts_url: String,
}

impl Default for SegmenterSection {
    fn default() -> Self {
        Self {
            min_silence_ms: defaults::MIN_SILENCE_MS,
            silence_thresh_db: defaults::SILENCE_THRESH_DB,
            level: LevelMetric::default(),
        }
    }
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            workers: defaults::WORKERS,
            segment_timeout_secs: defaults::SEGMENT_TIMEOUT_SECS,
            placeholder_silence_ms: defaults::PLACEHOLDER_SILENCE_MS,
        }
    }
}

impl Default for MediaSection {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

impl Default for ServicesSection {
    fn default() -> Self {
        Self {
            transcription_model: defaults::TRANSCRIPTION_MODEL.to_string(),
            openai_base_url: defaults::OPENAI_BASE_URL.to_string(),
            openai_api_key: None,
            translate_url: defaults::TRANSLATE_URL.to_string(),
            tts_url: defaults::TTS_URL.to_string(),
        }
    }
}

fn invalid(key: &str, message: String) -> DubError {
    DubError::ConfigInvalidValue {
        key: key.to_string(),
        message,
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - REDUB_LANGUAGE → dub.target_language
    /// - REDUB_FFMPEG → media.ffmpeg
    /// - REDUB_FFPROBE → media.ffprobe
    /// - OPENAI_API_KEY → services.openai_api_key
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(language) = std::env::var("REDUB_LANGUAGE")
            && !language.is_empty()
        {
            self.dub.target_language = language.parse()?;
        }

        if let Ok(ffmpeg) = std::env::var("REDUB_FFMPEG")
            && !ffmpeg.is_empty()
        {
            self.media.ffmpeg = PathBuf::from(ffmpeg);
        }

        if let Ok(ffprobe) = std::env::var("REDUB_FFPROBE")
            && !ffprobe.is_empty()
        {
            self.media.ffprobe = PathBuf::from(ffprobe);
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY")
            && !key.is_empty()
        {
            self.services.openai_api_key = Some(key);
        }

        Ok(self)
    }

    /// Rejects out-of-range values before anything runs.
    pub fn validate(&self) -> Result<()> {
        let (min, max) = defaults::MIN_SILENCE_RANGE_MS;
        if !(min..=max).contains(&self.segmenter.min_silence_ms) {
            return Err(invalid(
                "segmenter.min_silence_ms",
                format!(
                    "{} is outside {}..={} ms",
                    self.segmenter.min_silence_ms, min, max
                ),
            ));
        }

        let (low, high) = defaults::SILENCE_THRESH_RANGE_DB;
        let thresh = self.segmenter.silence_thresh_db;
        if !thresh.is_finite() || !(low..=high).contains(&thresh) {
            return Err(invalid(
                "segmenter.silence_thresh_db",
                format!("{} is outside {}..={} dB", thresh, low, high),
            ));
        }

        if !(1..=64).contains(&self.pipeline.workers) {
            return Err(invalid(
                "pipeline.workers",
                format!("{} is outside 1..=64", self.pipeline.workers),
            ));
        }

        if self.pipeline.segment_timeout_secs == 0 {
            return Err(invalid(
                "pipeline.segment_timeout_secs",
                "must be at least 1 second".to_string(),
            ));
        }

        if self.pipeline.placeholder_silence_ms == 0 {
            return Err(invalid(
                "pipeline.placeholder_silence_ms",
                "must be at least 1 ms".to_string(),
            ));
        }

        if !(8_000..=192_000).contains(&self.media.sample_rate) {
            return Err(invalid(
                "media.sample_rate",
                format!("{} is outside 8000..=192000 Hz", self.media.sample_rate),
            ));
        }

        Ok(())
    }

    /// The API key for transcription, or a configuration error if none is set.
    pub fn require_api_key(&self) -> Result<&str> {
        self.services
            .openai_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                invalid(
                    "services.openai_api_key",
                    "not set (export OPENAI_API_KEY or add it to the config file)".to_string(),
                )
            })
    }

    /// Pipeline settings derived from this configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            segmenter: SegmenterConfig {
                min_silence_ms: self.segmenter.min_silence_ms,
                silence_thresh_db: self.segmenter.silence_thresh_db,
                metric: self.segmenter.level,
            },
            language: self.dub.target_language,
            workers: self.pipeline.workers,
            segment_timeout: Duration::from_secs(self.pipeline.segment_timeout_secs),
            placeholder_ms: self.pipeline.placeholder_silence_ms,
        }
    }

    /// Copy with the API key masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.services.openai_api_key.is_some() {
            config.services.openai_api_key = Some("********".to_string());
        }
        config
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/redub/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("redub")
            .join("config.toml")
    }
}
