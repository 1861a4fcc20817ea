//! Default configuration constants for redub.
//!
//! Shared between the config file, the CLI and the pipeline so the same
//! numbers show up everywhere.

/// Default minimum silence length in milliseconds.
///
/// Quiet stretches shorter than this are treated as pauses inside one
/// utterance rather than as segment boundaries.
pub const MIN_SILENCE_MS: u32 = 700;

/// Accepted range for the minimum silence length.
pub const MIN_SILENCE_RANGE_MS: (u32, u32) = (100, 20_000);

/// Default silence threshold in dBFS.
pub const SILENCE_THRESH_DB: f64 = -40.0;

/// Accepted range for the silence threshold.
pub const SILENCE_THRESH_RANGE_DB: (f64, f64) = (-80.0, 0.0);

/// Full-scale amplitude of 16-bit PCM, used as the 0 dBFS reference.
pub const FULL_SCALE: f64 = 32768.0;

/// Sample rate the extracted audio and the dubbed timeline use.
pub const SAMPLE_RATE: u32 = 44_100;

/// Duration of the silent clip substituted when synthesis produces nothing.
pub const PLACEHOLDER_SILENCE_MS: u64 = 500;

/// Default number of segments processed concurrently.
///
/// Kept small: every segment makes three remote calls.
pub const WORKERS: usize = 4;

/// Default per-segment processing timeout in seconds.
pub const SEGMENT_TIMEOUT_SECS: u64 = 120;

/// Lowest tempo factor a single stretch stage accepts.
pub const MIN_TEMPO_STAGE: f64 = 0.5;

/// Highest tempo factor a single stretch stage accepts.
pub const MAX_TEMPO_STAGE: f64 = 2.0;

/// Default target language code.
pub const DEFAULT_LANGUAGE: &str = "hi";

/// Default transcription model for the OpenAI-compatible endpoint.
pub const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Base URL of the OpenAI-compatible transcription API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Google translate endpoint (web client).
pub const TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Google text-to-speech endpoint.
pub const TTS_URL: &str = "https://translate.google.com/translate_tts";

/// Longest text chunk the TTS endpoint accepts per request.
pub const TTS_MAX_CHUNK_CHARS: usize = 100;

/// Timeout applied to each HTTP request made by a remote service.
pub const HTTP_TIMEOUT_SECS: u64 = 60;

/// Containers accepted as dubbing input.
pub const SUPPORTED_CONTAINERS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// Largest gap between the reported and decoded soundtrack length that is
/// put down to rounding.
pub const DURATION_TOLERANCE_MS: u64 = 50;

/// Audio codec for the muxed dub track.
pub const MUX_AUDIO_CODEC: &str = "aac";

/// Audio codec for WebM output, which cannot carry AAC.
pub const WEBM_AUDIO_CODEC: &str = "libopus";
