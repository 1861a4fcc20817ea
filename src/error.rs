//! Error types for redub.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DubError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Unsupported target language: {code}")]
    UnsupportedLanguage { code: String },

    #[error("Unsupported input container: {path}")]
    UnsupportedContainer { path: String },

    // Media tool errors
    #[error("Media tool not found: {tool}")]
    MediaToolNotFound { tool: String },

    #[error("{tool} failed: {message}")]
    MediaCommand { tool: String, message: String },

    #[error("Failed to probe media duration: {message}")]
    Probe { message: String },

    // Audio codec errors
    #[error("Failed to decode audio: {message}")]
    AudioDecode { message: String },

    #[error("Failed to encode audio: {message}")]
    AudioEncode { message: String },

    // External service errors (recovered per segment)
    #[error("Transcription error: {message}")]
    Transcription { message: String },

    #[error("Translation error: {message}")]
    Translation { message: String },

    #[error("Speech synthesis error: {message}")]
    Synthesis { message: String },

    #[error("Time-stretch failed: {message}")]
    TimeStretch { message: String },

    // Subtitle errors
    #[error("Malformed subtitle document at line {line}: {message}")]
    SubtitleParse { line: usize, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DubError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_invalid_value_display() {
        let error = DubError::ConfigInvalidValue {
            key: "segmenter.min_silence_ms".to_string(),
            message: "must be between 100 and 20000".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for segmenter.min_silence_ms: must be between 100 and 20000"
        );
    }

    #[test]
    fn test_unsupported_language_display() {
        let error = DubError::UnsupportedLanguage {
            code: "xx".to_string(),
        };
        assert_eq!(error.to_string(), "Unsupported target language: xx");
    }

    #[test]
    fn test_media_command_display() {
        let error = DubError::MediaCommand {
            tool: "ffmpeg".to_string(),
            message: "exit status 1".to_string(),
        };
        assert_eq!(error.to_string(), "ffmpeg failed: exit status 1");
    }

    #[test]
    fn test_subtitle_parse_display() {
        let error = DubError::SubtitleParse {
            line: 3,
            message: "expected timestamp line".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Malformed subtitle document at line 3: expected timestamp line"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: DubError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: DubError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_source_chain_io() {
        let error: DubError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<DubError>();
        assert_sync::<DubError>();
    }
}
