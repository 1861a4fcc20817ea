//! redub - Re-dub a video into another language
//!
//! Splits the soundtrack at silences, transcribes, translates and
//! re-synthesizes each speech segment, fits it to the original timing and
//! remuxes the result together with SubRip subtitles.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
#[cfg(feature = "cli")]
pub mod diagnostics;
pub mod dub;
pub mod error;
pub mod language;
pub mod media;
pub mod pipeline;
pub mod services;
pub mod stretch;
pub mod subtitle;

// Composition root - needs the CLI and the remote services
#[cfg(all(feature = "cli", feature = "remote"))]
pub mod app;

// Core traits (media → services → stretch)
pub use media::MediaBackend;
pub use services::{Services, Synthesizer, Transcriber, Translator};
pub use stretch::TimeStretcher;

// Pipeline
pub use pipeline::{DubOutput, DubPipeline, PipelineConfig, ProgressEvent, ProgressObserver};

// Data
pub use audio::AudioTrack;
pub use language::Language;
pub use subtitle::SrtDocument;

// Error handling
pub use error::{DubError, Result};

// Config
pub use config::Config;

// Video workflow
pub use dub::{DubArtifacts, DubRequest, dub_video};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
