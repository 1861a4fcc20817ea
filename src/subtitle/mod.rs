//! Subtitle emission.

pub mod srt;

pub use srt::{SrtDocument, SubtitleCue, emit, format_timestamp, parse_timestamp};
