//! Audio primitives: the in-memory track, loudness math and WAV I/O.

pub mod level;
pub mod track;
pub mod wav;

pub use level::LevelMetric;
pub use track::AudioTrack;
