//! Timeline-preserving dubbing pipeline.
//!
//! Segmenter → (per segment: transformer → aligner) → compositor, with
//! subtitles derived from the segment intervals and translated texts.

pub mod aligner;
pub mod compositor;
pub mod orchestrator;
pub mod progress;
pub mod segmenter;
pub mod transformer;
pub mod types;

pub use aligner::{Aligned, DurationAligner, tempo_chain};
pub use compositor::composite;
pub use orchestrator::{DubOutput, DubPipeline, PipelineConfig};
pub use progress::{CollectorObserver, LogObserver, NoopObserver, ProgressEvent, ProgressObserver};
pub use segmenter::{Segmenter, SegmenterConfig, segment};
pub use transformer::{SegmentTransformer, Transformed};
pub use types::{Degradation, Interval, Segment, SegmentReport};
