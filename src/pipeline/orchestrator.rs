//! Dubbing pipeline: segment, transform and align concurrently, then composite.
//!
//! Segments run as tokio tasks limited by a semaphore. Each task transcribes,
//! translates and synthesizes its segment, then aligns the clip on the
//! blocking pool. Compositing waits for every task, so the timeline is built
//! by a single owner.

use crate::audio::AudioTrack;
use crate::defaults;
use crate::error::{DubError, Result};
use crate::language::Language;
use crate::pipeline::aligner::DurationAligner;
use crate::pipeline::compositor::composite;
use crate::pipeline::progress::{NoopObserver, ProgressEvent, ProgressObserver};
use crate::pipeline::segmenter::{Segmenter, SegmenterConfig};
use crate::pipeline::transformer::SegmentTransformer;
use crate::pipeline::types::{Degradation, Interval, Segment, SegmentReport};
use crate::services::Services;
use crate::stretch::TimeStretcher;
use crate::subtitle::SrtDocument;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub segmenter: SegmenterConfig,
    pub language: Language,
    /// Segments processed concurrently
    pub workers: usize,
    /// Budget for transforming and aligning one segment
    pub segment_timeout: Duration,
    /// Length of the silence used when there is nothing to synthesize
    pub placeholder_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            language: Language::default(),
            workers: defaults::WORKERS,
            segment_timeout: Duration::from_secs(defaults::SEGMENT_TIMEOUT_SECS),
            placeholder_ms: defaults::PLACEHOLDER_SILENCE_MS,
        }
    }
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct DubOutput {
    /// Dubbed track, exactly as long as the input.
    pub timeline: AudioTrack,
    pub subtitles: SrtDocument,
    /// One report per segment, in segment order.
    pub reports: Vec<SegmentReport>,
}

impl DubOutput {
    /// Number of segments that took at least one fallback.
    pub fn degraded_segments(&self) -> usize {
        self.reports.iter().filter(|r| r.is_degraded()).count()
    }
}

/// A finished segment: its report and the clip to lay down.
struct Finished {
    report: SegmentReport,
    clip: AudioTrack,
}

impl Finished {
    /// Silence of the full interval, used when a segment did not complete.
    fn silent(segment_index: usize, interval: Interval, rate: u32, degradation: Degradation) -> Self {
        Self {
            report: SegmentReport {
                index: segment_index,
                interval,
                source_text: String::new(),
                translated_text: String::new(),
                synthesized_ms: 0,
                aligned_ms: interval.duration_ms(),
                degradations: vec![degradation],
            },
            clip: AudioTrack::silent(interval.duration_ms(), rate),
        }
    }
}

/// Re-dubs an audio track.
pub struct DubPipeline {
    config: PipelineConfig,
    services: Services,
    aligner: DurationAligner,
    observer: Arc<dyn ProgressObserver>,
}

impl DubPipeline {
    pub fn new(config: PipelineConfig, services: Services, stretcher: Arc<dyn TimeStretcher>) -> Self {
        Self {
            config,
            services,
            aligner: DurationAligner::new(stretcher),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Replaces the progress observer.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the whole pipeline over `track`.
    ///
    /// Service and stretch failures never fail the run; they show up as
    /// degradations in the reports. Only internal task failures return `Err`.
    pub async fn run(&self, track: AudioTrack) -> Result<DubOutput> {
        let started = Instant::now();
        let total_ms = track.duration_ms();
        let rate = track.sample_rate();

        let segmenter = Segmenter::new(self.config.segmenter);
        let segments = tokio::task::spawn_blocking(move || segmenter.segment(&track))
            .await
            .map_err(|e| DubError::Other(format!("Segmentation task failed: {}", e)))?;

        self.observer.on_event(&ProgressEvent::Segmented {
            count: segments.len(),
            total_ms,
        });

        let transformer = Arc::new(SegmentTransformer::new(
            self.services.clone(),
            self.config.language,
            rate,
            self.config.placeholder_ms,
        ));
        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));

        let mut handles: Vec<(usize, Interval, JoinHandle<Finished>)> = Vec::with_capacity(segments.len());
        for segment in segments {
            let index = segment.index;
            let interval = segment.interval;
            let handle = tokio::spawn(process_segment(
                segment,
                Arc::clone(&transformer),
                self.aligner.clone(),
                Arc::clone(&self.observer),
                Arc::clone(&semaphore),
                self.config.segment_timeout,
            ));
            handles.push((index, interval, handle));
        }

        let mut finished = Vec::with_capacity(handles.len());
        for (index, interval, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    log::warn!("Segment {} aborted: {}", index, e);
                    let result =
                        Finished::silent(index, interval, rate, Degradation::Aborted(e.to_string()));
                    self.observer.on_event(&ProgressEvent::SegmentFinished {
                        report: result.report.clone(),
                    });
                    result
                }
            };
            finished.push(result);
        }

        self.observer.on_event(&ProgressEvent::CompositingStarted);
        let timeline = composite(
            total_ms,
            rate,
            finished
                .iter()
                .map(|f| (&f.clip, f.report.interval.start_ms)),
        );
        self.observer.on_event(&ProgressEvent::CompositingFinished {
            duration_ms: timeline.duration_ms(),
        });

        let reports: Vec<SegmentReport> = finished.into_iter().map(|f| f.report).collect();
        let subtitles = SrtDocument::from_triples(reports.iter().map(|r| {
            (
                r.interval.start_ms,
                r.interval.end_ms,
                r.translated_text.as_str(),
            )
        }));

        let output = DubOutput {
            timeline,
            subtitles,
            reports,
        };
        log::info!(
            "Dubbed {} segment(s) into {} in {:.1}s ({} with fallbacks)",
            output.reports.len(),
            self.config.language.name(),
            started.elapsed().as_secs_f64(),
            output.degraded_segments()
        );
        Ok(output)
    }
}

async fn process_segment(
    segment: Segment,
    transformer: Arc<SegmentTransformer>,
    aligner: DurationAligner,
    observer: Arc<dyn ProgressObserver>,
    semaphore: Arc<Semaphore>,
    segment_timeout: Duration,
) -> Finished {
    // Held until the segment is done; the semaphore is never closed.
    let _permit = semaphore.acquire_owned().await;

    let index = segment.index;
    let interval = segment.interval;
    let rate = segment.audio.sample_rate();
    observer.on_event(&ProgressEvent::SegmentStarted { index, interval });

    let work = async {
        let transformed = transformer.transform(&segment).await;
        let synthesized_ms = transformed.clip.duration_ms();
        let target_ms = interval.duration_ms();
        let clip = transformed.clip;
        let aligned = tokio::task::spawn_blocking(move || aligner.align(&clip, target_ms)).await;

        let mut degradations = transformed.degradations;
        let clip = match aligned {
            Ok(aligned) => {
                degradations.extend(aligned.degradation);
                aligned.clip
            }
            Err(e) => {
                log::warn!("Segment {}: alignment task failed: {}", index, e);
                degradations.push(Degradation::Aborted(e.to_string()));
                AudioTrack::silent(target_ms, rate)
            }
        };

        Finished {
            report: SegmentReport {
                index,
                interval,
                source_text: transformed.source_text,
                translated_text: transformed.translated_text,
                synthesized_ms,
                aligned_ms: clip.duration_ms(),
                degradations,
            },
            clip,
        }
    };

    let result = match tokio::time::timeout(segment_timeout, work).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!(
                "Segment {} ({}) exceeded {:?}, substituting silence",
                index,
                interval,
                segment_timeout
            );
            Finished::silent(index, interval, rate, Degradation::TimedOut)
        }
    };

    observer.on_event(&ProgressEvent::SegmentFinished {
        report: result.report.clone(),
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as DubResult;
    use crate::pipeline::progress::CollectorObserver;
    use crate::services::{MockSynthesizer, MockTranscriber, MockTranslator, Synthesizer};
    use crate::stretch::WsolaStretcher;

    const RATE: u32 = 16_000;

    fn track_with_bursts(total_ms: u64, bursts: &[(u64, u64)]) -> AudioTrack {
        let mut track = AudioTrack::silent(total_ms, RATE);
        for &(start, end) in bursts {
            let len = AudioTrack::silent(end - start, RATE).len();
            let burst = (0..len).map(|i| if i % 2 == 0 { 9000 } else { -9000 }).collect();
            track.overlay(&AudioTrack::new(burst, RATE), start);
        }
        track
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            segmenter: SegmenterConfig {
                min_silence_ms: 300,
                ..SegmenterConfig::default()
            },
            ..PipelineConfig::default()
        }
    }

    fn services(synthesizer: Arc<dyn Synthesizer>) -> Services {
        Services::new(
            Arc::new(MockTranscriber::new("m").with_response("hello")),
            Arc::new(MockTranslator::new()),
            synthesizer,
        )
    }

    fn pipeline(config: PipelineConfig, synthesizer: Arc<dyn Synthesizer>) -> DubPipeline {
        DubPipeline::new(config, services(synthesizer), Arc::new(WsolaStretcher::default()))
    }

    /// Synthesizer that never answers.
    struct StalledSynthesizer;

    #[async_trait::async_trait]
    impl Synthesizer for StalledSynthesizer {
        async fn synthesize(&self, _text: &str, _language: Language) -> DubResult<AudioTrack> {
            std::future::pending().await
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    /// Synthesizer that panics.
    struct PanickingSynthesizer;

    #[async_trait::async_trait]
    impl Synthesizer for PanickingSynthesizer {
        async fn synthesize(&self, _text: &str, _language: Language) -> DubResult<AudioTrack> {
            panic!("synthesizer exploded")
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[tokio::test]
    async fn test_timeline_keeps_input_length() {
        let track = track_with_bursts(10_000, &[(500, 2500), (6000, 9000)]);
        let out = pipeline(config(), Arc::new(MockSynthesizer::new()))
            .run(track)
            .await
            .unwrap();

        assert_eq!(out.timeline.duration_ms(), 10_000);
        assert_eq!(out.timeline.sample_rate(), RATE);
        assert_eq!(out.reports.len(), 2);
        assert_eq!(out.subtitles.len(), 2);
        assert_eq!(out.reports[0].aligned_ms, 2000);
        assert_eq!(out.reports[1].aligned_ms, 3000);
        assert_eq!(out.degraded_segments(), 0);
    }

    #[tokio::test]
    async fn test_silent_input_gives_silent_timeline() {
        let observer = Arc::new(CollectorObserver::new());
        let out = pipeline(config(), Arc::new(MockSynthesizer::new()))
            .with_observer(observer.clone())
            .run(AudioTrack::silent(4000, RATE))
            .await
            .unwrap();

        assert_eq!(out.timeline.duration_ms(), 4000);
        assert!(out.timeline.samples().iter().all(|&s| s == 0));
        assert!(out.subtitles.is_empty());
        assert!(out.reports.is_empty());

        let events = observer.events();
        assert!(matches!(events[0], ProgressEvent::Segmented { count: 0, total_ms: 4000 }));
        assert!(matches!(events[1], ProgressEvent::CompositingStarted));
        assert!(matches!(events[2], ProgressEvent::CompositingFinished { duration_ms: 4000 }));
    }

    #[tokio::test]
    async fn test_timed_out_segment_becomes_silence() {
        let mut config = config();
        config.segment_timeout = Duration::from_millis(50);
        let track = track_with_bursts(3000, &[(500, 1500)]);

        let out = pipeline(config, Arc::new(StalledSynthesizer))
            .run(track)
            .await
            .unwrap();

        assert_eq!(out.reports[0].degradations, vec![Degradation::TimedOut]);
        assert_eq!(out.reports[0].translated_text, "");
        assert_eq!(out.timeline.duration_ms(), 3000);
        assert!(out.timeline.samples().iter().all(|&s| s == 0));
        assert_eq!(out.subtitles.cues()[0].text, "");
    }

    #[tokio::test]
    async fn test_panicking_segment_is_aborted_not_fatal() {
        let track = track_with_bursts(3000, &[(500, 1500)]);

        let out = pipeline(config(), Arc::new(PanickingSynthesizer))
            .run(track)
            .await
            .unwrap();

        assert!(matches!(out.reports[0].degradations[..], [Degradation::Aborted(_)]));
        assert_eq!(out.reports[0].aligned_ms, 1000);
        assert_eq!(out.timeline.duration_ms(), 3000);
    }

    #[tokio::test]
    async fn test_events_bracket_every_segment() {
        let observer = Arc::new(CollectorObserver::new());
        let track = track_with_bursts(10_000, &[(500, 2500), (6000, 9000)]);

        pipeline(config(), Arc::new(MockSynthesizer::new()))
            .with_observer(observer.clone())
            .run(track)
            .await
            .unwrap();

        let events = observer.events();
        let started = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::SegmentStarted { .. }))
            .count();
        let finished = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::SegmentFinished { .. }))
            .count();
        assert_eq!(started, 2);
        assert_eq!(finished, 2);
        let compositing = events
            .iter()
            .position(|e| matches!(e, ProgressEvent::CompositingStarted))
            .unwrap();
        // Barrier: all segments finish before compositing starts
        let finished_before = events[..compositing]
            .iter()
            .filter(|e| matches!(e, ProgressEvent::SegmentFinished { .. }))
            .count();
        assert_eq!(finished_before, 2);
    }

    #[tokio::test]
    async fn test_single_worker_still_completes() {
        let mut config = config();
        config.workers = 1;
        let track = track_with_bursts(10_000, &[(500, 1500), (3000, 4000), (6000, 7000)]);

        let out = pipeline(config, Arc::new(MockSynthesizer::new()))
            .run(track)
            .await
            .unwrap();

        let indices: Vec<usize> = out.reports.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
