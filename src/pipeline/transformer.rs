//! Per-segment transcribe → translate → synthesize.
//!
//! Never fails: every service error is replaced by its fallback and recorded
//! as a [`Degradation`].

use crate::audio::AudioTrack;
use crate::language::Language;
use crate::pipeline::types::{Degradation, Segment};
use crate::services::Services;

/// Output of transforming one segment.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub source_text: String,
    pub translated_text: String,
    /// Synthesized speech at the timeline sample rate.
    pub clip: AudioTrack,
    pub degradations: Vec<Degradation>,
}

/// Drives the three services for one segment at a time.
#[derive(Debug, Clone)]
pub struct SegmentTransformer {
    services: Services,
    language: Language,
    sample_rate: u32,
    placeholder_ms: u64,
}

impl SegmentTransformer {
    pub fn new(services: Services, language: Language, sample_rate: u32, placeholder_ms: u64) -> Self {
        Self {
            services,
            language,
            sample_rate,
            placeholder_ms,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    fn placeholder(&self) -> AudioTrack {
        AudioTrack::silent(self.placeholder_ms, self.sample_rate)
    }

    pub async fn transform(&self, segment: &Segment) -> Transformed {
        let index = segment.index;
        let mut degradations = Vec::new();

        let source_text = match self.services.transcriber.transcribe(&segment.audio).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                log::warn!("Segment {}: transcription failed: {}", index, e);
                degradations.push(Degradation::TranscriptionFailed(e.to_string()));
                String::new()
            }
        };

        let translated_text = if source_text.is_empty() {
            String::new()
        } else {
            match self.services.translator.translate(&source_text, self.language).await {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    log::warn!("Segment {}: translation failed, keeping source text: {}", index, e);
                    degradations.push(Degradation::TranslationFailed(e.to_string()));
                    source_text.clone()
                }
            }
        };

        let clip = if translated_text.is_empty() {
            log::debug!("Segment {}: nothing to say, using placeholder", index);
            degradations.push(Degradation::NothingToSynthesize);
            self.placeholder()
        } else {
            match self
                .services
                .synthesizer
                .synthesize(&translated_text, self.language)
                .await
            {
                Ok(clip) => clip.resampled(self.sample_rate),
                Err(e) => {
                    log::warn!("Segment {}: synthesis failed, using placeholder: {}", index, e);
                    degradations.push(Degradation::SynthesisFailed(e.to_string()));
                    self.placeholder()
                }
            }
        };

        Transformed {
            source_text,
            translated_text,
            clip,
            degradations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::Interval;
    use crate::services::{MockSynthesizer, MockTranscriber, MockTranslator};
    use std::sync::Arc;

    const RATE: u32 = 44_100;

    fn segment() -> Segment {
        Segment {
            index: 0,
            interval: Interval::new(500, 2500),
            audio: AudioTrack::silent(2000, RATE),
        }
    }

    fn transformer(
        transcriber: MockTranscriber,
        translator: MockTranslator,
        synthesizer: MockSynthesizer,
    ) -> SegmentTransformer {
        SegmentTransformer::new(
            Services::new(Arc::new(transcriber), Arc::new(translator), Arc::new(synthesizer)),
            Language::Hindi,
            RATE,
            500,
        )
    }

    #[tokio::test]
    async fn test_happy_path() {
        let t = transformer(
            MockTranscriber::new("m").with_response("hello"),
            MockTranslator::new(),
            MockSynthesizer::new().with_duration_for("[hi] hello", 1800),
        );

        let out = t.transform(&segment()).await;

        assert_eq!(out.source_text, "hello");
        assert_eq!(out.translated_text, "[hi] hello");
        assert_eq!(out.clip.sample_rate(), RATE);
        assert_eq!(out.clip.duration_ms(), 1800);
        assert!(out.degradations.is_empty());
    }

    #[tokio::test]
    async fn test_transcription_failure_skips_translation() {
        let translator = MockTranslator::new();
        let t = transformer(
            MockTranscriber::new("m").with_failure(),
            translator.clone(),
            MockSynthesizer::new(),
        );

        let out = t.transform(&segment()).await;

        assert_eq!(out.source_text, "");
        assert_eq!(out.translated_text, "");
        assert_eq!(out.clip.duration_ms(), 500);
        assert_eq!(translator.calls(), 0);
        assert!(matches!(out.degradations[0], Degradation::TranscriptionFailed(_)));
        assert_eq!(out.degradations[1], Degradation::NothingToSynthesize);
    }

    #[tokio::test]
    async fn test_no_speech_gives_placeholder() {
        let synthesizer = MockSynthesizer::new();
        let t = transformer(
            MockTranscriber::new("m").with_response("   "),
            MockTranslator::new(),
            synthesizer.clone(),
        );

        let out = t.transform(&segment()).await;

        assert_eq!(out.source_text, "");
        assert_eq!(out.clip.duration_ms(), 500);
        assert!(out.clip.samples().iter().all(|&s| s == 0));
        assert_eq!(synthesizer.calls(), 0);
        assert_eq!(out.degradations, vec![Degradation::NothingToSynthesize]);
    }

    #[tokio::test]
    async fn test_translation_failure_passes_source_through() {
        let synthesizer = MockSynthesizer::new().with_duration_for("hello", 900);
        let t = transformer(
            MockTranscriber::new("m").with_response("hello"),
            MockTranslator::new().with_failure(),
            synthesizer,
        );

        let out = t.transform(&segment()).await;

        assert_eq!(out.translated_text, "hello");
        assert_eq!(out.clip.duration_ms(), 900);
        assert!(matches!(out.degradations[..], [Degradation::TranslationFailed(_)]));
    }

    #[tokio::test]
    async fn test_blank_translation_gives_placeholder() {
        let t = transformer(
            MockTranscriber::new("m").with_response("hello"),
            MockTranslator::new().with_response(""),
            MockSynthesizer::new(),
        );

        let out = t.transform(&segment()).await;

        assert_eq!(out.translated_text, "");
        assert_eq!(out.clip.duration_ms(), 500);
        assert_eq!(out.degradations, vec![Degradation::NothingToSynthesize]);
    }

    #[tokio::test]
    async fn test_synthesis_failure_gives_placeholder() {
        let t = transformer(
            MockTranscriber::new("m").with_response("hello"),
            MockTranslator::new(),
            MockSynthesizer::new().with_failure(),
        );

        let out = t.transform(&segment()).await;

        assert_eq!(out.translated_text, "[hi] hello");
        assert_eq!(out.clip.duration_ms(), 500);
        assert!(matches!(out.degradations[..], [Degradation::SynthesisFailed(_)]));
    }
}
