use crate::audio::AudioTrack;
use crate::audio::track::samples_for_ms;
use crate::error::{DubError, Result};
use crate::language::Language;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Text-to-speech.
#[async_trait::async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speaks `text` in `language`. The clip may use any sample rate.
    async fn synthesize(&self, text: &str, language: Language) -> Result<AudioTrack>;

    fn name(&self) -> &str;
}

#[async_trait::async_trait]
impl<T: Synthesizer + ?Sized> Synthesizer for Arc<T> {
    async fn synthesize(&self, text: &str, language: Language) -> Result<AudioTrack> {
        (**self).synthesize(text, language).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Splits text into chunks of at most `max_chars` characters at word boundaries.
///
/// Words longer than `max_chars` are cut. Whitespace runs collapse to one space.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Mock synthesizer for testing.
///
/// Produces a steady tone whose length is looked up by text, falling back to
/// a default duration.
#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    sample_rate: u32,
    default_ms: u64,
    by_text: HashMap<String, u64>,
    should_fail: bool,
    calls: Arc<AtomicUsize>,
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            default_ms: 1000,
            by_text: HashMap::new(),
            should_fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample rate of the produced clips
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_default_duration(mut self, duration_ms: u64) -> Self {
        self.default_ms = duration_ms;
        self
    }

    /// Speak `text` for exactly `duration_ms`
    pub fn with_duration_for(mut self, text: &str, duration_ms: u64) -> Self {
        self.by_text.insert(text.to_string(), duration_ms);
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, _language: Language) -> Result<AudioTrack> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(DubError::Synthesis {
                message: "mock synthesis failure".to_string(),
            });
        }

        let duration_ms = self.by_text.get(text).copied().unwrap_or(self.default_ms);
        let len = samples_for_ms(duration_ms, self.sample_rate);
        let step = 2.0 * std::f64::consts::PI * 220.0 / self.sample_rate as f64;
        let samples = (0..len)
            .map(|i| ((i as f64 * step).sin() * 4000.0) as i16)
            .collect();
        Ok(AudioTrack::new(samples, self.sample_rate))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_short_text_is_one_chunk() {
        assert_eq!(split_text("hello world", 100), vec!["hello world"]);
    }

    #[test]
    fn test_split_respects_word_boundaries() {
        let chunks = split_text("aaa bbb ccc ddd", 7);
        assert_eq!(chunks, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn test_split_counts_characters_not_bytes() {
        // Each Devanagari word is 4 chars but 12 bytes
        let chunks = split_text("नमस् नमस् नमस्", 9);
        assert_eq!(chunks, vec!["नमस् नमस्", "नमस्"]);
    }

    #[test]
    fn test_split_cuts_overlong_words() {
        let chunks = split_text("ab abcdefgh cd", 3);
        assert_eq!(chunks, vec!["ab", "abc", "def", "gh", "cd"]);
    }

    #[test]
    fn test_split_never_exceeds_limit() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(20);
        for chunk in split_text(&text, 100) {
            assert!(chunk.chars().count() <= 100);
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn test_split_blank_text_is_empty() {
        assert!(split_text("   \n\t", 100).is_empty());
    }

    #[tokio::test]
    async fn test_mock_synthesizer_durations() {
        let synth = MockSynthesizer::new()
            .with_default_duration(700)
            .with_duration_for("long", 2500);

        let long = synth.synthesize("long", Language::Hindi).await.unwrap();
        let other = synth.synthesize("other", Language::Hindi).await.unwrap();

        assert_eq!(long.duration_ms(), 2500);
        assert_eq!(long.sample_rate(), 24_000);
        assert_eq!(other.duration_ms(), 700);
        assert!(long.samples().iter().any(|&s| s != 0));
        assert_eq!(synth.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_synthesizer_failure() {
        let synth = MockSynthesizer::new().with_failure();
        assert!(matches!(
            synth.synthesize("x", Language::English).await,
            Err(DubError::Synthesis { .. })
        ));
    }
}
