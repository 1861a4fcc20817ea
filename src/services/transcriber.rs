use crate::audio::AudioTrack;
use crate::error::{DubError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for speech-to-text transcription.
///
/// This trait allows swapping implementations (remote API vs mock).
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one mono segment to text.
    ///
    /// Returns an empty string when no speech was recognized.
    async fn transcribe(&self, audio: &AudioTrack) -> Result<String>;

    /// Get the name of the model in use
    fn model_name(&self) -> &str;
}

/// Implement Transcriber for Arc<T> to allow sharing across tasks.
#[async_trait::async_trait]
impl<T: Transcriber + ?Sized> Transcriber for Arc<T> {
    async fn transcribe(&self, audio: &AudioTrack) -> Result<String> {
        (**self).transcribe(audio).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Mock transcriber for testing
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    model_name: String,
    response: String,
    by_duration: HashMap<u64, String>,
    should_fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            response: "mock transcription".to_string(),
            by_duration: HashMap::new(),
            should_fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Return `response` for segments lasting exactly `duration_ms`
    pub fn with_response_for(mut self, duration_ms: u64, response: &str) -> Self {
        self.by_duration.insert(duration_ms, response.to_string());
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Number of transcribe calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &AudioTrack) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(DubError::Transcription {
                message: "mock transcription failure".to_string(),
            });
        }
        Ok(self
            .by_duration
            .get(&audio.duration_ms())
            .unwrap_or(&self.response)
            .clone())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
