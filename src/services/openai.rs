//! OpenAI-compatible transcription over HTTP.

use super::transcriber::Transcriber;
use crate::audio::{AudioTrack, wav};
use crate::defaults;
use crate::error::{DubError, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcriber posting WAV segments to `{base_url}/audio/transcriptions`.
#[derive(Debug, Clone)]
pub struct OpenAiTranscriber {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiTranscriber {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(defaults::HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| DubError::Other(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: transcription_endpoint(base_url),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Joins the base URL and the transcription path.
pub fn transcription_endpoint(base_url: &str) -> String {
    format!("{}/audio/transcriptions", base_url.trim_end_matches('/'))
}

fn transcription_error(message: String) -> DubError {
    DubError::Transcription { message }
}

#[async_trait::async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio: &AudioTrack) -> Result<String> {
        let bytes = wav::encode_wav(audio)?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("segment.wav")
            .mime_str("audio/wav")
            .map_err(|e| transcription_error(format!("invalid upload part: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", part);

        log::debug!(
            "POST {} ({} ms, model {})",
            self.endpoint,
            audio.duration_ms(),
            self.model
        );
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transcription_error(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(transcription_error(format!("HTTP {}: {}", status, body.trim())));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| transcription_error(format!("unexpected response: {e}")))?;
        Ok(parsed.text.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
