//! Google web translation and text-to-speech endpoints.

use super::synthesizer::{Synthesizer, split_text};
use super::translator::Translator;
use crate::audio::AudioTrack;
use crate::defaults;
use crate::error::{DubError, Result};
use crate::language::Language;
use crate::media::MediaBackend;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(defaults::HTTP_TIMEOUT_SECS))
        .build()
        .map_err(|e| DubError::Other(format!("Failed to build HTTP client: {e}")))
}

/// Translator backed by the `translate_a/single` endpoint (`client=gtx`).
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    url: String,
}

impl GoogleTranslator {
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            url: url.to_string(),
        })
    }
}

/// Request URL for translating `text` into `target` with source auto-detection.
pub fn translate_request_url(base: &str, text: &str, target: Language) -> Result<Url> {
    Url::parse_with_params(
        base,
        &[
            ("client", "gtx"),
            ("sl", "auto"),
            ("tl", target.code()),
            ("dt", "t"),
            ("q", text),
        ],
    )
    .map_err(|e| DubError::Translation {
        message: format!("invalid translate URL '{}': {}", base, e),
    })
}

/// Concatenates the translated sentences of a `translate_a/single` response.
///
/// The response is a nested array whose first element lists
/// `[translated, original, ...]` per sentence.
pub fn parse_translate_response(body: &serde_json::Value) -> Result<String> {
    let sentences = body
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| DubError::Translation {
            message: "unexpected translate response shape".to_string(),
        })?;

    Ok(sentences
        .iter()
        .filter_map(|sentence| sentence.get(0).and_then(|t| t.as_str()))
        .collect::<String>())
}

#[async_trait::async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target: Language) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let url = translate_request_url(&self.url, text, target)?;
        log::debug!("Translating {} chars to {}", text.chars().count(), target);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DubError::Translation {
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DubError::Translation {
                message: format!("HTTP {}", status),
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| DubError::Translation {
            message: format!("unexpected response: {e}"),
        })?;
        parse_translate_response(&body)
    }

    fn name(&self) -> &str {
        "google"
    }
}

/// Synthesizer backed by the `translate_tts` endpoint.
///
/// Text is sent in chunks of at most 100 characters; the MP3 parts are
/// concatenated and decoded through the media backend.
#[derive(Clone)]
pub struct GoogleTts {
    client: reqwest::Client,
    url: String,
    media: Arc<dyn MediaBackend>,
    sample_rate: u32,
}

impl GoogleTts {
    pub fn new(url: &str, media: Arc<dyn MediaBackend>, sample_rate: u32) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            url: url.to_string(),
            media,
            sample_rate,
        })
    }
}

/// Request URL for chunk `idx` of `total`.
pub fn tts_request_url(base: &str, chunk: &str, language: Language, idx: usize, total: usize) -> Result<Url> {
    let idx = idx.to_string();
    let total = total.to_string();
    let textlen = chunk.chars().count().to_string();
    Url::parse_with_params(
        base,
        &[
            ("ie", "UTF-8"),
            ("q", chunk),
            ("tl", language.code()),
            ("client", "tw-ob"),
            ("total", total.as_str()),
            ("idx", idx.as_str()),
            ("textlen", textlen.as_str()),
        ],
    )
    .map_err(|e| DubError::Synthesis {
        message: format!("invalid TTS URL '{}': {}", base, e),
    })
}

#[async_trait::async_trait]
impl Synthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, language: Language) -> Result<AudioTrack> {
        let chunks = split_text(text, defaults::TTS_MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(DubError::Synthesis {
                message: "nothing to synthesize".to_string(),
            });
        }

        let mut mp3 = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let url = tts_request_url(&self.url, chunk, language, idx, chunks.len())?;
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| DubError::Synthesis {
                    message: format!("request failed: {e}"),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(DubError::Synthesis {
                    message: format!("HTTP {} for chunk {}/{}", status, idx + 1, chunks.len()),
                });
            }
            let bytes = response.bytes().await.map_err(|e| DubError::Synthesis {
                message: format!("failed to read audio: {e}"),
            })?;
            mp3.extend_from_slice(&bytes);
        }

        log::debug!(
            "Synthesized {} chunk(s), {} bytes of {} speech",
            chunks.len(),
            mp3.len(),
            language
        );
        self.media
            .transcode_to_wav(&mp3, self.sample_rate)
            .await
            .map_err(|e| DubError::Synthesis {
                message: format!("failed to decode speech: {}", e),
            })
    }

    fn name(&self) -> &str {
        "google-tts"
    }
}
