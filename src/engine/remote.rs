//! HTTP-backed engine implementations.
//!
//! The speech client targets a whisper-style `/audio/transcriptions`
//! endpoint with `response_format=verbose_json`; the OCR and translation
//! clients target configurable JSON endpoints.

use crate::engine::{ImageRecognizer, OcrPass, Segment, SpeechRecognizer, Translator};
use crate::error::{CaptionqError, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Map an HTTP error status to a distinguishable recognition error.
fn recognition_error(status: StatusCode, body: String) -> CaptionqError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        CaptionqError::RecognitionQuota { message: body }
    } else if status.is_client_error() {
        CaptionqError::RecognitionRejected { message: body }
    } else {
        CaptionqError::RecognitionUnavailable { message: body }
    }
}

/// Configuration for the remote speech engine.
#[derive(Debug, Clone)]
pub struct RemoteSpeechConfig {
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.groq.com/openai/v1`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

/// Speech recognizer backed by a whisper-style HTTP endpoint.
pub struct RemoteSpeechRecognizer {
    client: Client,
    config: RemoteSpeechConfig,
}

/// Subset of the verbose_json transcription response we consume.
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    segments: Vec<Segment>,
}

impl RemoteSpeechRecognizer {
    pub fn new(config: RemoteSpeechConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for RemoteSpeechRecognizer {
    async fn transcribe(&self, audio: &[u8]) -> Result<Vec<Segment>> {
        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| CaptionqError::Other(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json");

        let url = format!(
            "{}/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut request = self.client.post(&url);
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.multipart(form).send().await.map_err(|e| {
            CaptionqError::RecognitionUnavailable {
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(recognition_error(status, body));
        }

        let transcription: VerboseTranscription =
            response
                .json()
                .await
                .map_err(|e| CaptionqError::RecognitionUnavailable {
                    message: format!("malformed engine response: {e}"),
                })?;

        Ok(transcription.segments)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

/// Configuration for the remote OCR engine.
#[derive(Debug, Clone)]
pub struct RemoteOcrConfig {
    /// Full recognition endpoint URL.
    pub url: String,
    pub api_key: Option<String>,
}

/// OCR engine backed by an HTTP endpoint that accepts a page image plus
/// pass identifiers and returns `{"text": "..."}`.
pub struct RemoteImageRecognizer {
    client: Client,
    config: RemoteOcrConfig,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    text: String,
}

impl RemoteImageRecognizer {
    pub fn new(config: RemoteOcrConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait::async_trait]
impl ImageRecognizer for RemoteImageRecognizer {
    async fn recognize(&self, image: &[u8], pass: &OcrPass) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name("page.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| CaptionqError::Other(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("variant", pass.variant.label())
            .text("profile", pass.profile.clone());

        let mut request = self.client.post(&self.config.url);
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.multipart(form).send().await.map_err(|e| {
            CaptionqError::RecognitionUnavailable {
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(recognition_error(status, body));
        }

        let parsed: OcrResponse =
            response
                .json()
                .await
                .map_err(|e| CaptionqError::RecognitionUnavailable {
                    message: format!("malformed engine response: {e}"),
                })?;

        Ok(parsed.text)
    }

    fn name(&self) -> &str {
        "remote-ocr"
    }
}

/// Configuration for the remote translation engine.
#[derive(Debug, Clone)]
pub struct RemoteTranslatorConfig {
    /// Full translation endpoint URL (LibreTranslate-style `/translate`).
    pub url: String,
    pub api_key: Option<String>,
}

/// Translator backed by a LibreTranslate-style JSON endpoint.
pub struct RemoteTranslator {
    client: Client,
    config: RemoteTranslatorConfig,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl RemoteTranslator {
    pub fn new(config: RemoteTranslatorConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait::async_trait]
impl Translator for RemoteTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        let mut body = serde_json::json!({
            "q": text,
            "source": "auto",
            "target": target_lang,
        });
        if let Some(key) = &self.config.api_key {
            body["api_key"] = serde_json::Value::String(key.clone());
        }

        let response = self
            .client
            .post(&self.config.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CaptionqError::Translation {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CaptionqError::Translation {
                message: format!("{status}: {body}"),
            });
        }

        let parsed: TranslateResponse =
            response
                .json()
                .await
                .map_err(|e| CaptionqError::Translation {
                    message: format!("malformed translation response: {e}"),
                })?;

        Ok(parsed.translated_text)
    }

    fn name(&self) -> &str {
        "remote-translate"
    }
}
