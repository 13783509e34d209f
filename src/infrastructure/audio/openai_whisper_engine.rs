use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::domain::{Transcript, language};

/// Remote transcription via an OpenAI-compatible `audio/transcriptions` API.
pub struct OpenAiWhisperEngine {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

/// Subset of the `verbose_json` response we care about.
#[derive(Deserialize)]
struct VerboseTranscription {
    text: String,
    language: Option<String>,
}

impl OpenAiWhisperEngine {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "whisper-1".to_string()),
        }
    }
}

#[async_trait]
impl TranscriptionEngine for OpenAiWhisperEngine {
    async fn transcribe(&self, path: &Path) -> Result<Transcript, TranscriptionError> {
        let audio = tokio::fs::read(path).await.map_err(|e| {
            TranscriptionError::ApiRequestFailed(format!("read staged audio: {}", e))
        })?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let file_part = multipart::Part::bytes(audio)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("mime: {}", e)))?;

        // verbose_json is the only response format carrying the detected language
        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .part("file", file_part);

        let url = format!("{}/audio/transcriptions", self.base_url);

        tracing::debug!(model = %self.model, "Sending audio to OpenAI Whisper API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscriptionError::ApiRequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let payload: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("body: {}", e)))?;

        // The API reports full names ("english"); normalize to the ISO code
        let detected_language = payload
            .language
            .as_deref()
            .map(language::normalize_code)
            .unwrap_or_else(|| "en".to_string());

        let transcript = Transcript::new(payload.text, detected_language);

        tracing::info!(
            chars = transcript.text.len(),
            language = %transcript.language,
            "OpenAI Whisper transcription completed"
        );

        Ok(transcript)
    }
}
