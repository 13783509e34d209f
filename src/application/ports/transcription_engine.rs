use std::path::Path;

use async_trait::async_trait;

use crate::domain::Transcript;

/// A speech-to-text engine fed with a path to a decodable audio file.
///
/// Implementations are loaded once at startup and shared across all
/// request workers for the lifetime of the process.
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    async fn transcribe(&self, path: &Path) -> Result<Transcript, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
}
