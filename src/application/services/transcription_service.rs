use std::sync::Arc;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::domain::Transcript;

/// Runs one upload through the engine, owning the staged file's lifecycle.
pub struct TranscriptionService<E>
where
    E: TranscriptionEngine + ?Sized,
{
    engine: Arc<E>,
}

impl<E> TranscriptionService<E>
where
    E: TranscriptionEngine + ?Sized,
{
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// Stage the uploaded bytes in a uniquely named temp file and hand its
    /// path to the engine.
    ///
    /// The staged file is unlinked when the guard drops, which happens on
    /// every exit path of this function: staging failure, engine failure,
    /// and success.
    pub async fn transcribe(&self, audio: &[u8]) -> Result<Transcript, TranscriptionServiceError> {
        let staged = tempfile::Builder::new()
            .prefix("hark-upload-")
            .suffix(".wav")
            .tempfile()
            .map_err(TranscriptionServiceError::Staging)?;

        tokio::fs::write(staged.path(), audio)
            .await
            .map_err(TranscriptionServiceError::Staging)?;

        tracing::debug!(
            path = %staged.path().display(),
            bytes = audio.len(),
            "Upload staged for transcription"
        );

        let transcript = self.engine.transcribe(staged.path()).await?;

        Ok(transcript)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionServiceError {
    #[error("failed to stage upload: {0}")]
    Staging(#[source] std::io::Error),
    #[error(transparent)]
    Engine(#[from] TranscriptionError),
}
