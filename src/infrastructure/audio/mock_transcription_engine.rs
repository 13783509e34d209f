use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::domain::Transcript;

/// Records every path it is handed and fails if the staged file is not on
/// disk at call time, so tests can assert the staging contract.
pub struct MockTranscriptionEngine {
    transcript: Transcript,
    seen_paths: Mutex<Vec<PathBuf>>,
}

impl MockTranscriptionEngine {
    pub fn new(text: &str, language: &str) -> Self {
        Self {
            transcript: Transcript::new(text, language),
            seen_paths: Mutex::new(Vec::new()),
        }
    }

    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen_paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptionEngine for MockTranscriptionEngine {
    async fn transcribe(&self, path: &Path) -> Result<Transcript, TranscriptionError> {
        self.seen_paths.lock().unwrap().push(path.to_path_buf());
        if !path.exists() {
            return Err(TranscriptionError::TranscriptionFailed(format!(
                "staged audio missing: {}",
                path.display()
            )));
        }
        Ok(self.transcript.clone())
    }
}

pub struct MockFailingTranscriptionEngine {
    seen_paths: Mutex<Vec<PathBuf>>,
}

impl MockFailingTranscriptionEngine {
    pub fn new() -> Self {
        Self {
            seen_paths: Mutex::new(Vec::new()),
        }
    }

    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen_paths.lock().unwrap().clone()
    }
}

impl Default for MockFailingTranscriptionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptionEngine for MockFailingTranscriptionEngine {
    async fn transcribe(&self, path: &Path) -> Result<Transcript, TranscriptionError> {
        self.seen_paths.lock().unwrap().push(path.to_path_buf());
        Err(TranscriptionError::TranscriptionFailed(
            "mock engine failure".to_string(),
        ))
    }
}
