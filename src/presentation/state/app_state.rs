use std::sync::Arc;

use crate::application::ports::TranscriptionEngine;
use crate::application::services::TranscriptionService;
use crate::presentation::config::Settings;

pub struct AppState<E>
where
    E: TranscriptionEngine + ?Sized,
{
    pub transcription_service: Arc<TranscriptionService<E>>,
    pub settings: Settings,
}

impl<E> Clone for AppState<E>
where
    E: TranscriptionEngine + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            transcription_service: Arc::clone(&self.transcription_service),
            settings: self.settings.clone(),
        }
    }
}
