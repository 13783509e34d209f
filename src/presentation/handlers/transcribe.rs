use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::ports::TranscriptionEngine;
use crate::presentation::handlers::ApiError;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct TranscribeResponse {
    pub text: String,
    pub language: String,
    pub status: &'static str,
}

/// `POST /transcribe`: multipart body with a binary field named `audio`.
///
/// The upload lives on disk only for the duration of this request; the
/// service stages it into a scoped temp file that is gone by the time the
/// response is written, error paths included.
#[tracing::instrument(skip(state, multipart))]
pub async fn transcribe_handler<E>(
    State(state): State<AppState<E>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
    E: TranscriptionEngine + 'static + ?Sized,
{
    let mut audio = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("audio") {
            continue;
        }

        let filename = field.file_name().unwrap_or("unknown").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("Failed to read file: {}", e)))?;

        tracing::debug!(filename = %filename, bytes = data.len(), "Audio upload received");

        audio = Some(data);
        break;
    }

    let Some(data) = audio else {
        tracing::warn!("Transcription request without an audio field");
        return Err(ApiError::Validation("No audio file provided".to_string()));
    };

    let transcript = state.transcription_service.transcribe(&data).await?;

    tracing::info!(
        chars = transcript.text.len(),
        language = %transcript.language,
        "Transcription completed"
    );

    Ok((
        StatusCode::OK,
        Json(TranscribeResponse {
            text: transcript.text,
            language: transcript.language,
            status: "success",
        }),
    ))
}
