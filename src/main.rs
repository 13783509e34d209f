use std::sync::Arc;

use tokio::net::TcpListener;

use hark::application::services::TranscriptionService;
use hark::infrastructure::audio::{TranscriptionEngineFactory, TranscriptionProvider};
use hark::infrastructure::observability::{TracingConfig, init_tracing};
use hark::presentation::config::Settings;
use hark::presentation::{AppState, TranscriptionProviderSetting, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    init_tracing(
        TracingConfig {
            environment: settings.environment.to_string(),
            level: settings.logging.level.clone(),
            json_format: settings.logging.enable_json,
        },
        settings.server.port,
    );

    let provider = match settings.transcription.provider {
        TranscriptionProviderSetting::Local => TranscriptionProvider::Local,
        TranscriptionProviderSetting::OpenAi => TranscriptionProvider::OpenAi,
    };

    tracing::info!(
        provider = ?provider,
        model = %settings.transcription.whisper_model,
        "Loading transcription engine"
    );

    // The model must be fully loaded before the listener binds
    let engine = TranscriptionEngineFactory::create(
        provider,
        &settings.transcription.whisper_model,
        settings.transcription.api_key.clone(),
        settings.transcription.base_url.clone(),
    )?;

    let transcription_service = Arc::new(TranscriptionService::new(engine));

    let state = AppState {
        transcription_service,
        settings: settings.clone(),
    };

    let router = create_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;

    Ok(())
}
