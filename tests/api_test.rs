use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use hark::application::ports::TranscriptionEngine;
use hark::application::services::TranscriptionService;
use hark::infrastructure::audio::{MockFailingTranscriptionEngine, MockTranscriptionEngine};
use hark::presentation::config::{
    LoggingSettings, ServerSettings, Settings, TranscriptionProviderSetting, TranscriptionSettings,
};
use hark::presentation::{AppState, Environment, create_router};

const TEST_BOUNDARY: &str = "hark-test-boundary";

fn test_settings() -> Settings {
    Settings {
        environment: Environment::Test,
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_size_mb: 100,
        },
        logging: LoggingSettings {
            level: "info".to_string(),
            enable_json: false,
        },
        transcription: TranscriptionSettings {
            provider: TranscriptionProviderSetting::Local,
            whisper_model: "openai/whisper-base".to_string(),
            api_key: None,
            base_url: None,
        },
    }
}

fn create_test_app<E>(engine: Arc<E>) -> axum::Router
where
    E: TranscriptionEngine + 'static,
{
    let state = AppState {
        transcription_service: Arc::new(TranscriptionService::new(engine)),
        settings: test_settings(),
    };
    create_router(state)
}

fn multipart_upload(field_name: &str, file_name: &str, payload: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{TEST_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field_name}\"; \
             filename=\"{file_name}\"\r\nContent-Type: audio/wav\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{TEST_BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/transcribe")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={TEST_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn given_running_server_when_health_check_then_returns_healthy() {
    let app = create_test_app(Arc::new(MockTranscriptionEngine::new("hello", "en")));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn given_valid_upload_when_transcribing_then_returns_transcript() {
    let app = create_test_app(Arc::new(MockTranscriptionEngine::new("hello world", "en")));

    let response = app
        .oneshot(multipart_upload("audio", "speech.wav", b"fake-wav-bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["text"], "hello world");
    assert_eq!(json["language"], "en");
    assert_eq!(json["status"], "success");
}

#[tokio::test]
async fn given_whitespace_only_transcript_when_transcribing_then_text_is_empty() {
    // a recording of silence decodes to an empty transcript
    let app = create_test_app(Arc::new(MockTranscriptionEngine::new("   ", "en")));

    let response = app
        .oneshot(multipart_upload("audio", "silence.wav", b"fake-wav-bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["text"], "");
    assert_eq!(json["status"], "success");
}

#[tokio::test]
async fn given_multipart_without_audio_field_when_transcribing_then_returns_exact_error() {
    let app = create_test_app(Arc::new(MockTranscriptionEngine::new("hello", "en")));

    let response = app
        .oneshot(multipart_upload("file", "speech.wav", b"fake-wav-bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error"], "No audio file provided");
}

#[tokio::test]
async fn given_non_multipart_body_when_transcribing_then_returns_bad_request() {
    let app = create_test_app(Arc::new(MockTranscriptionEngine::new("hello", "en")));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_engine_failure_when_transcribing_then_returns_500_with_message() {
    let engine = Arc::new(MockFailingTranscriptionEngine::new());
    let app = create_test_app(Arc::clone(&engine));

    let response = app
        .oneshot(multipart_upload("audio", "noise.wav", b"not-really-audio"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = response_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(!message.is_empty());
}

#[tokio::test]
async fn given_engine_failure_when_transcribing_then_staged_file_is_removed() {
    let engine = Arc::new(MockFailingTranscriptionEngine::new());
    let app = create_test_app(Arc::clone(&engine));

    let response = app
        .oneshot(multipart_upload("audio", "noise.wav", b"not-really-audio"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let seen = engine.seen_paths();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].exists(), "temp file must be gone after the response");
}

#[tokio::test]
async fn given_successful_transcription_then_staged_file_is_removed() {
    let engine = Arc::new(MockTranscriptionEngine::new("hello", "en"));
    let app = create_test_app(Arc::clone(&engine));

    let response = app
        .oneshot(multipart_upload("audio", "speech.wav", b"fake-wav-bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let seen = engine.seen_paths();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].exists(), "temp file must be gone after the response");
}

#[tokio::test]
async fn given_request_without_id_when_any_endpoint_then_response_contains_request_id() {
    let app = create_test_app(Arc::new(MockTranscriptionEngine::new("hello", "en")));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn given_request_with_id_when_any_endpoint_then_response_echoes_request_id() {
    let app = create_test_app(Arc::new(MockTranscriptionEngine::new("hello", "en")));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "test-request-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "test-request-123"
    );
}
