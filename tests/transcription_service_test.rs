use std::sync::Arc;

use futures::future::join_all;

use hark::application::services::{TranscriptionService, TranscriptionServiceError};
use hark::infrastructure::audio::{MockFailingTranscriptionEngine, MockTranscriptionEngine};

#[tokio::test]
async fn given_upload_when_transcribing_then_engine_receives_wav_path() {
    let engine = Arc::new(MockTranscriptionEngine::new("hello", "en"));
    let service = TranscriptionService::new(Arc::clone(&engine));

    let transcript = service.transcribe(b"fake-wav-bytes").await.unwrap();

    assert_eq!(transcript.text, "hello");
    let seen = engine.seen_paths();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].extension().and_then(|e| e.to_str()), Some("wav"));
}

#[tokio::test]
async fn given_upload_when_transcription_succeeds_then_staged_file_is_removed() {
    let engine = Arc::new(MockTranscriptionEngine::new("hello", "en"));
    let service = TranscriptionService::new(Arc::clone(&engine));

    service.transcribe(b"fake-wav-bytes").await.unwrap();

    let seen = engine.seen_paths();
    assert!(!seen[0].exists());
}

#[tokio::test]
async fn given_engine_failure_when_transcribing_then_staged_file_is_removed() {
    let engine = Arc::new(MockFailingTranscriptionEngine::new());
    let service = TranscriptionService::new(Arc::clone(&engine));

    let result = service.transcribe(b"not-really-audio").await;

    assert!(matches!(
        result,
        Err(TranscriptionServiceError::Engine(_))
    ));
    let seen = engine.seen_paths();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].exists());
}

#[tokio::test]
async fn given_concurrent_uploads_when_transcribing_then_temp_paths_are_distinct() {
    let engine = Arc::new(MockTranscriptionEngine::new("hello", "en"));
    let service = Arc::new(TranscriptionService::new(Arc::clone(&engine)));

    let uploads = (0..8).map(|i| {
        let service = Arc::clone(&service);
        async move {
            let payload = format!("upload-{}", i);
            service.transcribe(payload.as_bytes()).await
        }
    });

    let results = join_all(uploads).await;
    assert!(results.iter().all(|r| r.is_ok()));

    let seen = engine.seen_paths();
    assert_eq!(seen.len(), 8);

    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 8, "temp paths must not collide");

    assert!(seen.iter().all(|p| !p.exists()));
}
