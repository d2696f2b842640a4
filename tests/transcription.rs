//! Transcription Pipeline Integration Tests
//!
//! Format validation, error mapping, and temp-file cleanup on every path.

mod common;

use common::{entries_in, pipeline, StubStt};
use nltask::adapters::{CollaboratorError, CollaboratorErrorKind};
use nltask::core::{ExtractionError, TranscriptionFailure};
use tempfile::TempDir;

const AUDIO: &[u8] = b"ID3\x04\x00fake-mp3-frames";

#[tokio::test]
async fn test_successful_transcription_is_trimmed_and_cleaned_up() {
    let temp = TempDir::new().unwrap();
    let stt = StubStt::always("  Review docs by next Wednesday.\n");
    let pipeline = pipeline(stt.clone(), temp.path());

    let transcript = pipeline.transcribe(AUDIO, "memo.mp3").await.unwrap();

    assert_eq!(transcript, "Review docs by next Wednesday.");
    let seen = stt.seen_paths();
    assert_eq!(seen.len(), 1);
    let (path, existed) = &seen[0];
    assert!(*existed, "temp file must exist while the collaborator reads it");
    assert_eq!(path.extension().unwrap(), "mp3");
    assert!(!path.exists());
    assert_eq!(entries_in(temp.path()), 0);
}

#[tokio::test]
async fn test_collaborator_failure_retried_and_cleaned_up() {
    let temp = TempDir::new().unwrap();
    let stt = StubStt::failing(CollaboratorErrorKind::Network, "connection reset");
    let pipeline = pipeline(stt.clone(), temp.path());

    let err = pipeline.transcribe(AUDIO, "memo.wav").await.unwrap_err();

    assert!(matches!(
        err,
        ExtractionError::TranscriptionFailed { reason: TranscriptionFailure::Network, .. }
    ));
    assert_eq!(stt.calls(), 3);
    // All attempts reuse the single temp file
    let seen = stt.seen_paths();
    assert!(seen.iter().all(|(p, existed)| *existed && p == &seen[0].0));
    assert_eq!(entries_in(temp.path()), 0);
}

#[tokio::test]
async fn test_empty_transcript_fails_and_cleans_up() {
    let temp = TempDir::new().unwrap();
    let stt = StubStt::always("   \n\t ");
    let pipeline = pipeline(stt.clone(), temp.path());

    let err = pipeline.transcribe(AUDIO, "memo.m4a").await.unwrap_err();

    assert!(matches!(err, ExtractionError::EmptyTranscript));
    assert_eq!(entries_in(temp.path()), 0);
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let temp = TempDir::new().unwrap();
    let stt = StubStt::sequence(vec![
        Err(CollaboratorError::new(CollaboratorErrorKind::Timeout, "30s")),
        Ok("Buy milk".to_string()),
    ]);
    let pipeline = pipeline(stt.clone(), temp.path());

    assert_eq!(pipeline.transcribe(AUDIO, "memo.webm").await.unwrap(), "Buy milk");
    assert_eq!(stt.calls(), 2);
    assert_eq!(entries_in(temp.path()), 0);
}

#[tokio::test]
async fn test_collaborator_kinds_map_to_reasons() {
    let cases = [
        (CollaboratorErrorKind::InvalidFormat, TranscriptionFailure::InvalidFormat),
        (CollaboratorErrorKind::TooLarge, TranscriptionFailure::TooLarge),
        (CollaboratorErrorKind::NoSpeech, TranscriptionFailure::NoSpeech),
        (CollaboratorErrorKind::Server, TranscriptionFailure::Unknown),
    ];

    for (kind, expected) in cases {
        let temp = TempDir::new().unwrap();
        let pipeline = pipeline(StubStt::failing(kind, "rejected"), temp.path());
        match pipeline.transcribe(AUDIO, "memo.mp3").await {
            Err(ExtractionError::TranscriptionFailed { reason, .. }) => assert_eq!(reason, expected),
            other => panic!("expected TranscriptionFailed, got {:?}", other),
        }
        assert_eq!(entries_in(temp.path()), 0);
    }
}

#[tokio::test]
async fn test_unsupported_format_never_calls_collaborator() {
    let temp = TempDir::new().unwrap();
    let uploads = temp.path().join("uploads");
    let stt = StubStt::always("unused");
    let pipeline = pipeline(stt.clone(), &uploads);

    let err = pipeline.transcribe(AUDIO, "clip.ogg").await.unwrap_err();

    assert!(matches!(err, ExtractionError::UnsupportedFormat { ref extension, .. } if extension == ".ogg"));
    assert_eq!(stt.calls(), 0);
    assert!(!uploads.exists(), "no resource may be created for a rejected format");
}

#[tokio::test]
async fn test_empty_buffer_creates_nothing() {
    let temp = TempDir::new().unwrap();
    let uploads = temp.path().join("uploads");
    let stt = StubStt::always("unused");
    let pipeline = pipeline(stt.clone(), &uploads);

    let err = pipeline.transcribe(&[], "memo.mp3").await.unwrap_err();

    assert!(matches!(err, ExtractionError::EmptyInput(_)));
    assert_eq!(stt.calls(), 0);
    assert!(!uploads.exists());
}

#[tokio::test]
async fn test_oversized_audio_rejected_before_upload() {
    let temp = TempDir::new().unwrap();
    let stt = StubStt::always("unused");
    let pipeline = pipeline(stt.clone(), temp.path()).with_max_audio_bytes(8);

    let err = pipeline.transcribe(AUDIO, "memo.mp3").await.unwrap_err();

    assert!(matches!(
        err,
        ExtractionError::TranscriptionFailed { reason: TranscriptionFailure::TooLarge, .. }
    ));
    assert_eq!(stt.calls(), 0);
    assert_eq!(entries_in(temp.path()), 0);
}

#[tokio::test]
async fn test_concurrent_calls_use_distinct_files() {
    let temp = TempDir::new().unwrap();
    let stt = StubStt::always("Task");
    let pipeline = pipeline(stt.clone(), temp.path());

    let (a, b, c) = tokio::join!(
        pipeline.transcribe(AUDIO, "a.mp3"),
        pipeline.transcribe(AUDIO, "b.mp3"),
        pipeline.transcribe(AUDIO, "c.mp3"),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());

    let mut paths: Vec<_> = stt.seen_paths().into_iter().map(|(p, _)| p).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 3);
    assert_eq!(entries_in(temp.path()), 0);
}

#[tokio::test]
async fn test_language_hint_passed_to_collaborator() {
    let temp = TempDir::new().unwrap();
    let stt = StubStt::always("Kaffee kaufen");

    pipeline(stt.clone(), temp.path())
        .transcribe(AUDIO, "memo.mp3")
        .await
        .unwrap();
    pipeline(stt.clone(), temp.path())
        .with_language("de")
        .transcribe(AUDIO, "memo.mp3")
        .await
        .unwrap();

    assert_eq!(stt.languages(), vec!["en".to_string(), "de".to_string()]);
}
