//! Stub collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use nltask::adapters::{
    Completion, CollaboratorError, CollaboratorErrorKind, LanguageModel, SpeechToText,
    UsageTracker,
};
use nltask::core::{FixedClock, RetryPolicy, StructuredExtractor, TranscriptionPipeline};

/// Monday 2024-03-18 09:00 UTC
pub fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 18, 9, 0, 0).unwrap()
}

/// Three attempts with no backoff
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::ZERO)
}

/// Language model replaying scripted replies; the last reply repeats
pub struct StubModel {
    replies: Mutex<VecDeque<Result<Completion, CollaboratorError>>>,
    pub calls: AtomicU32,
    pub last_user: Mutex<Option<String>>,
}

impl StubModel {
    pub fn sequence(replies: Vec<Result<Completion, CollaboratorError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicU32::new(0),
            last_user: Mutex::new(None),
        })
    }

    pub fn always(content: &str) -> Arc<Self> {
        Self::sequence(vec![Ok(Completion::new(content).with_tokens(150))])
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    fn name(&self) -> &str {
        "stub-model"
    }

    async fn complete(&self, _system: &str, user: &str) -> Result<Completion, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_user.lock().unwrap() = Some(user.to_string());
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap()
        }
    }
}

/// Speech-to-text stub that records the files it was handed
pub struct StubStt {
    replies: Mutex<VecDeque<Result<String, CollaboratorError>>>,
    pub calls: AtomicU32,
    /// (path, existed at call time)
    pub seen: Mutex<Vec<(PathBuf, bool)>>,
    pub languages: Mutex<Vec<String>>,
}

impl StubStt {
    pub fn sequence(replies: Vec<Result<String, CollaboratorError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
            languages: Mutex::new(Vec::new()),
        })
    }

    pub fn always(transcript: &str) -> Arc<Self> {
        Self::sequence(vec![Ok(transcript.to_string())])
    }

    pub fn failing(kind: CollaboratorErrorKind, message: &str) -> Arc<Self> {
        Self::sequence(vec![Err(CollaboratorError::new(kind, message))])
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_paths(&self) -> Vec<(PathBuf, bool)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechToText for StubStt {
    fn name(&self) -> &str {
        "stub-stt"
    }

    async fn transcribe(&self, audio_path: &Path, language: &str) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.languages.lock().unwrap().push(language.to_string());
        self.seen
            .lock()
            .unwrap()
            .push((audio_path.to_path_buf(), audio_path.exists()));
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap()
        }
    }
}

/// Usage tracker that always fails
pub struct BrokenTracker;

impl UsageTracker for BrokenTracker {
    fn record(&self, _tokens: u64) -> anyhow::Result<()> {
        anyhow::bail!("metrics backend unavailable")
    }
}

pub fn extractor(model: Arc<StubModel>, now: DateTime<Utc>) -> StructuredExtractor {
    StructuredExtractor::new(model)
        .with_clock(Arc::new(FixedClock(now)))
        .with_retry_policy(fast_policy())
}

pub fn pipeline(stt: Arc<StubStt>, temp_dir: &Path) -> TranscriptionPipeline {
    TranscriptionPipeline::new(stt, temp_dir).with_retry_policy(fast_policy())
}

/// Number of entries in `dir` (0 if it does not exist)
pub fn entries_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
