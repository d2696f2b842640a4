//! Adapter interfaces for external collaborators.
//!
//! The extraction core depends on a language model, a speech-to-text
//! service, and a usage tracker. Each is a trait here so the core can be
//! driven by the OpenAI client in production and by stubs in tests.

pub mod openai;
pub mod usage;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

// Re-export the concrete clients
pub use openai::{OpenAiClient, OpenAiConfig};
pub use usage::{UsageMonitor, UsageSnapshot, UsageTracker};

/// Output from a language-model completion
#[derive(Debug, Clone)]
pub struct Completion {
    /// The content returned by the model
    pub content: String,

    /// Tokens used (if reported)
    pub tokens_used: Option<u64>,
}

impl Completion {
    /// Create a completion with just content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tokens_used: None,
        }
    }

    /// Attach a token count
    pub fn with_tokens(mut self, tokens: u64) -> Self {
        self.tokens_used = Some(tokens);
        self
    }
}

/// Classification of a collaborator failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorErrorKind {
    /// The service rejected the audio container/codec
    InvalidFormat,
    /// Payload exceeds the service's size limit
    TooLarge,
    /// Audio contained no recognizable speech
    NoSpeech,
    /// Request exceeded the client timeout
    Timeout,
    /// Connection or transport failure
    Network,
    /// 429 from the service
    RateLimited,
    /// 5xx from the service
    Server,
    /// Other 4xx from the service
    Client,
    /// Response arrived but could not be understood
    MalformedResponse,
}

/// A failure reported by an external collaborator
#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct CollaboratorError {
    pub kind: CollaboratorErrorKind,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(kind: CollaboratorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Language model that turns instructions plus user text into a JSON document
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Human-readable collaborator name
    fn name(&self) -> &str;

    /// Run a completion with a system prompt and a user message
    async fn complete(
        &self,
        system: &str,
        user: &str,
    ) -> Result<Completion, CollaboratorError>;
}

/// Speech-to-text service
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Human-readable collaborator name
    fn name(&self) -> &str;

    /// Transcribe the audio file at `audio_path` using a language hint
    async fn transcribe(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<String, CollaboratorError>;
}
