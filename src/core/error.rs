//! Error taxonomy for the extraction core.

use thiserror::Error;

use crate::adapters::{CollaboratorError, CollaboratorErrorKind};

/// Why a transcription failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptionFailure {
    InvalidFormat,
    TooLarge,
    NoSpeech,
    Network,
    Unknown,
}

impl From<CollaboratorErrorKind> for TranscriptionFailure {
    fn from(kind: CollaboratorErrorKind) -> Self {
        match kind {
            CollaboratorErrorKind::InvalidFormat => Self::InvalidFormat,
            CollaboratorErrorKind::TooLarge => Self::TooLarge,
            CollaboratorErrorKind::NoSpeech => Self::NoSpeech,
            CollaboratorErrorKind::Timeout | CollaboratorErrorKind::Network => Self::Network,
            _ => Self::Unknown,
        }
    }
}

/// Errors surfaced by text and audio extraction
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported audio format: {extension}. Supported formats: {}", .supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<&'static str>,
    },

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("Input too long: {actual} characters > {limit}")]
    InputTooLong { actual: usize, limit: usize },

    #[error("Audio transcription failed ({reason:?}): {message}")]
    TranscriptionFailed {
        reason: TranscriptionFailure,
        message: String,
    },

    #[error("Audio transcription produced empty result")]
    EmptyTranscript,

    #[error("Failed to parse task: {0}")]
    ParseError(String),

    #[error("Language model request failed: {0}")]
    LanguageModel(#[from] CollaboratorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Maximum retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },
}

impl ExtractionError {
    /// Map a speech-to-text collaborator failure
    pub fn transcription(err: CollaboratorError) -> Self {
        Self::TranscriptionFailed {
            reason: err.kind.into(),
            message: err.message,
        }
    }
}
