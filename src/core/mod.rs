//! Extraction core.
//!
//! This module contains:
//! - Retry: bounded retry with linear backoff
//! - Temporal: due-date resolution from natural-language cues
//! - Extractor: text → task via a language model
//! - Transcription: audio → transcript with scoped temp files
//! - Orchestrator: the two public entry points

pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod retry;
pub mod temporal;
pub mod transcription;

// Re-export commonly used types
pub use error::{ExtractionError, TranscriptionFailure};
pub use extractor::{Extraction, StructuredExtractor};
pub use orchestrator::ExtractionOrchestrator;
pub use retry::{retry, RetriesExhausted, RetryPolicy};
pub use temporal::{resolve, Clock, FixedClock, SystemClock};
pub use transcription::{TranscriptionPipeline, SUPPORTED_EXTENSIONS};
