//! nltask - natural-language and voice task extraction
//!
//! Converts free-form input, typed or spoken, into a validated
//! [`ParsedTask`]. Language understanding and speech recognition are
//! delegated to external collaborators; this crate validates and repairs
//! their output, resolves relative due dates, retries failed calls, and
//! manages the temporary audio file a transcription needs.
//!
//! # Modules
//!
//! - `adapters`: Collaborator traits and the OpenAI client, usage tracking
//! - `core`: Retry, temporal resolution, extraction, transcription, orchestration
//! - `domain`: Data structures (ParsedTask, AudioExtraction)
//! - `config`: Layered configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Extract a task from text
//! nltask text "Review docs by next Wednesday, assign to Mike"
//!
//! # Extract a task from a voice note
//! nltask audio memo.m4a
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::core::{ExtractionError, ExtractionOrchestrator, RetryPolicy, TranscriptionFailure};
pub use domain::{AudioExtraction, ParsedTask, Priority};
