//! Domain types for nltask.
//!
//! - Task: the structured record produced by extraction, plus the raw
//!   document the language model returns
//! - Audio: the audio → task result with its processing report

pub mod audio;
pub mod task;

// Re-export commonly used types
pub use audio::{audio_id, AudioExtraction};
pub use task::{ParsedTask, Priority, RawTaskDocument, UNASSIGNED};
