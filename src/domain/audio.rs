//! Results of the audio → task path.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::task::ParsedTask;

/// Outcome of extracting a task from an audio clip.
///
/// The transcript is returned alongside the task so callers can show what
/// was heard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioExtraction {
    /// The validated task
    pub parsed_task: ParsedTask,

    /// Trimmed transcript the task was extracted from
    pub transcript: String,

    /// Original filename as supplied by the caller
    pub original_filename: String,

    /// Size of the audio buffer in bytes
    pub file_size: u64,

    /// Content ID of the audio (SHA256 hash, 12 chars)
    pub audio_id: String,

    /// Wall time spent transcribing and extracting
    pub processing_time_ms: u64,
}

/// Compute a short content ID for an audio buffer
pub fn audio_id(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    hex::encode(hash)[..12].to_string()
}
