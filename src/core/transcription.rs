//! Audio → transcript via a speech-to-text collaborator.
//!
//! The audio buffer is written to a uniquely named temp file for the
//! duration of one call. The file is removed on every exit path once it
//! exists; removal failures are logged and never replace the call's result.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info, instrument, warn};

use crate::adapters::SpeechToText;

use super::error::{ExtractionError, TranscriptionFailure};
use super::retry::{retry, RetryPolicy};

/// Container formats the speech-to-text service accepts
pub const SUPPORTED_EXTENSIONS: [&str; 7] = [".mp3", ".mp4", ".mpeg", ".mpga", ".m4a", ".wav", ".webm"];

/// Default maximum audio size (25 MiB)
pub const DEFAULT_MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Lower-cased extension of `filename` with its leading dot, or empty
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Check a filename against [`SUPPORTED_EXTENSIONS`]
pub fn validate_format(filename: &str) -> Result<String, ExtractionError> {
    let extension = extension_of(filename);
    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(ExtractionError::UnsupportedFormat {
            extension,
            supported: SUPPORTED_EXTENSIONS.to_vec(),
        })
    }
}

/// Temp file holding one call's audio; removed by `cleanup` or on drop
struct TempAudioFile {
    file: Option<NamedTempFile>,
}

impl TempAudioFile {
    /// Write `bytes` to a new file in `dir` named `audio-<millis>-<random><extension>`
    async fn create(dir: &Path, extension: &str, bytes: &[u8]) -> Result<Self, ExtractionError> {
        tokio::fs::create_dir_all(dir).await?;

        let prefix = format!("audio-{}-", Utc::now().timestamp_millis());
        let file = Builder::new()
            .prefix(&prefix)
            .suffix(extension)
            .rand_bytes(8)
            .tempfile_in(dir)?;

        // On error `file` drops here and removes itself
        tokio::fs::write(file.path(), bytes).await?;

        debug!(path = %file.path().display(), size = bytes.len(), "Temporary audio file created");
        Ok(Self { file: Some(file) })
    }

    fn path(&self) -> PathBuf {
        self.file
            .as_ref()
            .map(|f| f.path().to_path_buf())
            .unwrap_or_default()
    }

    /// Delete the file; runs at most once
    fn cleanup(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        let path = file.path().to_path_buf();
        match file.close() {
            Ok(()) => debug!(path = %path.display(), "Temporary audio file cleaned up"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temporary audio file"),
        }
    }
}

impl Drop for TempAudioFile {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Turns audio buffers into transcripts
pub struct TranscriptionPipeline {
    stt: Arc<dyn SpeechToText>,
    temp_dir: PathBuf,
    policy: RetryPolicy,
    language: String,
    max_audio_bytes: usize,
}

impl TranscriptionPipeline {
    /// Create a pipeline writing temp files under `temp_dir`
    pub fn new(stt: Arc<dyn SpeechToText>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            stt,
            temp_dir: temp_dir.into(),
            policy: RetryPolicy::default(),
            language: "en".to_string(),
            max_audio_bytes: DEFAULT_MAX_AUDIO_BYTES,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_max_audio_bytes(mut self, max_audio_bytes: usize) -> Self {
        self.max_audio_bytes = max_audio_bytes;
        self
    }

    /// Directory temp files are created in
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Transcribe `audio`, returning the trimmed transcript.
    ///
    /// Input checks (empty buffer, extension, size) run before any file is
    /// created or any request is sent.
    #[instrument(skip(self, audio), fields(size = audio.len()))]
    pub async fn transcribe(&self, audio: &[u8], filename: &str) -> Result<String, ExtractionError> {
        if audio.is_empty() {
            return Err(ExtractionError::EmptyInput("audio buffer"));
        }

        let extension = validate_format(filename)?;

        if audio.len() > self.max_audio_bytes {
            return Err(ExtractionError::TranscriptionFailed {
                reason: TranscriptionFailure::TooLarge,
                message: format!(
                    "audio is {} bytes (max {})",
                    audio.len(),
                    self.max_audio_bytes
                ),
            });
        }

        let mut temp = TempAudioFile::create(&self.temp_dir, &extension, audio).await?;
        let result = self.transcribe_file(&temp.path()).await;
        temp.cleanup();

        if let Ok(ref transcript) = result {
            info!(chars = transcript.len(), "Transcription complete");
        }
        result
    }

    async fn transcribe_file(&self, path: &Path) -> Result<String, ExtractionError> {
        let stt = self.stt.as_ref();
        let language = self.language.as_str();

        retry(&self.policy, move || async move {
            let transcript = stt
                .transcribe(path, language)
                .await
                .map_err(ExtractionError::transcription)?;

            let trimmed = transcript.trim();
            if trimmed.is_empty() {
                return Err(ExtractionError::EmptyTranscript);
            }
            Ok::<_, ExtractionError>(trimmed.to_string())
        })
        .await
    }
}
