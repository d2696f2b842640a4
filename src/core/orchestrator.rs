//! Entry points for text → task and audio → task.
//!
//! Each call is an independent, sequential composition: transcription (for
//! audio), then extraction, then a best-effort usage report. Nothing is
//! shared between calls except the usage tracker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{OpenAiClient, OpenAiConfig, UsageTracker};
use crate::config::ResolvedConfig;
use crate::domain::{audio_id, AudioExtraction, ParsedTask};

use super::error::ExtractionError;
use super::extractor::StructuredExtractor;
use super::transcription::TranscriptionPipeline;

/// Composes transcription and extraction
pub struct ExtractionOrchestrator {
    extractor: StructuredExtractor,
    transcription: TranscriptionPipeline,
    usage: Option<Arc<dyn UsageTracker>>,
}

impl ExtractionOrchestrator {
    /// Create an orchestrator from its parts
    pub fn new(extractor: StructuredExtractor, transcription: TranscriptionPipeline) -> Self {
        Self {
            extractor,
            transcription,
            usage: None,
        }
    }

    /// Report usage to `tracker` after each successful extraction
    pub fn with_usage_tracker(mut self, tracker: Arc<dyn UsageTracker>) -> Self {
        self.usage = Some(tracker);
        self
    }

    /// Build an orchestrator backed by the OpenAI API
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let api_key = config
            .openai
            .api_key
            .clone()
            .context("OPENAI_API_KEY environment variable is required")?;

        let client = Arc::new(OpenAiClient::new(OpenAiConfig {
            api_key,
            base_url: config.openai.base_url.clone(),
            chat_model: config.openai.chat_model.clone(),
            transcription_model: config.openai.transcription_model.clone(),
            timeout: Duration::from_secs(config.openai.timeout_seconds),
        })?);

        let extractor = StructuredExtractor::new(client.clone())
            .with_retry_policy(config.retry.clone())
            .with_max_input_chars(config.limits.max_input_chars);

        let transcription = TranscriptionPipeline::new(client, config.temp_dir.clone())
            .with_retry_policy(config.retry.clone())
            .with_language(config.openai.language.clone())
            .with_max_audio_bytes(config.limits.max_audio_bytes);

        Ok(Self::new(extractor, transcription))
    }

    /// Extract a task from typed text
    #[instrument(skip(self, text), fields(request_id = %Uuid::new_v4()))]
    pub async fn extract_from_text(&self, text: &str) -> Result<ParsedTask, ExtractionError> {
        let extraction = self.extractor.extract_with_usage(text).await?;
        self.report_usage(extraction.tokens_used);

        info!(task = %extraction.task.task_name, "Task extracted from text");
        Ok(extraction.task)
    }

    /// Transcribe an audio clip and extract a task from the transcript
    #[instrument(skip(self, audio), fields(request_id = %Uuid::new_v4(), size = audio.len()))]
    pub async fn extract_from_audio(
        &self,
        audio: &[u8],
        filename: &str,
    ) -> Result<AudioExtraction, ExtractionError> {
        let started = Instant::now();

        let transcript = self.transcription.transcribe(audio, filename).await?;
        let extraction = self.extractor.extract_with_usage(&transcript).await?;
        self.report_usage(extraction.tokens_used);

        let result = AudioExtraction {
            parsed_task: extraction.task,
            transcript,
            original_filename: filename.to_string(),
            file_size: audio.len() as u64,
            audio_id: audio_id(audio),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            task = %result.parsed_task.task_name,
            audio_id = %result.audio_id,
            processing_time_ms = result.processing_time_ms,
            "Task extracted from audio"
        );
        Ok(result)
    }

    /// Best effort: failures are logged, never returned
    fn report_usage(&self, tokens: Option<u64>) {
        if let Some(ref tracker) = self.usage {
            if let Err(e) = tracker.record(tokens.unwrap_or(0)) {
                warn!(error = %e, "Failed to record usage");
            }
        }
    }
}
