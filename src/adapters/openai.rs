//! OpenAI HTTP client for chat completions and audio transcription.
//!
//! Endpoints:
//! - POST {base_url}/chat/completions (JSON object response format)
//! - POST {base_url}/audio/transcriptions (multipart, text response)
//!
//! Failures are classified into [`CollaboratorErrorKind`] here so callers
//! never inspect error strings.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Completion, CollaboratorError, CollaboratorErrorKind, LanguageModel, SpeechToText};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Prompt that biases transcription toward task dictation
const TRANSCRIPTION_PROMPT: &str =
    "This is a task description. The speaker is describing a task to be done.";

/// Configuration for the OpenAI client
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub transcription_model: String,
    /// Per-request timeout enforced by the HTTP client
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Config with defaults for everything except the key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: "gpt-3.5-turbo-1106".to_string(),
            transcription_model: "whisper-1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// OpenAI API client
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

/// Error envelope returned by the API
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { config, client })
    }

    /// Build API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Turn a non-success response into a classified error
    async fn error_from_response(response: reqwest::Response) -> CollaboratorError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        CollaboratorError::new(classify_status(status, &message), message)
    }
}

/// Classify a transport-level failure
fn classify_transport(err: &reqwest::Error) -> CollaboratorError {
    let kind = if err.is_timeout() {
        CollaboratorErrorKind::Timeout
    } else {
        CollaboratorErrorKind::Network
    };
    CollaboratorError::new(kind, err.to_string())
}

/// Classify an HTTP error status and provider message.
///
/// Provider messages are only consulted for the audio-specific kinds the API
/// does not expose as distinct status codes.
pub fn classify_status(status: u16, message: &str) -> CollaboratorErrorKind {
    let lower = message.to_lowercase();
    if lower.contains("invalid file format") {
        return CollaboratorErrorKind::InvalidFormat;
    }
    if status == 413 || lower.contains("file is too large") || lower.contains("maximum content size") {
        return CollaboratorErrorKind::TooLarge;
    }
    if lower.contains("no speech found") {
        return CollaboratorErrorKind::NoSpeech;
    }
    match status {
        408 => CollaboratorErrorKind::Timeout,
        429 => CollaboratorErrorKind::RateLimited,
        500..=599 => CollaboratorErrorKind::Server,
        _ => CollaboratorErrorKind::Client,
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    fn name(&self) -> &str {
        "openai-chat"
    }

    async fn complete(&self, system: &str, user: &str) -> Result<Completion, CollaboratorError> {
        let request = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.1,
            max_tokens: 1000,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            CollaboratorError::new(
                CollaboratorErrorKind::MalformedResponse,
                format!("Failed to parse chat response: {}", e),
            )
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                CollaboratorError::new(
                    CollaboratorErrorKind::MalformedResponse,
                    "Language model returned empty response",
                )
            })?;

        debug!(chars = content.len(), "Received chat completion");

        let completion = Completion::new(content);
        Ok(match parsed.usage {
            Some(usage) => completion.with_tokens(usage.total_tokens),
            None => completion,
        })
    }
}

#[async_trait]
impl SpeechToText for OpenAiClient {
    fn name(&self) -> &str {
        "openai-transcription"
    }

    async fn transcribe(&self, audio_path: &Path, language: &str) -> Result<String, CollaboratorError> {
        let file_name = audio_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let read_error = |e: std::io::Error| {
            CollaboratorError::new(
                CollaboratorErrorKind::Client,
                format!("Failed to read audio file: {}", e),
            )
        };
        let file = tokio::fs::File::open(audio_path).await.map_err(read_error)?;
        let length = file.metadata().await.map_err(read_error)?.len();

        // Streamed from disk; the length keeps the upload non-chunked
        let file_part = Part::stream_with_length(Body::from(file), length).file_name(file_name);

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.config.transcription_model.clone())
            .text("response_format", "text")
            .text("language", language.to_string())
            .text("temperature", "0.2")
            .text("prompt", TRANSCRIPTION_PROMPT);

        let response = self
            .client
            .post(self.api_url("audio/transcriptions"))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response.text().await.map_err(|e| classify_transport(&e))
    }
}
