//! Text → `ParsedTask` via a language model.
//!
//! The model is asked for a JSON object with the six task fields. Its reply
//! is parsed, checked for required fields, repaired where a safe default
//! exists, and the due date is resolved against cues in the input text.
//! The request and the validation run together inside the retry scope, so a
//! malformed reply is retried like a network failure.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::adapters::LanguageModel;
use crate::domain::task::{
    normalize_assignee, normalize_tags, parse_due_date, ParsedTask, Priority, RawTaskDocument,
    MAX_DESCRIPTION_CHARS, MAX_TASK_NAME_CHARS,
};

use super::error::ExtractionError;
use super::retry::{retry, RetryPolicy};
use super::temporal::{self, Clock, SystemClock};

/// Default upper bound on input length, in characters
pub const DEFAULT_MAX_INPUT_CHARS: usize = 2000;

/// System instructions sent with every request
pub const TASK_PARSING_PROMPT: &str = r#"You convert a natural-language request into one task, returned as a JSON object with exactly these fields:
- taskName: short, clear title
- description: fuller description of the work
- priority: one of "P1", "P2", "P3", "P4" (P1 is the most urgent)
- dueDate: ISO 8601 UTC timestamp if a deadline is given (it must be in the future), otherwise null
- assignee: the person responsible, or "Unassigned"
- tags: array of short lowercase labels

Date rules:
- "tomorrow" means tomorrow at 23:59
- "next week" means 7 days from now at 23:59
- "next Friday" (or any weekday) means the next occurrence of that day at 23:59
- no date mentioned means dueDate is null

Example:
{"taskName": "Prepare quarterly report", "description": "Collect the Q3 numbers and draft the report", "priority": "P2", "dueDate": "2024-03-20T23:59:00.000Z", "assignee": "Dana", "tags": ["reporting", "finance"]}"#;

/// A validated task plus the usage the model reported for it
#[derive(Debug, Clone)]
pub struct Extraction {
    pub task: ParsedTask,
    pub tokens_used: Option<u64>,
}

/// Extracts tasks from text using a language model
pub struct StructuredExtractor {
    model: Arc<dyn LanguageModel>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    max_input_chars: usize,
}

impl StructuredExtractor {
    /// Create an extractor with the wall clock and default limits
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            clock: Arc::new(SystemClock),
            policy: RetryPolicy::default(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    /// Use a different clock (tests pin time with `FixedClock`)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Extract a task from `input`
    pub async fn extract(&self, input: &str) -> Result<ParsedTask, ExtractionError> {
        self.extract_with_usage(input).await.map(|e| e.task)
    }

    /// Extract a task from `input`, also returning reported token usage
    #[instrument(skip(self, input), fields(model = self.model.name(), chars = input.len()))]
    pub async fn extract_with_usage(&self, input: &str) -> Result<Extraction, ExtractionError> {
        self.validate_input(input)?;

        let user = format!("Parse this task into JSON: {}", input);
        let user = user.as_str();
        let this = self;

        retry(&self.policy, move || async move { this.attempt(input, user).await }).await
    }

    fn validate_input(&self, input: &str) -> Result<(), ExtractionError> {
        if input.trim().is_empty() {
            return Err(ExtractionError::EmptyInput("task text"));
        }
        let chars = input.chars().count();
        if chars > self.max_input_chars {
            return Err(ExtractionError::InputTooLong {
                actual: chars,
                limit: self.max_input_chars,
            });
        }
        Ok(())
    }

    /// One request/validate round trip
    async fn attempt(&self, input: &str, user: &str) -> Result<Extraction, ExtractionError> {
        let completion = self.model.complete(TASK_PARSING_PROMPT, user).await?;
        debug!(tokens = ?completion.tokens_used, "Language model replied");

        let task = validate_document(&completion.content, input, self.clock.now())?;
        Ok(Extraction {
            task,
            tokens_used: completion.tokens_used,
        })
    }
}

/// Validate and repair a model reply into a `ParsedTask`.
///
/// `now` is the resolution time: a due date that is not strictly after it
/// once cues in `input` have been applied is rejected.
pub fn validate_document(
    content: &str,
    input: &str,
    now: DateTime<Utc>,
) -> Result<ParsedTask, ExtractionError> {
    let doc = RawTaskDocument::from_json(content)
        .map_err(|e| ExtractionError::ParseError(format!("response is not a valid task document: {}", e)))?;

    let task_name = required_field(doc.task_name, "taskName", MAX_TASK_NAME_CHARS)?;
    let description = required_field(doc.description, "description", MAX_DESCRIPTION_CHARS)?;

    let priority = match doc.priority.as_deref().map(str::trim) {
        None | Some("") => Priority::default(),
        Some(p) => p.parse().map_err(ExtractionError::ParseError)?,
    };

    let candidate = match doc.due_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_due_date(raw).ok_or_else(|| {
            ExtractionError::ParseError(format!("unrecognized dueDate '{}'", raw))
        })?),
    };

    let due_date = temporal::resolve(candidate, input, now);
    if let Some(date) = due_date {
        if date <= now {
            return Err(ExtractionError::ParseError(format!(
                "dueDate {} is not in the future",
                date.to_rfc3339()
            )));
        }
    }

    Ok(ParsedTask {
        task_name,
        description,
        priority,
        due_date,
        assignee: normalize_assignee(doc.assignee),
        tags: normalize_tags(doc.tags.unwrap_or_default()),
    })
}

fn required_field(value: Option<String>, name: &str, max_chars: usize) -> Result<String, ExtractionError> {
    let value = value.as_deref().map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(ExtractionError::ParseError(format!(
            "missing required field '{}'",
            name
        )));
    }
    let chars = value.chars().count();
    if chars > max_chars {
        return Err(ExtractionError::ParseError(format!(
            "field '{}' is {} characters (max {})",
            name, chars, max_chars
        )));
    }
    Ok(value.to_string())
}
