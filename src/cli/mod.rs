//! Command-line interface for nltask.
//!
//! Provides commands for extracting a task from text or an audio file and
//! for showing the resolved configuration.

use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{usage::DEFAULT_RESET_CHECK, UsageMonitor};
use crate::config;
use crate::core::ExtractionOrchestrator;

/// nltask - turn typed or spoken requests into structured tasks
#[derive(Parser, Debug)]
#[command(name = "nltask")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract a task from text
    Text {
        /// Task text (reads from stdin if not provided)
        input: Option<String>,

        /// Read input from stdin
        #[arg(long)]
        stdin: bool,
    },

    /// Transcribe an audio file and extract a task from it
    Audio {
        /// Audio file (.mp3, .mp4, .mpeg, .mpga, .m4a, .wav, .webm)
        file: PathBuf,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Text { input, stdin } => extract_text(input, stdin).await,
            Commands::Audio { file } => extract_audio(file).await,
            Commands::Config => show_config(),
        }
    }
}

fn build_orchestrator() -> Result<(ExtractionOrchestrator, Arc<UsageMonitor>)> {
    let config = config::config()?;
    let usage = Arc::new(UsageMonitor::new());
    usage.start(DEFAULT_RESET_CHECK);
    let orchestrator = ExtractionOrchestrator::from_config(config)?.with_usage_tracker(usage.clone());
    Ok((orchestrator, usage))
}

async fn extract_text(input: Option<String>, stdin: bool) -> Result<()> {
    let text = match input {
        Some(text) if !stdin => text,
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            buffer
        }
    };

    let (orchestrator, usage) = build_orchestrator()?;
    let task = orchestrator.extract_from_text(&text).await?;
    usage.stop();

    println!("{}", serde_json::to_string_pretty(&task)?);
    Ok(())
}

async fn extract_audio(file: PathBuf) -> Result<()> {
    let audio = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read audio file: {}", file.display()))?;
    let filename = file
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let (orchestrator, usage) = build_orchestrator()?;
    let result = orchestrator.extract_from_audio(&audio, &filename).await?;
    usage.stop();

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn show_config() -> Result<()> {
    let config = config::config()?;

    println!();
    println!("nltask Configuration");
    println!("════════════════════════════════════════════════════");
    println!();
    println!(
        "Config file:     {}",
        config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!("Home:            {}", config.home.display());
    println!("Temp dir:        {}", config.temp_dir.display());
    println!();
    println!("OpenAI base URL: {}", config.openai.base_url);
    println!(
        "API key:         {}",
        if config.openai.api_key.is_some() { "present" } else { "missing" }
    );
    println!("Chat model:      {}", config.openai.chat_model);
    println!("Transcription:   {}", config.openai.transcription_model);
    println!("Language:        {}", config.openai.language);
    println!("Timeout:         {}s", config.openai.timeout_seconds);
    println!();
    println!(
        "Retry:           {} attempts, {}ms linear backoff",
        config.retry.max_attempts, config.retry.base_delay_ms
    );
    println!("Max input:       {} chars", config.limits.max_input_chars);
    println!("Max audio:       {} bytes", config.limits.max_audio_bytes);
    println!();

    Ok(())
}
