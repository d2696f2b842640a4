//! Configuration for nltask.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (NLTASK_HOME, NLTASK_TEMP_DIR, OPENAI_API_KEY, OPENAI_BASE_URL)
//! 2. Config file (.nltask/config.yaml)
//! 3. Defaults (~/.nltask)
//!
//! Config file discovery:
//! - Searches current directory and parents for .nltask/config.yaml
//! - Relative paths in the config file resolve against the .nltask/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::openai::DEFAULT_BASE_URL;
use crate::core::extractor::DEFAULT_MAX_INPUT_CHARS;
use crate::core::transcription::DEFAULT_MAX_AUDIO_BYTES;
use crate::core::RetryPolicy;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub openai: Option<OpenAiFileConfig>,
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
    #[serde(default)]
    pub limits: Option<LimitsFileConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .nltask/)
    pub home: Option<String>,
    /// Directory for transient audio files (relative to .nltask/)
    pub temp_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiFileConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub chat_model: Option<String>,
    pub transcription_model: Option<String>,
    pub language: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsFileConfig {
    pub max_input_chars: Option<usize>,
    pub max_audio_bytes: Option<usize>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to nltask home
    pub home: PathBuf,
    /// Directory temp audio files are written to
    pub temp_dir: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// OpenAI client settings
    pub openai: OpenAiSettings,
    /// Retry policy for collaborator calls
    pub retry: RetryPolicy,
    /// Input limits
    pub limits: LimitSettings,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub transcription_model: String,
    pub language: String,
    pub timeout_seconds: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: "gpt-3.5-turbo-1106".to_string(),
            transcription_model: "whisper-1".to_string(),
            language: "en".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl OpenAiSettings {
    fn merge(file: Option<OpenAiFileConfig>) -> Self {
        let defaults = Self::default();
        let file = file.unwrap_or_default();
        Self {
            api_key: file.api_key,
            base_url: file.base_url.unwrap_or(defaults.base_url),
            chat_model: file.chat_model.unwrap_or(defaults.chat_model),
            transcription_model: file
                .transcription_model
                .unwrap_or(defaults.transcription_model),
            language: file.language.unwrap_or(defaults.language),
            timeout_seconds: file.timeout_seconds.unwrap_or(defaults.timeout_seconds),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LimitSettings {
    pub max_input_chars: usize,
    pub max_audio_bytes: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            max_audio_bytes: DEFAULT_MAX_AUDIO_BYTES,
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".nltask").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge a parsed config file (if any) with the environment and defaults
fn resolve(config_file: Option<PathBuf>, file: Option<ConfigFile>) -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".nltask");

    let file_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let (paths, openai, retry, limits) = match file {
        Some(f) => (f.paths, f.openai, f.retry, f.limits),
        None => (PathsConfig::default(), None, None, None),
    };

    let home = if let Ok(env_home) = std::env::var("NLTASK_HOME") {
        PathBuf::from(env_home)
    } else if let Some(ref home_path) = paths.home {
        resolve_path(&file_dir, home_path)
    } else {
        default_home
    };

    let temp_dir = if let Ok(env_temp) = std::env::var("NLTASK_TEMP_DIR") {
        PathBuf::from(env_temp)
    } else if let Some(ref temp_path) = paths.temp_dir {
        resolve_path(&file_dir, temp_path)
    } else {
        home.join("uploads")
    };

    let mut openai = OpenAiSettings::merge(openai);
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        openai.api_key = Some(key);
    }
    if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
        openai.base_url = url;
    }

    let retry = retry.unwrap_or_default();
    if retry.max_attempts == 0 {
        anyhow::bail!("retry.max_attempts must be at least 1");
    }

    let limits = match limits {
        Some(l) => {
            let defaults = LimitSettings::default();
            LimitSettings {
                max_input_chars: l.max_input_chars.unwrap_or(defaults.max_input_chars),
                max_audio_bytes: l.max_audio_bytes.unwrap_or(defaults.max_audio_bytes),
            }
        }
        None => LimitSettings::default(),
    };

    Ok(ResolvedConfig {
        home,
        temp_dir,
        config_file,
        openai,
        retry,
        limits,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();
    let file = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };
    resolve(config_file, file)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| {
        load_config().map_err(|e| e.to_string())
    });

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
