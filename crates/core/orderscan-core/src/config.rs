//! Configuration management and environment variable loading
//!
//! Configuration is read once at process start into an [`AppConfig`] which is
//! then handed to every component that needs it.

use crate::chunking::ChunkingConfig;
use crate::{OrderScanError, Result};
use std::env;
use std::fmt;
use std::path::Path;

/// Environment variable holding the model API credential
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Load environment variables from .env file
///
/// A missing `.env` file is not an error; a malformed one is.
///
/// # Example
///
/// ```no_run
/// use orderscan_core::load_env;
///
/// load_env().ok();
/// let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
/// ```
pub fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!("✓ Loaded environment from: {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::LineParse(line, pos)) => Err(OrderScanError::config(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => {
            tracing::warn!("No .env file found - using system environment variables only");
            Ok(())
        }
        Err(e) => Err(OrderScanError::config(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

/// Load environment variables from a specific file
pub fn load_env_from_path<P: AsRef<Path>>(path: P) -> Result<()> {
    match dotenvy::from_path(path.as_ref()) {
        Ok(_) => {
            tracing::info!("✓ Loaded environment from: {}", path.as_ref().display());
            Ok(())
        }
        Err(e) => Err(OrderScanError::config(format!(
            "Failed to load {} environment file: {}",
            path.as_ref().display(),
            e
        ))),
    }
}

/// Get required environment variable
///
/// Returns an error if the variable is not set or blank
pub fn get_required_env(key: &str) -> Result<String> {
    required(&|k: &str| env::var(k).ok(), key)
}

/// Get optional environment variable with default
pub fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get environment variable as boolean
pub fn get_env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

/// Get environment variable as integer
pub fn get_env_int<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Get environment variable as float
pub fn get_env_float(key: &str, default: f32) -> f32 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f32>().ok())
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn required(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(OrderScanError::config(format!(
            "Required environment variable '{}' is not set. \
             Check your .env file or system environment.",
            key
        ))),
    }
}

fn parsed<T: std::str::FromStr>(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            OrderScanError::config(format!("Environment variable '{}' has invalid value '{}'", key, raw))
        }),
    }
}

/// Hosted language model settings
#[derive(Clone)]
pub struct ModelConfig {
    /// API credential
    pub api_key: String,

    /// Chat model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token cap
    pub max_tokens: Option<u32>,

    /// Alternative API base URL (proxies, test servers)
    pub api_base: Option<String>,

    /// Per-request HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl ModelConfig {
    /// Create a model config with defaults for everything but the key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: None,
            api_base: None,
            timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Process-wide configuration, built once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Model settings
    pub model: ModelConfig,

    /// Chunking settings for the summarizer
    pub chunking: ChunkingConfig,
}

impl AppConfig {
    /// Build configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = required(&lookup, API_KEY_VAR)?;

        let mut model = ModelConfig::new(api_key);
        if let Some(name) = lookup("OPENAI_MODEL").filter(|v| !v.trim().is_empty()) {
            model.model = name.trim().to_string();
        }
        if let Some(temperature) = parsed::<f32>(&lookup, "OPENAI_TEMPERATURE")? {
            model.temperature = temperature;
        }
        model.max_tokens = parsed::<u32>(&lookup, "OPENAI_MAX_TOKENS")?;
        model.api_base = lookup("OPENAI_BASE_URL").filter(|v| !v.trim().is_empty());
        if let Some(timeout) = parsed::<u64>(&lookup, "OPENAI_TIMEOUT_SECS")? {
            model.timeout_secs = timeout;
        }

        let defaults = ChunkingConfig::default();
        let chunking = ChunkingConfig::new(
            parsed::<usize>(&lookup, "ORDERSCAN_CHUNK_SIZE")?.unwrap_or(defaults.chunk_size()),
            parsed::<usize>(&lookup, "ORDERSCAN_CHUNK_OVERLAP")?.unwrap_or(defaults.chunk_overlap()),
        )?;

        Ok(Self { model, chunking })
    }

    /// Config for tests and embedding: given key, defaults elsewhere
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            model: ModelConfig::new(api_key),
            chunking: ChunkingConfig::default(),
        }
    }
}
