//! Configuration management for Flux.
//!
//! Configuration can be set via environment variables:
//! - `GEMINI_API_KEY` - Optional. Gemini API key (`API_KEY` is accepted as a fallback).
//!   When missing the server still starts, and every model call reports the missing key.
//! - `DEFAULT_MODEL` - Optional. The model to use. Defaults to `gemini-2.5-flash`.
//! - `GEMINI_BASE_URL` - Optional. Defaults to `https://generativelanguage.googleapis.com`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `MAX_TOOL_ROUNDS` - Optional. Maximum tool-dispatch rounds per execution. Defaults to `5`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Per-request timeout for model calls. Defaults to `60`.
//! - `WORKING_DIR` - Optional. Directory holding `.flux/` state. Defaults to current directory.
//! - `KNOWLEDGE_BACKEND` - Optional. `file` (default) or `memory`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Where learned facts are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnowledgeBackend {
    /// `{working_dir}/.flux/knowledge.json`
    File,
    /// Process memory only; lost on restart.
    Memory,
}

impl std::str::FromStr for KnowledgeBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("expected 'file' or 'memory', got: {}", other)),
        }
    }
}

/// Agent configuration.
#[derive(Clone)]
pub struct Config {
    /// Gemini API key (None = every model call short-circuits)
    pub api_key: Option<String>,

    /// Model identifier
    pub default_model: String,

    /// Base URL of the Gemini REST API
    pub gemini_base_url: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum tool-dispatch rounds per execution
    pub max_tool_rounds: usize,

    /// Timeout applied to each model request
    pub request_timeout: Duration,

    /// Directory holding local state
    pub working_dir: PathBuf,

    /// Knowledge store backend
    pub knowledge_backend: KnowledgeBackend,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("default_model", &self.default_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .field("request_timeout", &self.request_timeout)
            .field("working_dir", &self.working_dir)
            .field("knowledge_backend", &self.knowledge_backend)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric, URL or backend value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let gemini_base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());
        validate_base_url(&gemini_base_url)?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = parse_env("PORT", 3000u16)?;
        let max_tool_rounds = parse_env("MAX_TOOL_ROUNDS", DEFAULT_MAX_TOOL_ROUNDS)?;
        let request_timeout = Duration::from_secs(parse_env("REQUEST_TIMEOUT_SECS", 60u64)?);

        let working_dir = std::env::var("WORKING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let knowledge_backend = std::env::var("KNOWLEDGE_BACKEND")
            .ok()
            .map(|v| {
                v.parse::<KnowledgeBackend>()
                    .map_err(|e| ConfigError::InvalidValue("KNOWLEDGE_BACKEND".to_string(), e))
            })
            .transpose()?
            .unwrap_or(KnowledgeBackend::File);

        Ok(Self {
            api_key,
            default_model,
            gemini_base_url,
            host,
            port,
            max_tool_rounds,
            request_timeout,
            working_dir,
            knowledge_backend,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: Option<String>, default_model: String, working_dir: PathBuf) -> Self {
        Self {
            api_key,
            default_model,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            request_timeout: Duration::from_secs(60),
            working_dir,
            knowledge_backend: KnowledgeBackend::Memory,
        }
    }

    /// Path of the JSON knowledge file under the working directory.
    pub fn knowledge_path(&self) -> PathBuf {
        self.working_dir.join(".flux").join("knowledge.json")
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))
}

fn validate_base_url(raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| ConfigError::InvalidValue("GEMINI_BASE_URL".to_string(), e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidValue(
            "GEMINI_BASE_URL".to_string(),
            format!("unsupported scheme: {}", other),
        )),
    }
}
