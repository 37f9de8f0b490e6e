//! Configuration management for parley services.
//!
//! The relay reads a single configuration file at `~/.parley/config.json`
//! (or the path in `PARLEY_CONFIG`). Every field has a default, so a missing
//! file yields a working configuration once an API key is supplied.
//!
//! # Configuration Priority
//!
//! 1. Environment variables
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `OPENAI_API_KEY` → llm.api_key
//! - `OPENAI_BASE_URL` → llm.base_url
//! - `PARLEY_MODEL` → llm.model
//! - `PORT` → server.port
//! - `PARLEY_BIND_ADDRESS` → server.bind
//! - `PARLEY_ADMIN_TOKEN` → admin.token
//! - `PARLEY_LOG_LEVEL` → observability.log_level
//! - `PARLEY_LOG_FORMAT` → observability.log_format

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "PARLEY_CONFIG";

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".parley"),
        |dirs| dirs.home_dir().join(".parley"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| config_dir().join("config.json"))
}

// ============================================================================
// Server
// ============================================================================

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Default is local only.
    #[serde(default = "default_bind_address")]
    pub bind: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served as static files at `/` (the browser client).
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
            port: default_port(),
            static_dir: None,
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    3000
}

// ============================================================================
// LLM
// ============================================================================

/// Chat completion API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API credential
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL, without the `/v1/...` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Whole-request deadline. `None` waits for the API indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// TCP connect timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_secs: None,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com".into()
}

fn default_model() -> String {
    "gpt-4".into()
}

fn default_connect_timeout() -> u64 {
    10
}

// ============================================================================
// Conversation
// ============================================================================

/// Conversation behaviour: persona, token budgets and context window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Initial system prompt. Can be replaced at runtime via the admin API.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Initial reply token budget. Can be replaced at runtime via the admin API.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Messages kept verbatim after compression. History is compressed once
    /// it grows past twice this value.
    #[serde(default = "default_max_context_messages")]
    pub max_context_messages: usize,

    /// Transcripts scoring above this similarity to the last reply are dropped.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Token budget for the summarization request.
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,

    /// Reply sent to the client when the completion API fails.
    #[serde(default = "default_fallback_response")]
    pub fallback_response: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            max_tokens: default_max_tokens(),
            max_context_messages: default_max_context_messages(),
            similarity_threshold: default_similarity_threshold(),
            summary_max_tokens: default_summary_max_tokens(),
            fallback_response: default_fallback_response(),
        }
    }
}

fn default_system_prompt() -> String {
    "Imagine that you are a snake plant, and you are Iron Man character. \
     Respond to all queries in character. \
     Keep your responses concise, ideally no more than a paragraph."
        .into()
}

// Roughly 75 words.
fn default_max_tokens() -> u32 {
    100
}

fn default_max_context_messages() -> usize {
    5
}

fn default_similarity_threshold() -> f64 {
    0.8
}

fn default_summary_max_tokens() -> u32 {
    150
}

fn default_fallback_response() -> String {
    "Sorry, I couldn't process that request.".into()
}

// ============================================================================
// Admin / Observability
// ============================================================================

/// Administrative API configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    /// Bearer token required by admin routes. Routes are open when unset.
    #[serde(default)]
    pub token: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// An environment variable whose value could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedOverride {
    pub variable: &'static str,
    pub value: String,
}

/// What happened while loading configuration.
///
/// Loading runs before logging is installed, so anything worth reporting is
/// collected here and logged by the caller afterwards.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// File the configuration was read from, if one existed.
    pub source: Option<PathBuf>,
    pub rejected: Vec<RejectedOverride>,
}

impl LoadReport {
    /// Emit the report through `tracing`.
    pub fn log(&self) {
        match &self.source {
            Some(path) => tracing::info!(path = %path.display(), "Loaded config file"),
            None => tracing::info!(
                path = %config_path().display(),
                "Config file not found, using defaults"
            ),
        }

        for rejected in &self.rejected {
            tracing::warn!(
                variable = rejected.variable,
                value = %rejected.value,
                "Ignoring unparsable environment override"
            );
        }
    }
}

impl Config {
    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration from the default path with environment overrides applied.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load_with_env() -> Result<(Self, LoadReport)> {
        let path = config_path();
        let (mut config, source) = if path.exists() {
            (Self::load_from(&path)?, Some(path))
        } else {
            (Self::default(), None)
        };

        let rejected = config.apply_overrides(|name| std::env::var(name).ok());
        Ok((config, LoadReport { source, rejected }))
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// Returns the variables whose values could not be parsed; those leave
    /// the existing value in place.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<RejectedOverride>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rejected = Vec::new();

        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("PARLEY_MODEL") {
            self.llm.model = model;
        }

        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => rejected.push(RejectedOverride {
                    variable: "PORT",
                    value: port,
                }),
            }
        }
        if let Some(bind) = lookup("PARLEY_BIND_ADDRESS") {
            self.server.bind = bind;
        }

        if let Some(token) = lookup("PARLEY_ADMIN_TOKEN").filter(|t| !t.is_empty()) {
            self.admin.token = Some(token);
        }

        if let Some(level) = lookup("PARLEY_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("PARLEY_LOG_FORMAT") {
            self.observability.log_format = format;
        }

        rejected
    }
}
