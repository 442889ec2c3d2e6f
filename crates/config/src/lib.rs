//! Configuration loading, validation, and management for Sitewright.
//!
//! Loads configuration from `~/.sitewright/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use sitewright_core::ModelId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Names of the two upstream providers as they appear under `[providers.*]`.
pub const OPENAI: &str = "openai";
pub const ANTHROPIC: &str = "anthropic";

/// The root configuration structure.
///
/// Maps directly to `~/.sitewright/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model selected when a chat session starts
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Upper bound on a single generation round trip, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Provider-specific configurations, keyed by `openai` / `anthropic`
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Generation proxy configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Terminal chat client configuration
    #[serde(default)]
    pub chat: ChatConfig,

    /// Rate table overrides
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Codebase packer configuration
    #[serde(default)]
    pub packer: PackerConfig,
}

fn default_model() -> String {
    ModelId::default().as_str().into()
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("default_model", &self.default_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("providers", &self.providers)
            .field("gateway", &self.gateway)
            .field("chat", &self.chat)
            .field("pricing", &self.pricing)
            .field("packer", &self.packer)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Operator key, used when a request carries no key of its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Largest accepted request body, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Directory served for every path that is not an API route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<String>,
}

fn default_port() -> u16 {
    3003
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_body_bytes: default_max_body_bytes(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Gateway to call instead of the providers directly
    /// (e.g. `http://127.0.0.1:3003`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_url: Option<String>,

    /// Limit prompts to the most recent turn pairs
    #[serde(default)]
    pub limit_context: bool,

    /// Turn pairs kept when `limit_context` is on
    #[serde(default = "default_context_depth")]
    pub context_depth: i64,

    /// Send selected attachments along with chat messages
    #[serde(default = "default_true")]
    pub include_attachments: bool,

    /// Directory that `/export` writes generated files into
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

fn default_context_depth() -> i64 {
    5
}
fn default_export_dir() -> String {
    "site".into()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            gateway_url: None,
            limit_context: false,
            context_depth: default_context_depth(),
            include_attachments: true,
            export_dir: default_export_dir(),
        }
    }
}

/// Rate table overrides, keyed by model id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub overrides: HashMap<String, PricingOverrideConfig>,
}

/// Custom per-million-token pricing for a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingOverrideConfig {
    /// Price per 1M input tokens in USD
    pub input_per_m: f64,
    /// Price per 1M output tokens in USD
    pub output_per_m: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackerConfig {
    /// Output file name, relative to the packed root
    #[serde(default = "default_pack_output")]
    pub output: String,

    /// Patterns excluded in addition to the built-in list
    #[serde(default)]
    pub extra_excludes: Vec<String>,
}

fn default_pack_output() -> String {
    "codebase.md".into()
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            output: default_pack_output(),
            extra_excludes: vec![],
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.sitewright/config.toml).
    ///
    /// Environment variables override the file:
    /// - `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`
    /// - `SITEWRIGHT_MODEL`
    /// - `PORT` (gateway port)
    /// - `SITEWRIGHT_GATEWAY_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides. Blank values are ignored.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.providers.entry(OPENAI.into()).or_default().api_key = Some(key);
        }
        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.providers.entry(ANTHROPIC.into()).or_default().api_key = Some(key);
        }
        if let Some(model) = get("SITEWRIGHT_MODEL") {
            self.default_model = model;
        }
        if let Some(port) = get("PORT") {
            match port.trim().parse() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid PORT"),
            }
        }
        if let Some(url) = get("SITEWRIGHT_GATEWAY_URL") {
            self.chat.gateway_url = Some(url);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".sitewright")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_model.parse::<ModelId>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "default_model '{}' is not a supported model",
                self.default_model
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        if self.gateway.max_body_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.max_body_bytes must be > 0".into(),
            ));
        }

        for (model, rate) in &self.pricing.overrides {
            if model.parse::<ModelId>().is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "pricing override for unknown model '{model}'"
                )));
            }
            if rate.input_per_m < 0.0 || rate.output_per_m < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "pricing override for '{model}' must not be negative"
                )));
            }
        }

        Ok(())
    }

    /// The validated default model.
    pub fn model(&self) -> ModelId {
        self.default_model.parse().unwrap_or_default()
    }

    /// Operator key configured for a provider, if any.
    pub fn api_key(&self, provider: &str) -> Option<&str> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.as_deref())
            .filter(|k| !k.trim().is_empty())
    }

    /// Base URL override configured for a provider, if any.
    pub fn api_url(&self, provider: &str) -> Option<&str> {
        self.providers.get(provider).and_then(|p| p.api_url.as_deref())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
            providers: HashMap::new(),
            gateway: GatewayConfig::default(),
            chat: ChatConfig::default(),
            pricing: PricingConfig::default(),
            packer: PackerConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
