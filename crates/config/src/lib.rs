//! Configuration loading, validation, and management for Aula.
//!
//! Loads configuration from `~/.aula/config.toml` with environment variable
//! overrides. Validates all settings at startup. Provider settings are
//! resolved once into [`ProviderSettings`]; a missing endpoint or credential
//! becomes a [`ConfigError`], which converts into
//! [`GatewayError::Configuration`] in exactly one place.

use aula_core::{AgentType, GatewayError, PromptRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.aula/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion provider the gateway talks to
    #[serde(default)]
    pub provider: ProviderConfig,

    /// HTTP server settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// How chat clients reach the gateway
    #[serde(default)]
    pub client: ClientConfig,

    /// Orchestrator behaviour
    #[serde(default)]
    pub session: SessionConfig,

    /// Per-agent system prompt overrides, keyed by agent type
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prompts: BTreeMap<String, String>,

    /// Learner profile storage
    #[serde(default)]
    pub profiles: ProfilesConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider label used in logs
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Full chat-completions URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Bearer credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Unset means the HTTP client's default (no timeout)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_provider_name() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4.1-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            endpoint: None,
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            request_timeout_secs: None,
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Provider settings that passed validation: endpoint and credential present.
#[derive(Clone)]
pub struct ProviderSettings {
    pub name: String,
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub request_timeout: Option<Duration>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ProviderConfig {
    /// Check that the provider can be called at all.
    pub fn resolve(&self) -> Result<ProviderSettings, ConfigError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(ConfigError::MissingEndpoint)?;

        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "provider.endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }

        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingCredential)?;

        Ok(ProviderSettings {
            name: self.name.clone(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Browser origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of a running `aula serve`
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Attempts per call; 1 means no retry
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:8787".into()
}
fn default_max_attempts() -> u32 {
    1
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            timeout_secs: None,
            max_attempts: default_max_attempts(),
        }
    }
}

/// When the layout agent runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutTrigger {
    /// Only when the user asks for a rendering
    #[default]
    Manual,
    /// Whenever the visualization view becomes active with an unrendered answer
    OnViewActivate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub layout_trigger: LayoutTrigger,

    /// Assistant turn appended when the primary agent fails
    #[serde(default = "default_apology")]
    pub apology_message: String,
}

fn default_apology() -> String {
    "Sorry, something went wrong while processing your message. Please try again.".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            layout_trigger: LayoutTrigger::default(),
            apology_message: default_apology(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilesConfig {
    /// Defaults to `~/.aula/profiles.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.aula/config.toml).
    ///
    /// Environment variables override the file:
    /// - `AULA_PROVIDER_URL`, then `DEEPSEEK_API_URL`
    /// - `AULA_API_KEY`, then `OPENAI_API_KEY`, then `DEEPSEEK_API_KEY`
    /// - `AULA_MODEL`
    /// - `AULA_GATEWAY_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
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

    /// Apply environment overrides using the given lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| lookup(*k).filter(|v| !v.is_empty()))
        };

        if let Some(url) = first(&["AULA_PROVIDER_URL", "DEEPSEEK_API_URL"]) {
            self.provider.endpoint = Some(url);
        }
        // AULA_API_KEY beats the file; the vendor variables only fill a gap.
        if let Some(key) = first(&["AULA_API_KEY"]) {
            self.provider.api_key = Some(key);
        } else if self.provider.api_key.is_none() {
            self.provider.api_key = first(&["OPENAI_API_KEY", "DEEPSEEK_API_KEY"]);
        }
        if let Some(model) = first(&["AULA_MODEL"]) {
            self.provider.model = model;
        }
        if let Some(url) = first(&["AULA_GATEWAY_URL"]) {
            self.client.gateway_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".aula")
    }

    /// Where learner profiles are stored.
    pub fn profiles_path(&self) -> PathBuf {
        self.profiles
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("profiles.json"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.client.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "client.max_attempts must be at least 1".into(),
            ));
        }

        if self.session.apology_message.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "session.apology_message must not be empty".into(),
            ));
        }

        self.prompt_overrides()?;
        Ok(())
    }

    fn prompt_overrides(&self) -> Result<Vec<(AgentType, String)>, ConfigError> {
        self.prompts
            .iter()
            .map(|(key, prompt)| {
                let agent = key.parse::<AgentType>().map_err(|_| {
                    ConfigError::ValidationError(format!("unknown agent type in [prompts]: '{key}'"))
                })?;
                if prompt.trim().is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "prompt override for '{key}' is empty"
                    )));
                }
                Ok((agent, prompt.clone()))
            })
            .collect()
    }

    /// Builtin prompts with the `[prompts]` overrides applied.
    pub fn prompt_registry(&self) -> Result<PromptRegistry, ConfigError> {
        let overrides = self.prompt_overrides()?;
        PromptRegistry::builtin()
            .with_overrides(overrides)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Generate a starter config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let mut config = Self::default();
        config.provider.endpoint = Some("https://api.openai.com/v1/chat/completions".into());
        toml::to_string_pretty(&config).unwrap_or_default()
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

    #[error("Provider endpoint not configured (set provider.endpoint or AULA_PROVIDER_URL)")]
    MissingEndpoint,

    #[error("Provider API key not configured (set provider.api_key or AULA_API_KEY)")]
    MissingCredential,
}

impl From<ConfigError> for GatewayError {
    fn from(err: ConfigError) -> Self {
        GatewayError::Configuration(err.to_string())
    }
}
