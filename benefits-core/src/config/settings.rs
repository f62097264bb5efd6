//! Settings configuration loaded from TOML files.
//!
//! This module handles non-sensitive configuration stored in TOML format
//! in the XDG config directory (~/.config/benefits-proxy/config.toml).

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# benefits-proxy configuration file
# Located at: ~/.config/benefits-proxy/config.toml
#
# This file contains non-sensitive configuration.
# The upstream API key is loaded from the environment (or .env.local / .env):
#   - ANTHROPIC_API_KEY

[gateway]
host = "127.0.0.1"
port = 3001
chat_path = "/api/chat"
# Largest chat body accepted, in bytes; bigger ones get a JSON 413
max_body_bytes = 4500000

[upstream]
base_url = "https://api.anthropic.com/v1"
api_version = "2023-06-01"
caching_beta = "prompt-caching-2024-07-31"
# timeout_seconds = 120  # Unset: no timeout beyond the HTTP client default

[relay]
# "cached": wrap the system prompt with cache_control and send the caching beta header
# "passthrough": forward the inbound body untouched (local development)
mode = "cached"

[logging]
level = "info"
"#;

/// How the gateway shapes the request it forwards upstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// System prompt wrapped in an ephemeral cache block, caching beta header sent
    #[default]
    Cached,
    /// Inbound body forwarded verbatim, no extra headers
    Passthrough,
}

impl RelayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayMode::Cached => "cached",
            RelayMode::Passthrough => "passthrough",
        }
    }
}

impl std::fmt::Display for RelayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RelayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cached" => Ok(RelayMode::Cached),
            "passthrough" | "pass-through" | "pass_through" => Ok(RelayMode::Passthrough),
            _ => Err(format!("Unknown relay mode: {}", s)),
        }
    }
}

/// Settings loaded from TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// HTTP listener configuration
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Upstream Messages API configuration
    #[serde(default)]
    pub upstream: UpstreamSettings,

    /// Request shaping
    #[serde(default)]
    pub relay: RelaySettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Gateway server settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewaySettings {
    /// Host to bind to
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Path the chat widget posts to
    #[serde(default = "default_chat_path")]
    pub chat_path: String,

    /// Largest accepted chat body in bytes (the widget resends the whole transcript)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Upstream API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamSettings {
    /// Base URL; the Messages endpoint is `{base_url}/messages`
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,

    /// Value of the `anthropic-version` header
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Value of the `anthropic-beta` header sent in cached mode
    #[serde(default = "default_caching_beta")]
    pub caching_beta: String,

    /// Request timeout; `None` keeps the HTTP client default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

/// Relay settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RelaySettings {
    #[serde(default)]
    pub mode: RelayMode,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level (error, warn, info, debug, trace), used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3001
}

fn default_chat_path() -> String {
    "/api/chat".to_string()
}

fn default_max_body_bytes() -> usize {
    4_500_000
}

fn default_upstream_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_caching_beta() -> String {
    "prompt-caching-2024-07-31".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            chat_path: default_chat_path(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            api_version: default_api_version(),
            caching_beta: default_caching_beta(),
            timeout_seconds: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// If the config file doesn't exist, creates it with default values.
    pub fn load() -> Result<Self, SettingsError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("Creating default configuration at {:?}", config_path);
            Self::create_default_config(&config_path)?;
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Get the configuration file path.
    ///
    /// `BENEFITS_PROXY_CONFIG_DIR` overrides the XDG location.
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("BENEFITS_PROXY_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("benefits-proxy");

        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &PathBuf) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, DEFAULT_CONFIG_TOML)?;

        Ok(())
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }

    /// Full URL of the upstream Messages endpoint.
    pub fn messages_url(&self) -> String {
        format!("{}/messages", self.upstream.base_url.trim_end_matches('/'))
    }
}
