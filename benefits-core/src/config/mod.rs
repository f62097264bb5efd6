//! Configuration management for the benefits proxy.
//!
//! Secrets (from environment variables) are kept apart from settings
//! (from a TOML file).
//!
//! # Configuration Sources
//!
//! ## Secrets (Environment Variables)
//! - `ANTHROPIC_API_KEY` - upstream API key
//!
//! ## Overrides (Environment Variables)
//! - `BENEFITS_RELAY_MODE` - `cached` or `passthrough`, wins over `[relay] mode`
//! - `BENEFITS_PROXY_CONFIG_DIR` - directory holding `config.toml`
//!
//! ## Settings (TOML File)
//! Located at `~/.config/benefits-proxy/config.toml`:
//! ```toml
//! [gateway]
//! host = "127.0.0.1"
//! port = 3001
//!
//! [relay]
//! mode = "cached"
//! ```

mod secrets;
mod settings;

pub use secrets::{ANTHROPIC_API_KEY_VAR, Secrets};
pub use settings::{
    GatewaySettings, LoggingSettings, RelayMode, RelaySettings, Settings, SettingsError,
    UpstreamSettings,
};

/// Environment variable overriding `[relay] mode`
pub const RELAY_MODE_VAR: &str = "BENEFITS_RELAY_MODE";

/// Combined configuration containing both secrets and settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Invalid BENEFITS_RELAY_MODE value: {0}")]
    InvalidRelayMode(String),
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// A missing API key is tolerated; callers decide how to surface it.
    pub fn load() -> Result<Self, ConfigError> {
        let secrets = Secrets::from_env();
        let settings = Settings::load()?;
        let relay_override = std::env::var(RELAY_MODE_VAR).ok();

        Self::new(secrets, settings, relay_override.as_deref())
    }

    /// Combine already-loaded parts, applying an optional relay mode override.
    pub fn new(
        secrets: Secrets,
        mut settings: Settings,
        relay_override: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = relay_override.map(str::trim).filter(|raw| !raw.is_empty()) {
            settings.relay.mode = raw
                .parse()
                .map_err(|_| ConfigError::InvalidRelayMode(raw.to_string()))?;
        }

        Ok(Self { secrets, settings })
    }

    /// Get the Anthropic API key (if configured).
    pub fn anthropic_api_key(&self) -> Option<&str> {
        self.secrets.anthropic_api_key.as_deref()
    }

    /// Get the active relay mode.
    pub fn relay_mode(&self) -> RelayMode {
        self.settings.relay.mode
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        self.settings.bind_addr()
    }
}

/// Load `.env.local` then `.env` if they exist (for development convenience).
///
/// Variables already set in the process environment are never overwritten,
/// so `.env.local` takes precedence over `.env`.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();
}

// Tests in this module tree that touch process env vars serialize on this lock.
#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
