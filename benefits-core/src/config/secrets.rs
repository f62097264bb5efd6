//! Secrets configuration loaded from environment variables only.
//!
//! The upstream API key must never live in the TOML settings file. It is read
//! from the process environment, which `.env.local` / `.env` may populate
//! during development.

use std::env;

/// Environment variable holding the upstream API credential
pub const ANTHROPIC_API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Secrets loaded exclusively from environment variables.
///
/// A missing key is not an error here: the gateway still starts and answers
/// every chat request with a configuration error instead.
#[derive(Clone, Default)]
pub struct Secrets {
    /// Anthropic API key (env: ANTHROPIC_API_KEY)
    pub anthropic_api_key: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

impl Secrets {
    /// Load secrets from environment variables.
    ///
    /// Loads `.env.local` and `.env` first (development convenience); values
    /// already present in the environment win.
    pub fn from_env() -> Self {
        super::load_dotenv();

        Self::from_env_inner()
    }

    /// Internal method to load from environment without loading dotenv files
    pub(crate) fn from_env_inner() -> Self {
        Self {
            anthropic_api_key: non_empty_var(ANTHROPIC_API_KEY_VAR),
        }
    }

    /// Build secrets from an explicit key (tests and embedding callers)
    pub fn with_anthropic_key(api_key: impl Into<String>) -> Self {
        Self {
            anthropic_api_key: Some(api_key.into()),
        }
    }

    /// Whether the upstream credential is available
    pub fn has_anthropic_key(&self) -> bool {
        self.anthropic_api_key.is_some()
    }
}

/// Read an env var, treating blank values as unset
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
