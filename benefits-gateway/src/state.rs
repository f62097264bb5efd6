use benefits_core::{Config, RelayMode};

use crate::providers::anthropic::AnthropicError;
use crate::proxy::ChatProxy;

/// Path of the health route, reserved next to the chat route
pub const HEALTH_PATH: &str = "/health";

/// Errors building the application state
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Upstream client error: {0}")]
    Client(#[from] AnthropicError),

    #[error("Invalid chat_path {0:?}: {1}")]
    InvalidChatPath(String, &'static str),
}

/// Shared application state
///
/// Read-only after startup; handlers only borrow it.
pub struct AppState {
    /// The chat relay
    pub proxy: ChatProxy,
    /// Path the chat route is mounted on
    pub chat_path: String,
    /// Largest accepted chat body in bytes
    pub max_body_bytes: usize,
}

impl AppState {
    /// Build the state, rejecting a chat path the router cannot mount.
    pub fn new(
        proxy: ChatProxy,
        chat_path: impl Into<String>,
        max_body_bytes: usize,
    ) -> Result<Self, StateError> {
        Ok(Self {
            proxy,
            chat_path: validate_chat_path(&chat_path.into())?,
            max_body_bytes,
        })
    }

    /// Build the state (and the upstream client) from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        let proxy = ChatProxy::from_config(config)?;
        let gateway = &config.settings.gateway;
        Self::new(proxy, gateway.chat_path.clone(), gateway.max_body_bytes)
    }

    pub fn relay_mode(&self) -> RelayMode {
        self.proxy.profile().mode()
    }
}

/// Routes must start with a slash; tolerate `api/chat` in config.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// The chat route is a literal path: no captures, no wildcards, not `/health`.
fn validate_chat_path(path: &str) -> Result<String, StateError> {
    let path = normalize_path(path);
    let invalid = |reason| Err(StateError::InvalidChatPath(path.clone(), reason));

    if path == HEALTH_PATH {
        return invalid("reserved for the health check");
    }
    if path.contains(['{', '}']) {
        return invalid("braces are not allowed");
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return invalid("segments may not start with ':' or '*'");
    }

    Ok(path)
}
