//! Outbound request shaping for the Messages API.
//!
//! A [`RelayProfile`] decides what the gateway does to an inbound chat body
//! before it goes upstream: either wrap the system prompt in a cached block
//! and keep only the known fields, or forward the body untouched.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use benefits_core::{RelayMode, UpstreamSettings};

use crate::prompt::{SystemBlock, cached_system_prompt};
use crate::providers::anthropic::client::AnthropicError;

/// Header that switches on prompt caching upstream
pub const BETA_HEADER: &str = "anthropic-beta";

/// The inbound fields forwarded by the cached profile.
///
/// All of them stay opaque: the gateway does not inspect the conversation,
/// the model id, the token limit or the type of the system prompt.
#[derive(Debug, Deserialize)]
pub struct InboundChat {
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub system: Value,
    #[serde(default)]
    pub model: Option<Value>,
    #[serde(default)]
    pub max_tokens: Option<Value>,
}

/// Request body for the Messages API with the system prompt as cacheable blocks
///
/// Serialized straight into the request, so keys go out in field order.
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<Value>,
    /// System prompt as array of blocks (supports cache_control)
    pub system: Vec<SystemBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Value>,
}

impl From<InboundChat> for MessagesRequest {
    fn from(inbound: InboundChat) -> Self {
        Self {
            model: inbound.model,
            max_tokens: inbound.max_tokens,
            system: cached_system_prompt(inbound.system),
            messages: inbound.messages,
        }
    }
}

/// The body actually sent upstream
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OutboundBody {
    Cached(MessagesRequest),
    Verbatim(Value),
}

/// How a chat body is reshaped and which extra headers accompany it upstream.
#[derive(Debug, Clone)]
pub struct RelayProfile {
    mode: RelayMode,
    extra_headers: HeaderMap,
}

impl RelayProfile {
    /// Cache-annotated profile: wraps `system`, sends the caching beta header.
    pub fn cached(caching_beta: &str) -> Result<Self, AnthropicError> {
        let mut extra_headers = HeaderMap::new();
        extra_headers.insert(
            HeaderName::from_static(BETA_HEADER),
            HeaderValue::from_str(caching_beta)?,
        );

        Ok(Self {
            mode: RelayMode::Cached,
            extra_headers,
        })
    }

    /// Bare pass-through profile for local development.
    pub fn passthrough() -> Self {
        Self {
            mode: RelayMode::Passthrough,
            extra_headers: HeaderMap::new(),
        }
    }

    /// Build the profile selected in settings.
    pub fn for_mode(mode: RelayMode, upstream: &UpstreamSettings) -> Result<Self, AnthropicError> {
        match mode {
            RelayMode::Cached => Self::cached(&upstream.caching_beta),
            RelayMode::Passthrough => Ok(Self::passthrough()),
        }
    }

    pub fn mode(&self) -> RelayMode {
        self.mode
    }

    /// Whether the system prompt gets a cache-control annotation
    pub fn caches_system(&self) -> bool {
        self.mode == RelayMode::Cached
    }

    /// Headers sent on top of the client defaults and the credential
    pub fn extra_headers(&self) -> &HeaderMap {
        &self.extra_headers
    }

    /// Turn an inbound JSON body into the outbound one.
    ///
    /// Fails only when the cached profile is handed something other than a
    /// JSON object.
    pub fn shape_body(&self, inbound: Value) -> Result<OutboundBody, serde_json::Error> {
        if !self.caches_system() {
            return Ok(OutboundBody::Verbatim(inbound));
        }

        let chat: InboundChat = serde_json::from_value(inbound)?;
        Ok(OutboundBody::Cached(MessagesRequest::from(chat)))
    }
}
