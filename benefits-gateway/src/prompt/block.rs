//! Prompt blocks with cache control support.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cache control marker attached to a content block.
///
/// Upstream caches everything up to and including the marked block, so a
/// byte-identical system prompt is billed at the cache-read rate on repeat calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheControl {
    /// The type of caching (upstream only knows "ephemeral")
    pub r#type: String,
}

impl CacheControl {
    /// Create an ephemeral cache control (upstream default TTL)
    pub fn ephemeral() -> Self {
        Self {
            r#type: "ephemeral".to_string(),
        }
    }
}

/// A text block of the `system` array in a Messages API request
///
/// `text` is whatever the caller sent as its system prompt. It is normally a
/// string; anything else is left for upstream to reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

impl SystemBlock {
    /// Plain text block without caching
    pub fn text(text: impl Into<Value>) -> Self {
        Self {
            block_type: "text".to_string(),
            text: text.into(),
            cache_control: None,
        }
    }

    /// Text block marked for ephemeral caching
    pub fn cached(text: impl Into<Value>) -> Self {
        Self {
            cache_control: Some(CacheControl::ephemeral()),
            ..Self::text(text)
        }
    }
}

/// Wrap a system prompt into the one-element cached block array.
pub fn cached_system_prompt(system: impl Into<Value>) -> Vec<SystemBlock> {
    vec![SystemBlock::cached(system)]
}
