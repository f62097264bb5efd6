//! Wire types exchanged between the chat widget and the gateway.
//!
//! The gateway relays chat bodies as opaque JSON and never deserializes them
//! into these types. `ChatRequest`, `ChatMessage` and `MessageRole` describe
//! the contract for clients (Rust callers and the integration tests build
//! requests with them). `ErrorBody` is the one type the gateway itself emits.

use serde::{Deserialize, Serialize};

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Body the chat widget posts to the gateway.
///
/// Client-side type: the gateway forwards the body without parsing it into
/// this struct, so looser shapes still reach upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Full transcript, oldest first, ending with the newest user turn
    pub messages: Vec<ChatMessage>,
    /// Plain-text system prompt (kept byte-identical across calls so it caches)
    pub system: String,
    pub model: String,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Create a request with an empty transcript
    pub fn new(model: impl Into<String>, max_tokens: u32, system: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            system: system.into(),
            model: model.into(),
            max_tokens,
        }
    }

    /// Append a turn to the transcript
    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }
}

/// Error body returned for failures detected by the gateway itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
