//! Anthropic Messages API relay with prompt caching support.

pub mod client;
pub mod request;

pub use client::{AnthropicClient, AnthropicError, UpstreamReply};
pub use request::{InboundChat, MessagesRequest, OutboundBody, RelayProfile};
