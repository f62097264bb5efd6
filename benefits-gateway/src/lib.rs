pub mod prompt;
pub mod providers;
pub mod proxy;
pub mod server;
pub mod state;
pub mod usage;

pub use providers::anthropic::{
    AnthropicClient, AnthropicError, OutboundBody, RelayProfile, UpstreamReply,
};
pub use proxy::{ChatProxy, ProxyError, ProxyReply};
pub use state::{AppState, StateError};
pub use usage::UsageReport;
