//! System prompt blocks sent to the upstream Messages API.
//!
//! The gateway never authors prompt text itself: the chat widget supplies a
//! plain string and the gateway only reshapes it into cacheable blocks.

pub mod block;

pub use block::{CacheControl, SystemBlock, cached_system_prompt};
