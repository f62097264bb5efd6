//! Upstream LLM providers.

pub mod anthropic;
