//! Prompt-cache usage reporting.
//!
//! Upstream responses carry a `usage` record. The gateway never changes the
//! response because of it; it only logs one line per successful call so
//! cache hits can be verified from the server logs.

use serde_json::Value;
use tracing::info;

/// Token counts pulled from an upstream `usage` record.
///
/// Counts missing from the record (or `null`) are reported as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageReport {
    pub input_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_write_tokens: u64,
    pub output_tokens: u64,
}

impl UsageReport {
    /// Extract the usage record from an upstream response body, if any.
    pub fn from_response(body: &Value) -> Option<Self> {
        let usage = body.get("usage")?.as_object()?;
        let count = |field: &str| usage.get(field).and_then(Value::as_u64).unwrap_or(0);

        Some(Self {
            input_tokens: count("input_tokens"),
            cache_read_tokens: count("cache_read_input_tokens"),
            cache_write_tokens: count("cache_creation_input_tokens"),
            output_tokens: count("output_tokens"),
        })
    }

    /// Emit the usage line.
    pub fn log(&self) {
        info!(
            input_tokens = self.input_tokens,
            cache_read_tokens = self.cache_read_tokens,
            cache_write_tokens = self.cache_write_tokens,
            output_tokens = self.output_tokens,
            "{}",
            self
        );
    }
}

impl std::fmt::Display for UsageReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[cache] input={} | cache_read={} | cache_write={} | output={}",
            self.input_tokens, self.cache_read_tokens, self.cache_write_tokens, self.output_tokens
        )
    }
}
