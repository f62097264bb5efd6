//! Anthropic API client used as the upstream of the chat relay.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, InvalidHeaderValue};
use serde::Serialize;
use serde_json::Value;

use benefits_core::Settings;

/// Anthropic API client
#[derive(Clone)]
pub struct AnthropicClient {
    http_client: reqwest::Client,
    messages_url: String,
}

/// What came back from upstream: its status code and its parsed JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Value,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// Errors that can occur when calling the Anthropic API
///
/// Upstream HTTP error statuses are not errors here: they come back as an
/// [`UpstreamReply`] so the caller can relay them.
#[derive(Debug, thiserror::Error)]
pub enum AnthropicError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Upstream returned a non-JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

impl AnthropicClient {
    /// Create a client for the Messages endpoint described by `settings`.
    pub fn new(settings: &Settings) -> Result<Self, AnthropicError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(&settings.upstream.api_version)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = settings.upstream.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http_client: builder.build()?,
            messages_url: settings.messages_url(),
        })
    }

    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }

    /// POST `body` to the Messages endpoint and hand back whatever upstream said.
    ///
    /// One attempt, no retries. Only transport failures and non-JSON bodies
    /// are errors.
    pub async fn forward<B: Serialize + ?Sized>(
        &self,
        api_key: &str,
        body: &B,
        extra_headers: &HeaderMap,
    ) -> Result<UpstreamReply, AnthropicError> {
        let response = self
            .http_client
            .post(&self.messages_url)
            .header("x-api-key", api_key)
            .headers(extra_headers.clone())
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;

        Ok(UpstreamReply { status, body })
    }
}
