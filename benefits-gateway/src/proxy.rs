//! The chat relay: one stateless forwarding path shared by every entry point.
//!
//! `ChatProxy::handle` takes the raw method and body of an inbound request
//! and always produces a JSON reply:
//!
//! | Condition                    | Reply                                   |
//! |------------------------------|-----------------------------------------|
//! | method is not POST           | 405 `{error}`, no upstream call         |
//! | no API key configured        | 500 `{error}`, no upstream call         |
//! | body over the size limit     | 413 `{error}`, no upstream call         |
//! | body is not a usable object  | 400 `{error}`, no upstream call         |
//! | upstream unreachable / junk  | 500 fixed `{error}`, cause logged       |
//! | upstream answered            | upstream status + body, verbatim        |

use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{debug, error, warn};

use benefits_core::{Config, ErrorBody};

use crate::providers::anthropic::{AnthropicClient, AnthropicError, RelayProfile, UpstreamReply};
use crate::usage::UsageReport;

/// Failures detected by the gateway itself.
///
/// The `Display` text is exactly what the caller sees in `{ "error": ... }`;
/// underlying causes are kept for the server log only.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("ANTHROPIC_API_KEY is not configured on the server.")]
    MissingCredential,
    #[error("Request body too large.")]
    BodyTooLarge,
    #[error("Invalid request body.")]
    InvalidBody { reason: String },
    #[error("Failed to reach Anthropic API.")]
    UpstreamUnreachable(#[source] AnthropicError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::InvalidBody { .. } => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamUnreachable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        match self {
            ProxyError::MethodNotAllowed => debug!("Rejected chat request: method not allowed"),
            ProxyError::MissingCredential => {
                error!("Rejected chat request: ANTHROPIC_API_KEY is not configured")
            }
            ProxyError::BodyTooLarge => warn!("Rejected chat request: body over the size limit"),
            ProxyError::InvalidBody { reason } => {
                warn!("Rejected chat request: invalid body ({})", reason)
            }
            ProxyError::UpstreamUnreachable(source) => error!("Proxy error: {}", source),
        }
    }
}

/// A finished reply: status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyReply {
    pub status: StatusCode,
    pub body: Value,
}

impl From<UpstreamReply> for ProxyReply {
    fn from(reply: UpstreamReply) -> Self {
        Self {
            status: StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY),
            body: reply.body,
        }
    }
}

impl From<ProxyError> for ProxyReply {
    fn from(err: ProxyError) -> Self {
        let body = serde_json::to_value(ErrorBody::new(err.to_string()))
            .unwrap_or_else(|_| Value::Null);
        Self {
            status: err.status(),
            body,
        }
    }
}

impl IntoResponse for ProxyReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Stateless relay from the chat widget to the upstream Messages API.
///
/// Holds only read-only configuration; concurrent calls share nothing mutable.
#[derive(Clone)]
pub struct ChatProxy {
    client: AnthropicClient,
    api_key: Option<String>,
    profile: RelayProfile,
}

impl ChatProxy {
    pub fn new(client: AnthropicClient, api_key: Option<String>, profile: RelayProfile) -> Self {
        Self {
            client,
            api_key,
            profile,
        }
    }

    /// Build the proxy from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, AnthropicError> {
        let client = AnthropicClient::new(&config.settings)?;
        let profile = RelayProfile::for_mode(config.relay_mode(), &config.settings.upstream)?;

        Ok(Self::new(
            client,
            config.anthropic_api_key().map(str::to_string),
            profile,
        ))
    }

    pub fn profile(&self) -> &RelayProfile {
        &self.profile
    }

    /// Handle one inbound chat request. Never fails: errors become replies.
    pub async fn handle(&self, method: &Method, body: &[u8]) -> ProxyReply {
        match self.relay(method, body).await {
            Ok(reply) => reply,
            Err(err) => {
                err.log();
                err.into()
            }
        }
    }

    /// Answer a request whose body could not be read.
    ///
    /// The method and credential checks still come first, so the caller sees
    /// the same error it would have with a readable body.
    pub fn handle_unreadable(&self, method: &Method, rejection: BytesRejection) -> ProxyReply {
        let err = match self.admit(method) {
            Err(err) => err,
            Ok(_) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => ProxyError::BodyTooLarge,
            Ok(_) => ProxyError::InvalidBody {
                reason: rejection.body_text(),
            },
        };
        err.log();
        err.into()
    }

    /// Method and credential checks, before any body processing.
    fn admit(&self, method: &Method) -> Result<&str, ProxyError> {
        if *method != Method::POST {
            return Err(ProxyError::MethodNotAllowed);
        }

        self.api_key
            .as_deref()
            .ok_or(ProxyError::MissingCredential)
    }

    async fn relay(&self, method: &Method, body: &[u8]) -> Result<ProxyReply, ProxyError> {
        let api_key = self.admit(method)?;

        let inbound: Value = serde_json::from_slice(body).map_err(|e| ProxyError::InvalidBody {
            reason: e.to_string(),
        })?;
        if !inbound.is_object() {
            return Err(ProxyError::InvalidBody {
                reason: "expected a JSON object".to_string(),
            });
        }

        let outbound = self
            .profile
            .shape_body(inbound)
            .map_err(|e| ProxyError::InvalidBody {
                reason: e.to_string(),
            })?;

        let reply = self
            .client
            .forward(api_key, &outbound, self.profile.extra_headers())
            .await
            .map_err(ProxyError::UpstreamUnreachable)?;

        if reply.is_success() {
            if let Some(usage) = UsageReport::from_response(&reply.body) {
                usage.log();
            }
        } else {
            warn!("Upstream answered with status {}", reply.status);
        }

        Ok(reply.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benefits_core::{RelayMode, Secrets, Settings};
    use httpmock::MockServer;
    use serde_json::json;

    fn proxy_for(base_url: String, mode: RelayMode, api_key: Option<&str>) -> ChatProxy {
        let mut settings = Settings::default();
        settings.upstream.base_url = base_url;
        settings.relay.mode = mode;
        let secrets = Secrets {
            anthropic_api_key: api_key.map(str::to_string),
        };

        let config = Config::new(secrets, settings, None).unwrap();
        ChatProxy::from_config(&config).unwrap()
    }

    fn chat_body() -> Value {
        json!({
            "messages": [{"role": "user", "content": "What does Medicare Part D cover?"}],
            "system": "S",
            "model": "claude-sonnet-4-20250514",
            "max_tokens": 1500
        })
    }

    fn bytes(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[tokio::test]
    async fn test_non_post_methods_rejected_without_upstream_call() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path("/v1/messages");
                then.status(200).json_body(json!({}));
            })
            .await;
        let proxy = proxy_for(server.url("/v1"), RelayMode::Cached, Some("sk-test"));

        for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH, Method::OPTIONS] {
            let reply = proxy.handle(&method, &bytes(&chat_body())).await;
            assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(reply.body, json!({"error": "Method not allowed"}));
        }

        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_missing_credential_rejected_without_upstream_call() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path("/v1/messages");
                then.status(200).json_body(json!({}));
            })
            .await;
        let proxy = proxy_for(server.url("/v1"), RelayMode::Cached, None);

        let reply = proxy.handle(&Method::POST, &bytes(&chat_body())).await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            reply.body,
            json!({"error": "ANTHROPIC_API_KEY is not configured on the server."})
        );
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_method_checked_before_credential() {
        let proxy = proxy_for("http://127.0.0.1:1/v1".to_string(), RelayMode::Cached, None);
        let reply = proxy.handle(&Method::GET, b"").await;
        assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_cached_mode_wraps_system_prompt() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST)
                    .path("/v1/messages")
                    .header("x-api-key", "sk-test")
                    .header("anthropic-beta", "prompt-caching-2024-07-31")
                    .json_body(json!({
                        "model": "claude-sonnet-4-20250514",
                        "max_tokens": 1500,
                        "system": [{
                            "type": "text",
                            "text": "S",
                            "cache_control": {"type": "ephemeral"}
                        }],
                        "messages": [{"role": "user", "content": "What does Medicare Part D cover?"}]
                    }));
                then.status(200).json_body(json!({
                    "content": [{"type": "text", "text": "Prescription drugs."}],
                    "usage": {"input_tokens": 100, "output_tokens": 20}
                }));
            })
            .await;
        let proxy = proxy_for(server.url("/v1"), RelayMode::Cached, Some("sk-test"));

        let reply = proxy.handle(&Method::POST, &bytes(&chat_body())).await;

        mock.assert_hits_async(1).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(
            reply.body["content"],
            json!([{"type": "text", "text": "Prescription drugs."}])
        );
    }

    #[tokio::test]
    async fn test_passthrough_mode_forwards_body_verbatim() {
        let mut inbound = chat_body();
        inbound["temperature"] = json!(0.3);

        let server = MockServer::start_async().await;
        let expected = inbound.clone();
        let mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST)
                    .path("/v1/messages")
                    .header("x-api-key", "sk-test")
                    .json_body(expected);
                then.status(201).json_body(json!({"ok": true}));
            })
            .await;
        let proxy = proxy_for(server.url("/v1"), RelayMode::Passthrough, Some("sk-test"));

        let reply = proxy.handle(&Method::POST, &bytes(&inbound)).await;

        mock.assert_hits_async(1).await;
        assert_eq!(reply.status, StatusCode::CREATED);
        assert_eq!(reply.body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_upstream_error_status_relayed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/v1/messages");
                then.status(429).json_body(json!({"error": "rate_limited"}));
            })
            .await;
        let proxy = proxy_for(server.url("/v1"), RelayMode::Cached, Some("sk-test"));

        let reply = proxy.handle(&Method::POST, &bytes(&chat_body())).await;

        assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(reply.body, json!({"error": "rate_limited"}));
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_fixed_error() {
        let proxy = proxy_for(
            "http://127.0.0.1:1/v1".to_string(),
            RelayMode::Cached,
            Some("sk-test"),
        );

        let reply = proxy.handle(&Method::POST, &bytes(&chat_body())).await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body, json!({"error": "Failed to reach Anthropic API."}));
    }

    #[tokio::test]
    async fn test_non_json_upstream_body_maps_to_fixed_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/v1/messages");
                then.status(200).body("upstream exploded: stack trace here");
            })
            .await;
        let proxy = proxy_for(server.url("/v1"), RelayMode::Cached, Some("sk-test"));

        let reply = proxy.handle(&Method::POST, &bytes(&chat_body())).await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body, json!({"error": "Failed to reach Anthropic API."}));
    }

    #[tokio::test]
    async fn test_malformed_body_rejected_without_upstream_call() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path("/v1/messages");
                then.status(200).json_body(json!({}));
            })
            .await;
        let proxy = proxy_for(server.url("/v1"), RelayMode::Cached, Some("sk-test"));

        for body in [b"not json".to_vec(), b"[1, 2]".to_vec(), b"\"text\"".to_vec()] {
            let reply = proxy.handle(&Method::POST, &body).await;
            assert_eq!(reply.status, StatusCode::BAD_REQUEST);
            assert_eq!(reply.body, json!({"error": "Invalid request body."}));
        }

        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_non_string_system_left_to_upstream() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path("/v1/messages").json_body(json!({
                    "model": "m",
                    "max_tokens": 10,
                    "system": [{"type": "text", "text": 42, "cache_control": {"type": "ephemeral"}}],
                    "messages": []
                }));
                then.status(400).json_body(json!({
                    "type": "error",
                    "error": {"type": "invalid_request_error", "message": "system.0.text: Input should be a valid string"}
                }));
            })
            .await;
        let proxy = proxy_for(server.url("/v1"), RelayMode::Cached, Some("sk-test"));

        let body = json!({"system": 42, "messages": [], "model": "m", "max_tokens": 10});
        let reply = proxy.handle(&Method::POST, &bytes(&body)).await;

        mock.assert_hits_async(1).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path("/v1/messages");
                then.status(200).json_body(json!({
                    "id": "msg_fixed",
                    "content": [{"type": "text", "text": "Same answer."}],
                    "usage": {"input_tokens": 3, "cache_read_input_tokens": 900, "output_tokens": 4}
                }));
            })
            .await;
        let proxy = proxy_for(server.url("/v1"), RelayMode::Cached, Some("sk-test"));

        let first = proxy.handle(&Method::POST, &bytes(&chat_body())).await;
        let second = proxy.handle(&Method::POST, &bytes(&chat_body())).await;

        mock.assert_hits_async(2).await;
        assert_eq!(first, second);
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            ProxyError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ProxyError::MissingCredential.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ProxyError::InvalidBody {
                reason: "x".to_string()
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::BodyTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
