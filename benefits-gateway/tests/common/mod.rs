//! Shared helpers for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use benefits_core::{Config, RelayMode, Secrets, Settings};
use benefits_gateway::server;
use benefits_gateway::state::AppState;
use tokio::net::TcpListener;

/// Build a config pointing the relay at `upstream_base`.
pub fn config_for(upstream_base: String, mode: RelayMode, api_key: Option<&str>) -> Config {
    let mut settings = Settings::default();
    settings.upstream.base_url = upstream_base;
    settings.relay.mode = mode;
    let secrets = Secrets {
        anthropic_api_key: api_key.map(str::to_string),
    };

    Config::new(secrets, settings, None).expect("valid test config")
}

/// Start the gateway on an ephemeral loopback port and return its address.
pub async fn spawn_gateway(config: &Config) -> SocketAddr {
    let state = Arc::new(AppState::from_config(config).expect("gateway state"));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            eprintln!("test gateway stopped: {}", e);
        }
    });

    addr
}
