use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use benefits_core::Config;
use benefits_gateway::server;
use benefits_gateway::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration first: it picks the fallback log level
    let config = Config::load()?;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.settings.logging.level.as_str().into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Configuration loaded (relay mode: {}, upstream: {})",
        config.relay_mode(),
        config.settings.messages_url()
    );

    if config.anthropic_api_key().is_none() {
        warn!("ANTHROPIC_API_KEY is not set; every chat request will fail with 500 until it is");
    }

    let state = Arc::new(AppState::from_config(&config)?);

    // Security: Verify localhost-only binding
    let host = &config.settings.gateway.host;
    if host != "127.0.0.1" && host != "localhost" {
        warn!(
            "Gateway binding to non-localhost address: {}. This may expose the API to remote access.",
            host
        );
    }

    let bind_addr = config.bind_addr();
    info!("Starting benefits gateway on {} (chat route: {})", bind_addr, state.chat_path);

    server::run(state, &bind_addr).await
}
