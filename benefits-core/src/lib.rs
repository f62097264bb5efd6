pub mod config;
pub mod message;

// Config re-exports
pub use config::{
    ANTHROPIC_API_KEY_VAR,
    Config,
    ConfigError,
    GatewaySettings,
    LoggingSettings,
    RelayMode,
    RelaySettings,
    Secrets,
    Settings,
    SettingsError,
    UpstreamSettings,
    load_dotenv,
};

// Message re-exports
pub use message::{ChatMessage, ChatRequest, ErrorBody, MessageRole};
