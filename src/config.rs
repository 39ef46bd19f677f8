//! Configuration management for the signaling server
//!
//! Values are layered: built-in defaults, then an optional `config.toml`,
//! then `SIGNAL_*` environment variables.

use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: i64 = 5000;
const DEFAULT_MAX_CLIENTS: i64 = 256;
const DEFAULT_MAX_MESSAGE_LENGTH: i64 = 4096;
const DEFAULT_MAX_FRAME_LENGTH: i64 = 64 * 1024;

/// Server configuration loaded once at startup
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address the WebSocket listener binds to
    pub bind_address: String,

    /// Listening TCP port
    /// Environment: SIGNAL_PORT
    pub port: u16,

    /// Maximum concurrent connections, registered or not
    /// Environment: SIGNAL_MAX_CLIENTS
    pub max_clients: usize,

    /// Longest text frame accepted, in bytes; longer ones are dropped
    pub max_message_length: usize,

    /// Hard cap enforced by the WebSocket layer while reading; a larger
    /// frame closes the connection
    pub max_frame_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT as u16,
            max_clients: DEFAULT_MAX_CLIENTS as usize,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH as usize,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH as usize,
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        // Packaged layout first, then the working directory
        let config_paths = ["p2p-signal-server/config", "config"];

        let mut builder = Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("port", DEFAULT_PORT)?
            .set_default("max_clients", DEFAULT_MAX_CLIENTS)?
            .set_default("max_message_length", DEFAULT_MAX_MESSAGE_LENGTH)?
            .set_default("max_frame_length", DEFAULT_MAX_FRAME_LENGTH)?;

        for path in config_paths {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix("SIGNAL"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.bind_address.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "bind_address cannot be empty".into(),
            ));
        }

        if self.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_message_length == 0 {
            return Err(config::ConfigError::Message(
                "max_message_length must be greater than 0".into(),
            ));
        }

        if self.max_frame_length < self.max_message_length {
            return Err(config::ConfigError::Message(
                "max_frame_length must be at least max_message_length".into(),
            ));
        }

        Ok(())
    }

    /// Bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
