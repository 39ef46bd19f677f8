//! Error types
//!
//! Defines the signaling errors reported back to clients and the
//! startup errors that can stop the server.

use std::fmt;
use std::io;

/// Errors raised while routing a single control message.
///
/// None of these close the connection. The `Display` output is the
/// human-readable reason carried in the `error` message sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// Frame was not valid JSON or not a JSON object
    Decode(String),
    UsernameTaken(String),
    NotRegistered,
    PeerNotFound(String),
    NoPendingRequest,
    /// Pending requester disconnected before the request was answered
    StaleReference(String),
    /// Sending to another connection failed
    ForwardingFailure(String),
    SelfChat,
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalError::Decode(e) => write!(f, "Malformed message: {}", e),
            SignalError::UsernameTaken(u) => write!(f, "Username '{}' is already taken", u),
            SignalError::NotRegistered => write!(f, "You are not registered yet"),
            SignalError::PeerNotFound(u) => write!(f, "User '{}' not found or not online.", u),
            SignalError::NoPendingRequest => write!(f, "No pending chat request"),
            SignalError::StaleReference(u) => write!(f, "Requester '{}' is no longer online", u),
            SignalError::ForwardingFailure(u) => {
                write!(f, "Failed to deliver chat request to '{}'", u)
            }
            SignalError::SelfChat => write!(f, "Cannot start a chat with yourself"),
        }
    }
}

impl std::error::Error for SignalError {}

impl From<serde_json::Error> for SignalError {
    fn from(error: serde_json::Error) -> Self {
        SignalError::Decode(error.to_string())
    }
}

/// Errors that stop the server from starting or serving a connection
#[derive(Debug)]
pub enum ServerError {
    Config(config::ConfigError),
    Io(io::Error),
    Handshake(tokio_tungstenite::tungstenite::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::Io(e) => write!(f, "I/O error: {}", e),
            ServerError::Handshake(e) => write!(f, "WebSocket handshake failed: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::Io(error)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ServerError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        ServerError::Handshake(error)
    }
}
