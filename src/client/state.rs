//! Module `state`
//!
//! Defines the `Identity` record kept for every live connection, together
//! with its signaling state (the pending chat requester).

use std::net::SocketAddr;
use tokio::sync::mpsc;

use crate::error::SignalError;
use crate::protocol::ServerMessage;

/// Sending half of a connection's outbound queue.
///
/// The connection's writer task drains the other half onto the socket, so a
/// failed send means that connection is gone.
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// Reachable address announced by a client at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub address: String,
    pub port: u16,
}

/// A connected client, registered or not.
#[derive(Debug)]
pub struct Identity {
    connection: SocketAddr,
    outbound: Outbound,
    profile: Option<Profile>,
    pending_requester: Option<String>,
}

impl Identity {
    /// Creates the unregistered placeholder for a freshly accepted connection.
    pub fn unregistered(connection: SocketAddr, outbound: Outbound) -> Self {
        Self {
            connection,
            outbound,
            profile: None,
            pending_requester: None,
        }
    }

    pub fn connection(&self) -> SocketAddr {
        self.connection
    }

    pub fn is_registered(&self) -> bool {
        self.profile.is_some()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.username.as_str())
    }

    pub fn pending_requester(&self) -> Option<&str> {
        self.pending_requester.as_deref()
    }

    pub fn set_profile(&mut self, profile: Option<Profile>) {
        self.profile = profile;
    }

    /// Records `requester` as the one chat request awaiting an answer,
    /// returning whoever it replaced.
    pub fn set_pending_requester(&mut self, requester: String) -> Option<String> {
        self.pending_requester.replace(requester)
    }

    pub fn take_pending_requester(&mut self) -> Option<String> {
        self.pending_requester.take()
    }

    /// Queues a message for this connection.
    ///
    /// Fails with `ForwardingFailure` once the connection's writer has shut down.
    pub fn send(&self, message: ServerMessage) -> Result<(), SignalError> {
        self.outbound.send(message).map_err(|_| {
            SignalError::ForwardingFailure(
                self.username()
                    .map(str::to_string)
                    .unwrap_or_else(|| self.connection.to_string()),
            )
        })
    }
}
