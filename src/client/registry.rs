//! Identity registry
//!
//! Directory of live connections and registered usernames. One lock guards
//! the whole registry so both indexes always change together.

use log::{debug, info};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::client::state::{Identity, Outbound, Profile};
use crate::error::SignalError;

/// Registry handle shared by every connection task
pub type SharedRegistry = Arc<Mutex<Registry>>;

/// Registry of connected identities.
///
/// `by_connection` owns every `Identity`; `by_username` indexes the
/// registered ones by name and always points at a live `by_connection` key.
#[derive(Debug, Default)]
pub struct Registry {
    by_connection: HashMap<SocketAddr, Identity>,
    by_username: HashMap<String, SocketAddr>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Inserts the placeholder identity for a newly accepted connection.
    pub fn create_unregistered(&mut self, connection: SocketAddr, outbound: Outbound) -> &Identity {
        debug!("Tracking new connection {}", connection);
        self.by_connection
            .entry(connection)
            .insert_entry(Identity::unregistered(connection, outbound))
            .into_mut()
    }

    /// Registers `username` on `connection`.
    ///
    /// A connection that is already registered is renamed in place: its old
    /// name is released only once the new one is known to be free.
    pub fn register(
        &mut self,
        connection: SocketAddr,
        username: &str,
        address: &str,
        port: u16,
    ) -> Result<&Identity, SignalError> {
        if let Some(owner) = self.by_username.get(username) {
            if *owner != connection {
                return Err(SignalError::UsernameTaken(username.to_string()));
            }
        }

        let identity = self
            .by_connection
            .get_mut(&connection)
            .ok_or(SignalError::NotRegistered)?;

        if let Some(previous) = identity.username() {
            if previous != username {
                info!("Connection {} renamed from {} to {}", connection, previous, username);
                self.by_username.remove(previous);
            }
        }

        identity.set_profile(Some(Profile {
            username: username.to_string(),
            address: address.to_string(),
            port,
        }));
        self.by_username.insert(username.to_string(), connection);

        Ok(identity)
    }

    pub fn lookup_by_username(&self, username: &str) -> Option<&Identity> {
        self.by_username
            .get(username)
            .and_then(|connection| self.by_connection.get(connection))
    }

    pub fn lookup_by_username_mut(&mut self, username: &str) -> Option<&mut Identity> {
        let connection = self.by_username.get(username)?;
        self.by_connection.get_mut(connection)
    }

    pub fn lookup_by_connection(&self, connection: &SocketAddr) -> Option<&Identity> {
        self.by_connection.get(connection)
    }

    pub fn lookup_by_connection_mut(&mut self, connection: &SocketAddr) -> Option<&mut Identity> {
        self.by_connection.get_mut(connection)
    }

    /// Drops a closed connection from both indexes.
    pub fn remove(&mut self, connection: &SocketAddr) -> Option<Identity> {
        let identity = self.by_connection.remove(connection)?;
        if let Some(username) = identity.username() {
            // Only drop the name if it still belongs to this connection
            if self.by_username.get(username) == Some(connection) {
                self.by_username.remove(username);
            }
        }
        Some(identity)
    }

    /// Number of live connections, registered or not
    pub fn len(&self) -> usize {
        self.by_connection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_connection.is_empty()
    }

    pub fn registered_count(&self) -> usize {
        self.by_username.len()
    }
}
