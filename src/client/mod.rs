//! Client management system
//!
//! Handles client connections, identity state, and the shared registry.

pub mod handler;
pub mod registry;
pub mod state;

pub use handler::handle_client;
pub use registry::{Registry, SharedRegistry};
pub use state::{Identity, Outbound, Profile};
