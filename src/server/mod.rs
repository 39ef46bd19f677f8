//! Server core functionality
//!
//! This module contains the listener and accept loop for the signaling server.

pub mod core;

pub use core::Server;
