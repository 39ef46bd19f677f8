//! Error handling
//!
//! Defines error types for the signaling server.

pub mod types;

pub use types::*;
