//! Signaling protocol implementation
//!
//! Handles message decoding, routing, and response generation.

pub mod handlers;
pub mod messages;

pub use handlers::handle_message;
pub use messages::{ClientMessage, ServerMessage, parse_message};
