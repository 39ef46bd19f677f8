//! P2P Signaling Server - Entry Point
//!
//! Rendezvous relay that lets clients register, find each other, and
//! negotiate direct peer-to-peer chat sessions.

use log::{error, info};
use std::process;

use p2p_signal_server::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching signaling server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            process::exit(1);
        }
    };

    server.start().await;
}
