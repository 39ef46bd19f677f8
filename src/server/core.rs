use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async_with_config;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

use crate::client::{Registry, SharedRegistry, handle_client};
use crate::config::ServerConfig;
use crate::error::ServerError;

pub struct Server {
    registry: SharedRegistry,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the listening socket described by `config`.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let socket = config.listen_socket();

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e.into());
            }
        };

        Ok(Self {
            registry: Registry::shared(),
            listener,
            config: Arc::new(config),
        })
    }

    /// Address actually bound, useful when the configured port is 0
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    pub async fn start(&self) {
        info!(
            "Signaling server running on {} (max {} clients)",
            self.config.listen_socket(),
            self.config.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let registry = Arc::clone(&self.registry);
                    let config = Arc::clone(&self.config);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) = handle_new_client(stream, addr, registry, config).await {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Completes the WebSocket handshake and hands the connection to its session loop.
async fn handle_new_client(
    stream: TcpStream,
    client_addr: SocketAddr,
    registry: SharedRegistry,
    config: Arc<ServerConfig>,
) -> Result<(), ServerError> {
    info!("New connection from {}", client_addr);
    let ws_config = WebSocketConfig::default()
        .max_message_size(Some(config.max_frame_length))
        .max_frame_size(Some(config.max_frame_length));
    let ws_stream = accept_async_with_config(stream, Some(ws_config)).await?;

    handle_client(ws_stream, client_addr, registry, config).await;
    Ok(())
}
