use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::client::SharedRegistry;
use crate::config::ServerConfig;
use crate::protocol::{ServerMessage, handle_message, parse_message};

const SERVER_FULL: &str = "Server is full, try again later";

/// Runs one client connection from accept to close.
///
/// - Inserts an unregistered identity, unless `max_clients` is reached.
/// - Spawns a writer task that drains the connection's outbound queue.
/// - Reads text frames one at a time and dispatches them under the registry lock.
/// - Removes the identity from the registry however the connection ends.
pub async fn handle_client<S>(
    ws_stream: WebSocketStream<S>,
    client_addr: SocketAddr,
    registry: SharedRegistry,
    config: Arc<ServerConfig>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, rx) = mpsc::unbounded_channel::<ServerMessage>();

    {
        let mut registry_guard = registry.lock().await;
        if registry_guard.len() >= config.max_clients {
            drop(registry_guard);
            warn!("Rejecting {}: {} clients connected", client_addr, config.max_clients);
            if let Ok(payload) = ServerMessage::error(SERVER_FULL).to_json() {
                let _ = ws_sender.send(Message::text(payload)).await;
            }
            let _ = ws_sender.close().await;
            return;
        }
        registry_guard.create_unregistered(client_addr, tx);
        info!(
            "Client connected: {} ({}/{} clients)",
            client_addr,
            registry_guard.len(),
            config.max_clients
        );
    }

    // The registry holds the only sender, so removal below ends the writer
    let writer_handle = tokio::spawn(writer_task(ws_sender, rx, client_addr));

    loop {
        match ws_receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                if text.len() > config.max_message_length {
                    warn!(
                        "Dropping {}-byte message from {} (limit {})",
                        text.len(),
                        client_addr,
                        config.max_message_length
                    );
                    continue;
                }

                let message = match parse_message(text.as_str()) {
                    Ok(message) => message,
                    Err(e) => {
                        debug!("Ignoring frame from {}: {}", client_addr, e);
                        continue;
                    }
                };
                debug!("Received from {}: {:?}", client_addr, message);

                let mut registry_guard = registry.lock().await;
                handle_message(&mut registry_guard, client_addr, message);
            }
            Some(Ok(Message::Close(_))) | None => {
                info!("Connection closed by client {}", client_addr);
                break;
            }
            Some(Ok(_)) => {
                // Binary, ping and pong frames carry no signaling
            }
            Some(Err(e)) => {
                error!("Failed to read from {}: {}", client_addr, e);
                break;
            }
        }
    }

    let removed = registry.lock().await.remove(&client_addr);
    match removed.as_ref().and_then(|identity| identity.username()) {
        Some(username) => info!("Removing user {} ({})", username, client_addr),
        None => info!("Client {} disconnected", client_addr),
    }
    drop(removed);

    let _ = writer_handle.await;
}

/// Forwards queued messages onto the WebSocket until every sender is gone.
async fn writer_task<S>(
    mut ws_sender: SplitSink<WebSocketStream<S>, Message>,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    client_addr: SocketAddr,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let payload = match message.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode message for {}: {}", client_addr, e);
                continue;
            }
        };

        if let Err(e) = ws_sender.send(Message::text(payload)).await {
            warn!("Failed to send to {}: {}", client_addr, e);
            break;
        }
    }

    let _ = ws_sender.close().await;
}
