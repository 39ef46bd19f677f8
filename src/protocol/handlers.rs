//! Message router for the signaling protocol.
//!
//! Each decoded client message is dispatched to a handler that reads or
//! mutates the registry and queues replies on the sender's connection or
//! forwards messages to the other party of a handshake. Handler failures are
//! reported to the sender as an `error` message and never close the connection.

use log::{debug, info, warn};
use std::net::SocketAddr;

use crate::client::Registry;
use crate::error::SignalError;
use crate::protocol::{ClientMessage, ServerMessage};

const GREETING_REPLY: &str = "Hello from the signaling server!";

/// Dispatches one decoded message from `origin`.
///
/// The caller must hold the registry lock for the whole call so that a
/// handshake step observes one consistent registry state.
pub fn handle_message(registry: &mut Registry, origin: SocketAddr, message: ClientMessage) {
    let result = match message {
        ClientMessage::Greeting => handle_greeting(registry, origin),
        ClientMessage::Register { username, ip, port } => {
            handle_register(registry, origin, username, ip, port)
        }
        ClientMessage::GetName => handle_get_name(registry, origin),
        ClientMessage::GetPeer { username } => handle_get_peer(registry, origin, username),
        ClientMessage::StartChat { target } => handle_start_chat(registry, origin, target),
        ClientMessage::ChatAccept => handle_chat_accept(registry, origin),
        ClientMessage::ChatDecline => handle_chat_decline(registry, origin),
        ClientMessage::Unknown => {
            debug!("Ignoring unknown message type from {}", origin);
            Ok(())
        }
    };

    if let Err(err) = result {
        warn!("Request from {} refused: {}", origin, err);
        reply(registry, origin, ServerMessage::error(&err));
    }
}

/// Queues a message on the sender's own connection.
fn reply(registry: &Registry, origin: SocketAddr, message: ServerMessage) {
    match registry.lookup_by_connection(&origin) {
        Some(identity) => {
            if identity.send(message).is_err() {
                debug!("Reply to {} dropped, connection is closing", origin);
            }
        }
        None => warn!("Connection {} not found in registry", origin),
    }
}

/// Empty fields count as missing. Whitespace is kept as sent.
fn required(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

fn handle_greeting(registry: &mut Registry, origin: SocketAddr) -> Result<(), SignalError> {
    reply(
        registry,
        origin,
        ServerMessage::GreetBack {
            message: GREETING_REPLY.to_string(),
        },
    );
    Ok(())
}

fn handle_register(
    registry: &mut Registry,
    origin: SocketAddr,
    username: Option<String>,
    ip: Option<String>,
    port: Option<u16>,
) -> Result<(), SignalError> {
    let (Some(username), Some(ip), Some(port)) = (required(username), required(ip), port) else {
        debug!("Ignoring incomplete register from {}", origin);
        return Ok(());
    };

    registry.register(origin, &username, &ip, port)?;
    info!("Registered {} @ {}:{} ({})", username, ip, port, origin);

    reply(
        registry,
        origin,
        ServerMessage::RegisterAck {
            message: format!("Registered as {}", username),
        },
    );
    Ok(())
}

fn handle_get_name(registry: &mut Registry, origin: SocketAddr) -> Result<(), SignalError> {
    let username = registry
        .lookup_by_connection(&origin)
        .and_then(|identity| identity.username())
        .ok_or(SignalError::NotRegistered)?
        .to_string();

    reply(registry, origin, ServerMessage::YourName { username });
    Ok(())
}

fn handle_get_peer(
    registry: &mut Registry,
    origin: SocketAddr,
    username: Option<String>,
) -> Result<(), SignalError> {
    let Some(target) = required(username) else {
        debug!("Ignoring get-peer without username from {}", origin);
        return Ok(());
    };

    let profile = registry
        .lookup_by_username(&target)
        .and_then(|peer| peer.profile())
        .cloned()
        .ok_or(SignalError::PeerNotFound(target))?;

    reply(
        registry,
        origin,
        ServerMessage::PeerInfo {
            username: profile.username,
            ip: profile.address,
            port: profile.port,
        },
    );
    Ok(())
}

fn handle_start_chat(
    registry: &mut Registry,
    origin: SocketAddr,
    target: Option<String>,
) -> Result<(), SignalError> {
    let Some(target) = required(target) else {
        debug!("Ignoring start-chat without target from {}", origin);
        return Ok(());
    };

    let caller = registry
        .lookup_by_connection(&origin)
        .and_then(|identity| identity.username())
        .ok_or(SignalError::NotRegistered)?
        .to_string();

    if caller == target {
        return Err(SignalError::SelfChat);
    }

    let recipient = registry
        .lookup_by_username_mut(&target)
        .ok_or_else(|| SignalError::PeerNotFound(target.clone()))?;

    recipient
        .send(ServerMessage::ChatRequest {
            from: caller.clone(),
        })
        .map_err(|_| SignalError::ForwardingFailure(target.clone()))?;

    if let Some(superseded) = recipient.set_pending_requester(caller.clone()) {
        if superseded != caller {
            info!(
                "Chat request from {} to {} replaces pending request from {}",
                caller, target, superseded
            );
        }
    }

    info!("Chat request forwarded from {} to {}", caller, target);
    Ok(())
}

fn handle_chat_accept(registry: &mut Registry, origin: SocketAddr) -> Result<(), SignalError> {
    let accepter = registry
        .lookup_by_connection_mut(&origin)
        .ok_or(SignalError::NotRegistered)?;
    let accepter_profile = accepter
        .profile()
        .cloned()
        .ok_or(SignalError::NotRegistered)?;
    // Taken here so every outcome below leaves nothing pending
    let requester_name = accepter
        .take_pending_requester()
        .ok_or(SignalError::NoPendingRequest)?;

    let requester = registry
        .lookup_by_username(&requester_name)
        .ok_or_else(|| SignalError::StaleReference(requester_name.clone()))?;
    let requester_profile = requester
        .profile()
        .cloned()
        .ok_or_else(|| SignalError::StaleReference(requester_name.clone()))?;

    requester
        .send(ServerMessage::ChatInit {
            username: accepter_profile.username.clone(),
            ip: accepter_profile.address.clone(),
            port: accepter_profile.port,
        })
        .map_err(|_| SignalError::StaleReference(requester_name.clone()))?;

    reply(
        registry,
        origin,
        ServerMessage::ChatInit {
            username: requester_profile.username,
            ip: requester_profile.address,
            port: requester_profile.port,
        },
    );

    info!(
        "Chat initiated between {} and {}",
        requester_name, accepter_profile.username
    );
    Ok(())
}

fn handle_chat_decline(registry: &mut Registry, origin: SocketAddr) -> Result<(), SignalError> {
    let decliner = registry
        .lookup_by_connection_mut(&origin)
        .ok_or(SignalError::NotRegistered)?;
    let decliner_name = decliner
        .username()
        .ok_or(SignalError::NotRegistered)?
        .to_string();
    let requester_name = decliner
        .take_pending_requester()
        .ok_or(SignalError::NoPendingRequest)?;

    match registry.lookup_by_username(&requester_name) {
        Some(requester) => {
            let notice = ServerMessage::error(format!(
                "{} declined your chat request",
                decliner_name
            ));
            if requester.send(notice).is_err() {
                debug!("Decline notice to {} dropped, connection is closing", requester_name);
            }
        }
        None => debug!("Requester {} is no longer online", requester_name),
    }

    info!("{} declined chat request from {}", decliner_name, requester_name);
    Ok(())
}
