use std::{
    net::SocketAddr,
    sync::Arc,
};

use futures_util::{
    SinkExt,
    StreamExt,
};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;

use super::types::{
    parse_frame,
    ClientRegistry,
    ParsedFrame,
    ServerMessage,
};
use crate::{
    bridge::Bridge,
    core::BridgeError,
};

pub async fn handle_connection(
    stream: tokio::net::TcpStream,
    addr: SocketAddr,
    clients: Arc<ClientRegistry>,
    bridge: Arc<Bridge>,
) -> Result<(), BridgeError> {
    let ws_stream = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| BridgeError::Custom(format!("Error during WebSocket handshake: {}", e)))?;

    tracing::info!("[WS] WebSocket connection established with: {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::channel::<String>(32);

    let total = clients.register(tx.clone());
    tracing::debug!("[WS] Client registered. Total clients: {}", total);

    let forward_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(Message::text(msg)).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(message)) => {
                if message.as_str() == "PING" {
                    if let Err(e) = tx.send("PONG".to_string()).await {
                        tracing::warn!("[WS] Failed to send PONG: {}", e);
                    }
                    continue;
                }
                handle_frame(message.as_str(), addr, &tx, &bridge);
            }
            Ok(Message::Close(_)) => {
                tracing::info!("[WS] Client {} disconnected", addr);
                break;
            }
            Err(e) => {
                tracing::warn!("[WS] Error from client {}: {}", addr, e);
                break;
            }
            _ => {}
        }
    }

    // In-flight requests hold their own sender clones and finish on their own;
    // their replies are dropped once the forwarder is gone.
    forward_task.abort();
    drop(tx);

    let removed = clients.prune();
    tracing::debug!(
        "[WS] Client {} gone. Removed {} clients. Total clients remaining: {}",
        addr,
        removed,
        clients.len()
    );

    Ok(())
}

/// Runs each action in its own task so a slow `addNotes` does not hold up the socket.
fn handle_frame(text: &str, addr: SocketAddr, tx: &mpsc::Sender<String>, bridge: &Arc<Bridge>) {
    let (message_id, action) = match parse_frame(text) {
        Ok(ParsedFrame::Action { message_id, action }) => (message_id, action),
        Ok(ParsedFrame::Unknown { action }) => {
            tracing::debug!("[WS] Ignoring unknown action {:?} from {}", action, addr);
            return;
        }
        Err(e) => {
            tracing::warn!("[WS] Dropping malformed message from {}: {}", addr, e);
            return;
        }
    };

    tracing::debug!("[WS] {} from {}", action.name(), addr);

    let tx = tx.clone();
    let bridge = bridge.clone();
    tokio::spawn(async move {
        let notifier = bridge.client_notifier(tx.clone());
        let body = bridge.dispatch(action, &notifier).await;
        let reply = ServerMessage::response(message_id.unwrap_or_default(), body);

        match reply.to_json() {
            Ok(json) => {
                if let Err(e) = tx.send(json).await {
                    tracing::debug!("[WS] Client {} left before its reply: {}", addr, e);
                }
            }
            Err(e) => tracing::warn!("[WS] Cannot encode reply: {}", e),
        }
    });
}
