use std::{
    net::SocketAddr,
    sync::Arc,
};

use tokio::net::TcpListener;

use super::{
    connection::handle_connection,
    types::ClientRegistry,
};
use crate::{
    bridge::Bridge,
    core::BridgeError,
};

/// Local WebSocket endpoint the browser extension connects to.
pub struct WebSocketServer {
    listener: TcpListener,
    clients: Arc<ClientRegistry>,
    bridge: Arc<Bridge>,
}

impl WebSocketServer {
    pub async fn bind(
        addr: SocketAddr,
        clients: Arc<ClientRegistry>,
        bridge: Arc<Bridge>,
    ) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| BridgeError::Custom(format!("Failed to bind to address {}: {}", addr, e)))?;

        Ok(Self { listener, clients, bridge })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BridgeError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the listener fails.
    pub async fn run(self) -> Result<(), BridgeError> {
        tracing::info!("WebSocket server running on ws://{}", self.local_addr()?);

        loop {
            let (stream, addr) = self.listener.accept().await?;
            tracing::debug!("New connection from: {}", addr);

            let clients = self.clients.clone();
            let bridge = self.bridge.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, addr, clients, bridge).await {
                    tracing::warn!("Error handling connection from {}: {}", addr, e);
                }
            });
        }
    }
}
