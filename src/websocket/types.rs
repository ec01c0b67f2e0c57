use parking_lot::Mutex;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    bridge::notifier::Notification,
    notes::AddNotesRequest,
};

/// Envelope fields every frame from the extension carries.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageHeader {
    #[serde(rename = "messageId", default)]
    pub message_id: Option<String>,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientAction {
    AddNotes(AddNotesRequest),
    ConnectionStatus,
    SetDebugLog { enabled: bool },
}

impl ClientAction {
    pub const NAMES: [&'static str; 3] = ["addNotes", "connectionStatus", "setDebugLog"];

    pub fn name(&self) -> &'static str {
        match self {
            ClientAction::AddNotes(_) => "addNotes",
            ClientAction::ConnectionStatus => "connectionStatus",
            ClientAction::SetDebugLog { .. } => "setDebugLog",
        }
    }
}

#[derive(Debug)]
pub enum ParsedFrame {
    Action { message_id: Option<String>, action: ClientAction },
    Unknown { action: String },
}

pub fn parse_frame(text: &str) -> Result<ParsedFrame, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    let header: MessageHeader = serde_json::from_value(value.clone())?;

    if !ClientAction::NAMES.contains(&header.action.as_str()) {
        return Ok(ParsedFrame::Unknown { action: header.action });
    }

    let action = serde_json::from_value(value)?;
    Ok(ParsedFrame::Action { message_id: header.message_id, action })
}

/// Frame sent to the extension, either a reply or a pushed notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerMessage {
    pub command: String,
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub body: Value,
}

impl ServerMessage {
    pub fn response(message_id: impl Into<String>, body: Value) -> Self {
        Self { command: "response".to_string(), message_id: message_id.into(), body }
    }

    pub fn notification(notification: &Notification) -> Result<Self, serde_json::Error> {
        Ok(Self {
            command: "notification".to_string(),
            message_id: Uuid::new_v4().to_string(),
            body: serde_json::to_value(notification)?,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Clone)]
pub struct ConnectedClient {
    pub tx: mpsc::Sender<String>,
}

impl ConnectedClient {
    pub fn is_valid(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Outgoing queues of the extensions currently connected.
#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<Vec<ConnectedClient>>,
}

impl ClientRegistry {
    pub(crate) fn register(&self, tx: mpsc::Sender<String>) -> usize {
        let mut clients = self.clients.lock();
        clients.push(ConnectedClient { tx });
        clients.len()
    }

    /// Drops closed clients and returns how many were removed.
    pub(crate) fn prune(&self) -> usize {
        let mut clients = self.clients.lock();
        let initial_count = clients.len();
        clients.retain(ConnectedClient::is_valid);
        initial_count - clients.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.clients.lock().len()
    }
}
