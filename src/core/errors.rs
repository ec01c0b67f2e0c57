use thiserror::Error;
use tokio::sync::mpsc::error::SendError;
use tokio_tungstenite::tungstenite;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    #[error("WebSocket send error: {0}")]
    WebSocketSend(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("AnkiConnect returned HTTP {0}")]
    HttpStatus(u16),

    #[error("BridgeError: {0}")]
    Custom(String),
}

impl<T> From<SendError<T>> for BridgeError {
    fn from(error: SendError<T>) -> Self {
        BridgeError::WebSocketSend(error.to_string())
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(error: std::io::Error) -> Self {
        BridgeError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(error: reqwest::Error) -> Self {
        BridgeError::Reqwest(Box::new(error))
    }
}

impl From<tungstenite::Error> for BridgeError {
    fn from(error: tungstenite::Error) -> Self {
        BridgeError::WebSocket(Box::new(error))
    }
}
