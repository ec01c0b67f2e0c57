use async_trait::async_trait;
use serde::{
    Deserialize,
    Serialize,
};
use tokio::sync::mpsc;

use super::types::ResultSummary;
use crate::{
    core::DebugLog,
    websocket::ServerMessage,
};

pub const ICON_URL: &str = "images/icon.png";

/// A basic desktop notification, rendered by the extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub icon_url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

pub fn render(summary: &ResultSummary) -> Notification {
    let (title, message) = match &summary.error {
        Some(error) if summary.is_error() => ("Failed to add words".to_string(), error.clone()),
        _ => {
            let mut message = format!("\nTotal words: {}", summary.total_notes);
            if let Some(duplicates) = summary.duplicates {
                message.push_str(&format!("\nDuplicates skipped: {}", duplicates));
            }
            (format!("Added {} new words", summary.added_notes), message)
        }
    };

    Notification { title, message, icon_url: ICON_URL.to_string(), kind: "basic".to_string() }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notification: Notification);

    /// Shows the summary and hands it back unchanged.
    async fn notify(&self, summary: ResultSummary) -> ResultSummary {
        self.show(render(&summary)).await;
        summary
    }
}

/// Only writes notifications to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn show(&self, notification: Notification) {
        tracing::info!("[Babbel2Anki] {}: {}", notification.title, notification.message.trim());
    }
}

/// Pushes notifications to the extension connection that sent the request.
pub struct ClientNotifier {
    tx: mpsc::Sender<String>,
    debug_log: DebugLog,
}

impl ClientNotifier {
    pub fn new(tx: mpsc::Sender<String>, debug_log: DebugLog) -> Self {
        Self { tx, debug_log }
    }
}

#[async_trait]
impl Notifier for ClientNotifier {
    async fn show(&self, notification: Notification) {
        if self.debug_log.enabled() {
            tracing::info!("[Babbel2Anki] Notification: {:?}", notification);
        }

        let json = match ServerMessage::notification(&notification).and_then(|m| m.to_json()) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Cannot encode notification: {}", e);
                return;
            }
        };

        if let Err(e) = self.tx.send(json).await {
            tracing::debug!("[WS] Requesting client is gone: {}", e);
            LogNotifier.show(notification).await;
        }
    }
}
