pub mod notifier;
pub mod orchestrator;
pub mod prober;
pub mod types;

use std::sync::Arc;

use serde_json::{
    json,
    Value,
};
use tokio::sync::mpsc;

pub use notifier::{
    ClientNotifier,
    LogNotifier,
    Notification,
    Notifier,
};
pub use orchestrator::Orchestrator;
pub use prober::{
    ConnectionProber,
    ProberHandle,
};
pub use types::ResultSummary;

use crate::{
    anki::AnkiApi,
    core::DebugLog,
    persistence::{
        SettingsStore,
        DEBUG_LOG_KEY,
    },
    websocket::ClientAction,
};

/// Answers actions sent by the extension.
pub struct Bridge {
    orchestrator: Orchestrator,
    settings: SettingsStore,
    debug_log: DebugLog,
}

impl Bridge {
    pub fn new(anki: Arc<dyn AnkiApi>, settings: SettingsStore, debug_log: DebugLog) -> Self {
        let orchestrator = Orchestrator::new(anki, settings.clone(), debug_log.clone());
        Self { orchestrator, settings, debug_log }
    }

    /// Notifier bound to one connection's outgoing queue.
    pub fn client_notifier(&self, tx: mpsc::Sender<String>) -> ClientNotifier {
        ClientNotifier::new(tx, self.debug_log.clone())
    }

    /// Returns the reply body for `action`; notifications go through `notifier`.
    pub async fn dispatch(&self, action: ClientAction, notifier: &dyn Notifier) -> Value {
        match action {
            ClientAction::AddNotes(request) => {
                let summary = self.orchestrator.handle_add_notes(&request, notifier).await;
                serde_json::to_value(summary).unwrap_or_else(|e| json!({ "error": e.to_string() }))
            }
            ClientAction::ConnectionStatus => serde_json::to_value(self.settings.connection_status())
                .unwrap_or_else(|e| json!({ "ok": false, "error": e.to_string() })),
            ClientAction::SetDebugLog { enabled } => {
                self.settings.set(DEBUG_LOG_KEY, Value::Bool(enabled));
                json!({ DEBUG_LOG_KEY: enabled })
            }
        }
    }
}
