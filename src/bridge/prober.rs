use std::{
    sync::Arc,
    time::Duration,
};

use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{
        self,
        MissedTickBehavior,
    },
};

use crate::{
    anki::AnkiApi,
    persistence::{
        ConnectionStatus,
        SettingsStore,
    },
};

/// Probes AnkiConnect once and records the outcome.
pub async fn probe_once(anki: &dyn AnkiApi, settings: &SettingsStore) -> ConnectionStatus {
    let status = match anki.version().await {
        Ok(version) => {
            tracing::debug!("AnkiConnect version {}", version);
            ConnectionStatus::now(true)
        }
        Err(e) => {
            tracing::debug!("AnkiConnect probe failed: {}", e);
            ConnectionStatus::now(false)
        }
    };

    settings.set_connection_status(&status);
    status
}

/// Owns the periodic probe task. Dropping the handle stops it.
pub struct ProberHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl ProberHandle {
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            let _ = join_handle.await;
        }
    }
}

impl Drop for ProberHandle {
    fn drop(&mut self) {
        if let Some(join_handle) = self.join_handle.take() {
            join_handle.abort();
        }
    }
}

pub struct ConnectionProber;

impl ConnectionProber {
    /// Probes right away, then every `every`, whatever the previous outcome was.
    pub fn spawn(anki: Arc<dyn AnkiApi>, settings: SettingsStore, every: Duration) -> ProberHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let join_handle = tokio::spawn(async move {
            let mut ticker = time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_ok: Option<bool> = None;

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        // AnkiConnect can hold a request open indefinitely behind a modal dialog.
                        let status = tokio::select! {
                            _ = &mut shutdown_rx => break,
                            status = probe_once(anki.as_ref(), &settings) => status,
                        };
                        if last_ok != Some(status.ok) {
                            tracing::info!("AnkiConnection {}", if status.ok { "UP" } else { "DOWN" });
                            last_ok = Some(status.ok);
                        }
                    }
                }
            }

            tracing::debug!("Connectivity prober stopped");
        });

        ProberHandle { shutdown_tx: Some(shutdown_tx), join_handle: Some(join_handle) }
    }
}
