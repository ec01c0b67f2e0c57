use std::sync::Arc;

use babbel2anki::{
    anki::AnkiClient,
    bridge::{
        Bridge,
        ConnectionProber,
    },
    core::{
        logging::init_tracing,
        DebugLog,
    },
    persistence::SettingsStore,
    websocket::{
        ClientRegistry,
        WebSocketServer,
    },
    BridgeConfig,
    BridgeError,
};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    let config = BridgeConfig::parse();
    init_tracing(&config.log_level);

    let settings = SettingsStore::open(config.settings_path());
    let debug_log = DebugLog::attach(&settings);

    let anki = Arc::new(AnkiClient::new(config.anki_url.clone(), debug_log.clone()));
    tracing::info!("Using AnkiConnect at {}", anki.url());

    let prober = ConnectionProber::spawn(anki.clone(), settings.clone(), config.probe_interval());

    let clients = Arc::new(ClientRegistry::default());
    let bridge = Arc::new(Bridge::new(anki, settings, debug_log));

    let server = WebSocketServer::bind(config.listen, clients, bridge).await?;

    let result = tokio::select! {
        result = server.run() => result,
        signal = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            signal.map_err(BridgeError::from)
        }
    };

    prober.shutdown().await;
    result
}
