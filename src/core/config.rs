use std::{
    net::SocketAddr,
    path::PathBuf,
    time::Duration,
};

use clap::Parser;

use crate::persistence::get_data_file_path;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8766";
pub const DEFAULT_ANKI_URL: &str = "http://127.0.0.1:8765";
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 10;
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "babbel2anki",
    version,
    about = "Bridges learned Babbel vocabulary from the browser extension into Anki via AnkiConnect"
)]
pub struct BridgeConfig {
    /// Address the extension connects to over WebSocket
    #[arg(long, env = "BABBEL2ANKI_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: SocketAddr,

    /// AnkiConnect endpoint
    #[arg(long, env = "BABBEL2ANKI_ANKI_URL", default_value = DEFAULT_ANKI_URL)]
    pub anki_url: String,

    /// Settings file (default: <data dir>/babbel2anki/settings.json)
    #[arg(long = "settings", env = "BABBEL2ANKI_SETTINGS")]
    pub settings_path: Option<PathBuf>,

    /// Seconds between AnkiConnect connectivity probes
    #[arg(long, env = "BABBEL2ANKI_PROBE_INTERVAL", default_value_t = DEFAULT_PROBE_INTERVAL_SECS)]
    pub probe_interval: u64,

    /// Log filter, e.g. "info" or "babbel2anki=debug"
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl BridgeConfig {
    pub fn settings_path(&self) -> PathBuf {
        self.settings_path.clone().unwrap_or_else(|| get_data_file_path(SETTINGS_FILE))
    }

    pub fn probe_interval(&self) -> Duration {
        // A zero interval would make tokio's interval panic.
        Duration::from_secs(self.probe_interval.max(1))
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN_ADDR.parse().unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8766))),
            anki_url: DEFAULT_ANKI_URL.to_string(),
            settings_path: None,
            probe_interval: DEFAULT_PROBE_INTERVAL_SECS,
            log_level: "info".to_string(),
        }
    }
}
