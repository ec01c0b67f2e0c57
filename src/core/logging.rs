use std::sync::{
    atomic::{
        AtomicBool,
        Ordering,
    },
    Arc,
};

use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::persistence::{
    SettingsStore,
    DEBUG_LOG_KEY,
};

pub fn init_tracing(log_level: &str) {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}

/// Verbose logging switch backed by the `debugLog` setting.
///
/// Clones share the same flag, so a handle given to the client or the
/// orchestrator observes toggles made through the settings store.
#[derive(Debug, Clone, Default)]
pub struct DebugLog {
    enabled: Arc<AtomicBool>,
}

impl DebugLog {
    pub fn new(enabled: bool) -> Self {
        Self { enabled: Arc::new(AtomicBool::new(enabled)) }
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Reads the current setting and keeps the flag in sync with later changes.
    pub fn attach(settings: &SettingsStore) -> Self {
        let debug_log = Self::new(settings.debug_log());
        if debug_log.enabled() {
            tracing::info!("[Debug] debugLog enabled");
        }

        let flag = debug_log.clone();
        settings.on_change(DEBUG_LOG_KEY, move |value| {
            let enabled = value.as_bool().unwrap_or(false);
            flag.set(enabled);
            tracing::info!("[Debug] debugLog {}", if enabled { "enabled" } else { "disabled" });
        });

        debug_log
    }
}
