use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
    sync::Arc,
};

use parking_lot::{
    Mutex,
    RwLock,
};
use serde::{
    de::DeserializeOwned,
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};

use crate::core::BridgeError;

const APP_NAME: &str = "babbel2anki";

pub const DEBUG_LOG_KEY: &str = "debugLog";
pub const CONNECTION_STATUS_KEY: &str = "ankiConnectionStatus";

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        data_dir.join(APP_NAME)
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

/// Last known AnkiConnect reachability, written by the prober.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl ConnectionStatus {
    pub fn now(ok: bool) -> Self {
        Self { ok, date: Some(chrono::Utc::now().to_rfc3339()) }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self { ok: false, date: None }
    }
}

type ChangeCallback = Box<dyn Fn(&Value) + Send + Sync>;

struct Inner {
    path: Option<PathBuf>,
    values: Mutex<Map<String, Value>>,
    callbacks: RwLock<Vec<(String, ChangeCallback)>>,
    // Held across snapshot and write so an older snapshot never lands last.
    write_lock: Mutex<()>,
}

/// Key/value settings persisted as a single JSON object.
///
/// Cheap to clone; all clones share the same values and subscriptions.
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<Inner>,
}

impl SettingsStore {
    /// Loads the settings file, falling back to an empty store if it is missing or unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match load_object(&path) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("Failed to load {}: {}. Using defaults.", path.display(), e);
                Map::new()
            }
        };

        Self::with_values(Some(path), values)
    }

    pub fn in_memory() -> Self {
        Self::with_values(None, Map::new())
    }

    fn with_values(path: Option<PathBuf>, values: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path,
                values: Mutex::new(values),
                callbacks: RwLock::new(Vec::new()),
                write_lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn get_raw(&self, key: &str) -> Option<Value> {
        self.inner.values.lock().get(key).filter(|v| !v.is_null()).cloned()
    }

    /// Returns the stored value, first writing `default` when the key is absent or null.
    pub fn get_or_init(&self, key: &str, default: Value) -> Value {
        {
            let mut values = self.inner.values.lock();
            match values.get(key) {
                Some(value) if !value.is_null() => return value.clone(),
                _ => {
                    values.insert(key.to_string(), default.clone());
                }
            }
        }

        tracing::info!("initiated property {} with value {}", key, default);
        self.persist();
        default
    }

    /// Typed `get_or_init`; a stored value of the wrong shape yields `default`.
    pub fn get<T>(&self, key: &str, default: T) -> T
    where
        T: Serialize + DeserializeOwned,
    {
        let default_value = match serde_json::to_value(&default) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Cannot serialize default for {}: {}", key, e);
                return default;
            }
        };

        match serde_json::from_value(self.get_or_init(key, default_value)) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Stored value for {} has unexpected shape: {}", key, e);
                default
            }
        }
    }

    /// Stores `value` and notifies subscribers of `key` if it changed.
    pub fn set(&self, key: &str, value: Value) {
        self.store(key, value, true);
    }

    fn store(&self, key: &str, value: Value, persist: bool) {
        let changed = {
            let mut values = self.inner.values.lock();
            let changed = values.get(key) != Some(&value);
            values.insert(key.to_string(), value.clone());
            changed
        };

        if !changed {
            return;
        }

        if persist {
            self.persist();
        }

        let callbacks = self.inner.callbacks.read();
        for (_, callback) in callbacks.iter().filter(|(k, _)| k == key) {
            callback(&value);
        }
    }

    pub fn on_change<F>(&self, key: &str, callback: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.callbacks.write().push((key.to_string(), Box::new(callback)));
    }

    pub fn debug_log(&self) -> bool {
        self.get(DEBUG_LOG_KEY, false)
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.get(CONNECTION_STATUS_KEY, ConnectionStatus::default())
    }

    /// Records a probe result. The file is only rewritten when reachability flips;
    /// a fresher date alone stays in memory.
    pub fn set_connection_status(&self, status: &ConnectionStatus) {
        let flipped = self
            .get_raw(CONNECTION_STATUS_KEY)
            .and_then(|v| serde_json::from_value::<ConnectionStatus>(v).ok())
            .map_or(true, |previous| previous.ok != status.ok);

        match serde_json::to_value(status) {
            Ok(value) => self.store(CONNECTION_STATUS_KEY, value, flipped),
            Err(e) => tracing::warn!("Cannot serialize connection status: {}", e),
        }
    }

    fn persist(&self) {
        let Some(path) = &self.inner.path else {
            return;
        };

        let _guard = self.inner.write_lock.lock();
        let snapshot = Value::Object(self.inner.values.lock().clone());
        if let Err(e) = save_value(&snapshot, path) {
            tracing::warn!("Failed to save settings to {}: {}", path.display(), e);
        }
    }
}

fn load_object(path: &Path) -> Result<Map<String, Value>, BridgeError> {
    if !path.exists() {
        return Ok(Map::new());
    }

    let json = fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&json)? {
        Value::Object(values) => {
            tracing::debug!("Settings loaded from: {}", path.display());
            Ok(values)
        }
        other => Err(BridgeError::Settings(format!("expected a JSON object, found {}", other))),
    }
}

fn save_value(value: &Value, path: &Path) -> Result<(), BridgeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
