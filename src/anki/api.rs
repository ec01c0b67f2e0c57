use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{
    json,
    Value,
};

use super::{
    model::learned_word_model,
    types::{
        AddedNotes,
        AnkiReply,
        ApiResponse,
        Note,
    },
};
use crate::core::{
    BridgeError,
    DebugLog,
};

pub const ANKI_CONNECT_VERSION: u32 = 6;

/// The AnkiConnect actions the bridge relies on.
#[async_trait]
pub trait AnkiApi: Send + Sync {
    /// Cheap reachability probe.
    async fn version(&self) -> Result<u32, BridgeError>;

    async fn create_deck(&self, deck: &str) -> AnkiReply<()>;

    async fn create_model(&self, model_name: &str) -> AnkiReply<()>;

    /// One flag per note, `true` when AnkiConnect would accept it.
    async fn can_add_notes(&self, notes: &[Note]) -> AnkiReply<Vec<bool>>;

    async fn add_notes(&self, notes: &[Note]) -> AnkiReply<AddedNotes>;
}

#[derive(Debug, Serialize)]
struct RequestBody<'a> {
    action: &'a str,
    version: u32,
    params: Value,
}

#[derive(Clone)]
pub struct AnkiClient {
    client: Client,
    url: String,
    debug_log: DebugLog,
}

impl AnkiClient {
    pub fn new(url: impl Into<String>, debug_log: DebugLog) -> Self {
        // AnkiConnect is always local; never route it through a system proxy.
        let client = Client::builder().no_proxy().build().unwrap_or_else(|_| Client::new());
        Self { client, url: url.into(), debug_log }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Posts `{action, version, params}`.
    ///
    /// A body that is not JSON becomes `{result: null, error}` instead of an
    /// `Err`; only failing to reach AnkiConnect at all is an error.
    pub async fn call(&self, action: &str, params: Value) -> Result<ApiResponse<Value>, BridgeError> {
        let body = RequestBody { action, version: ANKI_CONNECT_VERSION, params };
        if self.debug_log.enabled() {
            tracing::info!("[AnkiConnect] Request: {}", serde_json::to_string(&body)?);
        }

        let text = self.client.post(&self.url).json(&body).send().await?.text().await?;

        let data = match serde_json::from_str::<ApiResponse<Value>>(&text) {
            Ok(data) => data,
            Err(e) => ApiResponse::failed(format!("Invalid JSON from AnkiConnect: {}", e)),
        };

        if self.debug_log.enabled() {
            tracing::info!("[AnkiConnect] Response: {:?}", data);
        }
        Ok(data)
    }

    /// `call`, with a transport failure turned into its user-facing message.
    async fn exchange(&self, action: &str, params: Value) -> Result<ApiResponse<Value>, String> {
        self.call(action, params).await.map_err(|e| {
            tracing::warn!("[AnkiConnect] {} failed: {}", action, e);
            format!("Failed to reach AnkiConnect: {}", e)
        })
    }
}

fn check_len<T>(action: &str, items: Vec<T>, expected: usize) -> AnkiReply<Vec<T>> {
    if items.len() == expected {
        AnkiReply::Ok(items)
    } else {
        AnkiReply::Schema(format!(
            "Unexpected {} response: expected {} entries, got {}",
            action,
            expected,
            items.len()
        ))
    }
}

#[async_trait]
impl AnkiApi for AnkiClient {
    async fn version(&self) -> Result<u32, BridgeError> {
        let body = json!({ "action": "version", "version": ANKI_CONNECT_VERSION });
        let response = self.client.post(&self.url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::HttpStatus(status.as_u16()));
        }

        let response: ApiResponse<u32> = response.json().await?;
        match (response.result, response.error) {
            (Some(version), _) => Ok(version),
            (None, Some(error)) => Err(BridgeError::Custom(error)),
            (None, None) => Err(BridgeError::Custom("AnkiConnect sent no version".to_string())),
        }
    }

    async fn create_deck(&self, deck: &str) -> AnkiReply<()> {
        match self.exchange("createDeck", json!({ "deck": deck })).await {
            Ok(response) => response.into_ack(),
            Err(message) => AnkiReply::Transport(message),
        }
    }

    async fn create_model(&self, model_name: &str) -> AnkiReply<()> {
        let params = match serde_json::to_value(learned_word_model(model_name)) {
            Ok(params) => params,
            Err(e) => return AnkiReply::Schema(format!("Cannot encode model: {}", e)),
        };

        match self.exchange("createModel", params).await {
            Ok(response) => response.into_ack(),
            Err(message) => AnkiReply::Transport(message),
        }
    }

    async fn can_add_notes(&self, notes: &[Note]) -> AnkiReply<Vec<bool>> {
        let response = match self.exchange("canAddNotes", json!({ "notes": notes })).await {
            Ok(response) => response,
            Err(message) => return AnkiReply::Transport(message),
        };

        match response.into_reply::<Vec<bool>>("canAddNotes") {
            AnkiReply::Ok(mask) => check_len("canAddNotes", mask, notes.len()),
            AnkiReply::Schema(message) => AnkiReply::Schema(message),
            AnkiReply::Transport(message) => AnkiReply::Transport(message),
        }
    }

    async fn add_notes(&self, notes: &[Note]) -> AnkiReply<AddedNotes> {
        let response = match self.exchange("addNotes", json!({ "notes": notes })).await {
            Ok(response) => response,
            Err(message) => return AnkiReply::Transport(message),
        };

        let error = response.error.clone();
        match response.into_reply::<Vec<Option<u64>>>("addNotes") {
            AnkiReply::Ok(ids) => match check_len("addNotes", ids, notes.len()) {
                AnkiReply::Ok(ids) => AnkiReply::Ok(AddedNotes { ids, error }),
                AnkiReply::Schema(message) => AnkiReply::Schema(message),
                AnkiReply::Transport(message) => AnkiReply::Transport(message),
            },
            AnkiReply::Schema(_) => AnkiReply::Schema(
                error.unwrap_or_else(|| "Unexpected AnkiConnect response".to_string()),
            ),
            AnkiReply::Transport(message) => AnkiReply::Transport(message),
        }
    }
}
