use serde::{
    de::DeserializeOwned,
    Deserialize,
    Serialize,
};
use serde_json::Value;

/// Raw `{result, error}` envelope every AnkiConnect action answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn failed(error: impl Into<String>) -> Self {
        Self { result: None, error: Some(error.into()) }
    }
}

/// A reply after boundary validation.
#[derive(Debug, Clone, PartialEq)]
pub enum AnkiReply<T> {
    Ok(T),
    /// AnkiConnect answered, but not with the shape the action promises.
    Schema(String),
    /// AnkiConnect could not be reached or the exchange broke off.
    Transport(String),
}

impl<T> AnkiReply<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, AnkiReply::Ok(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            AnkiReply::Ok(_) => None,
            AnkiReply::Schema(message) | AnkiReply::Transport(message) => Some(message),
        }
    }
}

impl ApiResponse<Value> {
    /// Validates `result` as `T`, keeping the remote error text when there is one.
    pub fn into_reply<T: DeserializeOwned>(self, action: &str) -> AnkiReply<T> {
        let unexpected = || {
            self.error.clone().unwrap_or_else(|| format!("Unexpected {} response", action))
        };

        match self.result.clone() {
            Some(result) => match serde_json::from_value::<T>(result) {
                Ok(value) => AnkiReply::Ok(value),
                Err(_) => AnkiReply::Schema(unexpected()),
            },
            None => AnkiReply::Schema(unexpected()),
        }
    }

    /// For actions whose result carries nothing we need; only the error matters.
    pub fn into_ack(self) -> AnkiReply<()> {
        match self.error {
            Some(error) => AnkiReply::Schema(error),
            None => AnkiReply::Ok(()),
        }
    }
}

/// Result of `addNotes`: one id per submitted note, `None` where insertion failed.
#[derive(Debug, Clone, PartialEq)]
pub struct AddedNotes {
    pub ids: Vec<Option<u64>>,
    pub error: Option<String>,
}

impl AddedNotes {
    pub fn added(&self) -> usize {
        self.ids.iter().filter(|id| id.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteFields {
    #[serde(rename = "Word")]
    pub word: String,
    #[serde(rename = "Picture")]
    pub picture: String,
    #[serde(rename = "Extra Info")]
    pub extra_info: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteOptions {
    pub allow_duplicate: bool,
    pub duplicate_scope: String,
}

impl Default for NoteOptions {
    fn default() -> Self {
        Self { allow_duplicate: false, duplicate_scope: "deck".to_string() }
    }
}

/// Media AnkiConnect downloads and attaches to the listed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRef {
    pub url: String,
    pub filename: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub deck_name: String,
    pub model_name: String,
    pub fields: NoteFields,
    pub options: NoteOptions,
    pub tags: Vec<String>,
    pub audio: Vec<AudioRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardTemplate {
    #[serde(rename = "Name")]
    pub name: &'static str,
    #[serde(rename = "Front")]
    pub front: &'static str,
    #[serde(rename = "Back")]
    pub back: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinition {
    pub model_name: String,
    pub in_order_fields: Vec<&'static str>,
    pub css: &'static str,
    pub card_templates: Vec<CardTemplate>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(value: Value) -> ApiResponse<Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_into_reply_accepts_expected_shape() {
        let reply: AnkiReply<Vec<bool>> =
            response(json!({ "result": [true, false], "error": null })).into_reply("canAddNotes");
        assert_eq!(reply, AnkiReply::Ok(vec![true, false]));
    }

    #[test]
    fn test_into_reply_rejects_wrong_shape() {
        let reply: AnkiReply<Vec<bool>> =
            response(json!({ "result": "oops" })).into_reply("canAddNotes");
        assert_eq!(reply, AnkiReply::Schema("Unexpected canAddNotes response".into()));

        let reply: AnkiReply<Vec<bool>> =
            response(json!({ "result": null, "error": "collection is not available" }))
                .into_reply("canAddNotes");
        assert_eq!(reply.error_message(), Some("collection is not available"));
    }

    #[test]
    fn test_into_ack() {
        assert!(response(json!({ "result": 1651445861967u64, "error": null })).into_ack().is_ok());
        assert_eq!(
            response(json!({ "result": null, "error": "Model name already exists" })).into_ack(),
            AnkiReply::Schema("Model name already exists".into())
        );
    }

    #[test]
    fn test_note_serializes_to_anki_schema() {
        let note = Note {
            deck_name: "Babbel".into(),
            model_name: "Babbel Word".into(),
            fields: NoteFields {
                word: "la casa".into(),
                picture: String::new(),
                extra_info: "the house".into(),
            },
            options: NoteOptions::default(),
            tags: vec!["babbel".into()],
            audio: vec![],
        };

        assert_eq!(
            serde_json::to_value(&note).unwrap(),
            json!({
                "deckName": "Babbel",
                "modelName": "Babbel Word",
                "fields": { "Word": "la casa", "Picture": "", "Extra Info": "the house" },
                "options": { "allowDuplicate": false, "duplicateScope": "deck" },
                "tags": ["babbel"],
                "audio": []
            })
        );
    }

    #[test]
    fn test_added_notes_counts_non_null() {
        let added = AddedNotes { ids: vec![Some(101), None, Some(102)], error: None };
        assert_eq!(added.added(), 2);
    }
}
