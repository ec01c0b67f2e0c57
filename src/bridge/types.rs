use serde::{
    Deserialize,
    Serialize,
};

pub const UNREACHABLE_ERROR: &str = "Anki is not reachable";

/// Outcome of one `addNotes` request, sent back to the page as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_ids: Option<Vec<Option<u64>>>,
    pub added_notes: i64,
    pub total_notes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<i64>,
    pub error: Option<String>,
}

impl ResultSummary {
    /// AnkiConnect was down at the last probe; nothing was attempted.
    pub fn unreachable() -> Self {
        Self {
            notes_ids: None,
            added_notes: -1,
            total_notes: -1,
            duplicates: None,
            error: Some(UNREACHABLE_ERROR.to_string()),
        }
    }

    pub fn failed(total_notes: usize, duplicates: usize, error: impl Into<String>) -> Self {
        Self {
            notes_ids: Some(Vec::new()),
            added_notes: 0,
            total_notes: total_notes as i64,
            duplicates: Some(duplicates as i64),
            error: Some(error.into()),
        }
    }

    pub fn nothing_new(total_notes: usize, duplicates: usize) -> Self {
        Self {
            notes_ids: Some(Vec::new()),
            added_notes: 0,
            total_notes: total_notes as i64,
            duplicates: Some(duplicates as i64),
            error: None,
        }
    }

    pub fn added(
        notes_ids: Vec<Option<u64>>,
        total_notes: usize,
        duplicates: usize,
        error: Option<String>,
    ) -> Self {
        let added_notes = notes_ids.iter().filter(|id| id.is_some()).count() as i64;
        Self {
            notes_ids: Some(notes_ids),
            added_notes,
            total_notes: total_notes as i64,
            duplicates: Some(duplicates as i64),
            error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }
}
