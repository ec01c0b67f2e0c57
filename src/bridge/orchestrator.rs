use std::sync::Arc;

use super::{
    notifier::Notifier,
    types::ResultSummary,
};
use crate::{
    anki::{
        AnkiApi,
        AnkiReply,
        Note,
    },
    core::DebugLog,
    notes::AddNotesRequest,
    persistence::SettingsStore,
};

/// Runs one `addNotes` request end to end.
///
/// Every step awaits the previous one; the first failure ends the request
/// with a summary carrying its message.
pub struct Orchestrator {
    anki: Arc<dyn AnkiApi>,
    settings: SettingsStore,
    debug_log: DebugLog,
}

impl Orchestrator {
    pub fn new(anki: Arc<dyn AnkiApi>, settings: SettingsStore, debug_log: DebugLog) -> Self {
        Self { anki, settings, debug_log }
    }

    /// Adds the request's notes, shows the outcome through `notifier` and returns it for the reply.
    pub async fn handle_add_notes(
        &self,
        request: &AddNotesRequest,
        notifier: &dyn Notifier,
    ) -> ResultSummary {
        let summary = self.add_notes(request).await;
        notifier.notify(summary).await
    }

    async fn add_notes(&self, request: &AddNotesRequest) -> ResultSummary {
        // Cached by the prober; never probed here.
        if !self.settings.connection_status().ok {
            return ResultSummary::unreachable();
        }

        let notes = request.build_notes();
        if self.debug_log.enabled() {
            tracing::info!(
                "[Babbel2Anki] Prepared notes: {} (deck: {}, model: {}, tags: {:?})",
                notes.len(),
                request.deck_name,
                request.model_name,
                request.tag_string
            );
        }

        if let Err(error) =
            ensure_created("createDeck", self.anki.create_deck(&request.deck_name).await)
        {
            return ResultSummary::failed(notes.len(), 0, error);
        }
        if let Err(error) =
            ensure_created("createModel", self.anki.create_model(&request.model_name).await)
        {
            return ResultSummary::failed(notes.len(), 0, error);
        }

        let mask = match self.anki.can_add_notes(&notes).await {
            AnkiReply::Ok(mask) => mask,
            AnkiReply::Schema(error) | AnkiReply::Transport(error) => {
                if self.debug_log.enabled() {
                    tracing::warn!("[AnkiConnect] Unexpected canAddNotes response: {}", error);
                }
                return ResultSummary::failed(notes.len(), 0, error);
            }
        };

        let total = notes.len();
        let (to_add, duplicates) = filter_addable(notes, &mask);
        if self.debug_log.enabled() {
            tracing::info!(
                "[Babbel2Anki] Filtered notes: total {}, to add {}, duplicates {}",
                total,
                to_add.len(),
                duplicates
            );
        }

        if to_add.is_empty() {
            return ResultSummary::nothing_new(total, duplicates);
        }

        match self.anki.add_notes(&to_add).await {
            AnkiReply::Ok(added) => ResultSummary::added(added.ids, total, duplicates, added.error),
            AnkiReply::Schema(error) | AnkiReply::Transport(error) => {
                if self.debug_log.enabled() {
                    tracing::warn!("[AnkiConnect] Unexpected addNotes response: {}", error);
                }
                ResultSummary::failed(total, duplicates, error)
            }
        }
    }
}

/// Remote errors such as "already exists" are logged and tolerated.
fn ensure_created(action: &str, reply: AnkiReply<()>) -> Result<(), String> {
    match reply {
        AnkiReply::Ok(()) => Ok(()),
        AnkiReply::Schema(error) => {
            tracing::warn!("[AnkiConnect] {}: {}", action, error);
            Ok(())
        }
        AnkiReply::Transport(error) => Err(error),
    }
}

/// Keeps notes whose mask entry is `true`; returns them with the count of rejected ones.
pub fn filter_addable(notes: Vec<Note>, mask: &[bool]) -> (Vec<Note>, usize) {
    let duplicates = mask.iter().filter(|&&addable| !addable).count();
    let to_add = notes
        .into_iter()
        .zip(mask.iter())
        .filter_map(|(note, &addable)| addable.then_some(note))
        .collect();
    (to_add, duplicates)
}
