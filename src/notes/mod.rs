//! Turns learned items sent by the page into AnkiConnect notes.

use serde::{
    Deserialize,
    Serialize,
};

use crate::anki::{
    model::FIELD_PRONUNCIATION,
    AudioRef,
    Note,
    NoteFields,
    NoteOptions,
};

const IMAGE_URL_BASE: &str = "https://images.babbel.com/v1.0.0/images";
const SOUND_URL_BASE: &str = "https://sounds.babbel.com/v1.0.0/sounds";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnedItem {
    pub learn_language_text: String,
    pub display_language_text: String,
    #[serde(default)]
    pub image: Option<MediaRef>,
    #[serde(default)]
    pub sound: Option<MediaRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNotesRequest {
    pub deck_name: String,
    pub model_name: String,
    #[serde(default)]
    pub tag_string: String,
    #[serde(default)]
    pub learned_items: Vec<LearnedItem>,
}

pub fn image_url(id: &str) -> String {
    format!("{}/{}/variations/square/resolutions/500x500.png", IMAGE_URL_BASE, id)
}

pub fn sound_url(id: &str) -> String {
    format!("{}/{}/normal.mp3", SOUND_URL_BASE, id)
}

/// Comma separated, trimmed. An empty string means no tags.
pub fn parse_tags(tag_string: &str) -> Vec<String> {
    if tag_string.is_empty() {
        return Vec::new();
    }
    tag_string.split(',').map(|tag| tag.trim().to_string()).collect()
}

fn media_id(media: &Option<MediaRef>) -> Option<&str> {
    media.as_ref().map(|m| m.id.as_str()).filter(|id| !id.is_empty())
}

fn picture_field(item: &LearnedItem) -> String {
    match media_id(&item.image) {
        Some(id) => format!("<img src='{}'/>", image_url(id)),
        None => String::new(),
    }
}

fn pronunciation_audio(item: &LearnedItem) -> Vec<AudioRef> {
    match media_id(&item.sound) {
        Some(id) => vec![AudioRef {
            url: sound_url(id),
            filename: format!("{}.mp3", id),
            fields: vec![FIELD_PRONUNCIATION.to_string()],
        }],
        None => Vec::new(),
    }
}

pub fn build_note(deck_name: &str, model_name: &str, tags: &[String], item: &LearnedItem) -> Note {
    Note {
        deck_name: deck_name.to_string(),
        model_name: model_name.to_string(),
        fields: NoteFields {
            word: item.learn_language_text.clone(),
            picture: picture_field(item),
            extra_info: item.display_language_text.clone(),
        },
        options: NoteOptions::default(),
        tags: tags.to_vec(),
        audio: pronunciation_audio(item),
    }
}

pub fn build_notes(
    deck_name: &str,
    model_name: &str,
    tag_string: &str,
    learned_items: &[LearnedItem],
) -> Vec<Note> {
    let tags = parse_tags(tag_string);
    learned_items.iter().map(|item| build_note(deck_name, model_name, &tags, item)).collect()
}

impl AddNotesRequest {
    pub fn build_notes(&self) -> Vec<Note> {
        build_notes(&self.deck_name, &self.model_name, &self.tag_string, &self.learned_items)
    }
}
