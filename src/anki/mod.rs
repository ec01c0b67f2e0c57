pub mod api;
pub mod model;
pub mod types;

pub use api::{
    AnkiApi,
    AnkiClient,
};
pub use types::{
    AddedNotes,
    AnkiReply,
    ApiResponse,
    AudioRef,
    Note,
    NoteFields,
    NoteOptions,
};
