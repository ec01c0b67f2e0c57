pub mod anki;
pub mod bridge;
pub mod core;
pub mod notes;
pub mod persistence;
pub mod websocket;

pub use crate::core::{
    BridgeConfig,
    BridgeError,
};
