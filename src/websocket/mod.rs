pub mod connection;
pub mod server;
pub mod types;

pub use server::WebSocketServer;
pub use types::{
    ClientAction,
    ClientRegistry,
    ServerMessage,
};
