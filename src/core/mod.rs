pub mod config;
pub mod errors;
pub mod logging;

pub use config::BridgeConfig;
pub use errors::BridgeError;
pub use logging::DebugLog;
