//! Room host errors

use thiserror::Error;
use ultimatum_logic::ConfigError;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("invalid settings: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to write record: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}
