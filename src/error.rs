// File: src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("encode error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// The engine was built without a persistence handle.
    #[error("a persistence port is required to construct the engine")]
    MissingStorage,
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
