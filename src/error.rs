//! Error types for the glucose insights application

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid reading type: {0}")]
    InvalidReadingType(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
