//! Error types for plate-checker

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid plate: {0}")]
    InvalidPlate(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("No plate numbers provided")]
    NoPlates,
}

pub type Result<T> = std::result::Result<T, Error>;
