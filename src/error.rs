//! Error handling for the zone gap analyzer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZoneGapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Model loading error: {0}")]
    ModelLoading(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Degenerate embedding: {0} has zero norm")]
    DegenerateEmbedding(String),

    #[error("Embedding dimensions don't match: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ZoneGapError>;

/// Model2Vec reports load failures through anyhow
impl From<anyhow::Error> for ZoneGapError {
    fn from(err: anyhow::Error) -> Self {
        ZoneGapError::ModelLoading(err.to_string())
    }
}
