use thiserror::Error;

/// Top-level error type for the Remnant system.
#[derive(Debug, Error)]
pub enum RemnantError {
    #[error("archive error: {0}")]
    Archive(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("pipeline error: {0}")]
    Pipeline(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for RemnantError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
