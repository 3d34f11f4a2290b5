use thiserror::Error;

/// Errors produced by the archive layer.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Failed to open or connect to the database.
    #[error("connection error: {0}")]
    Connection(String),

    /// A query or transaction failed. The enclosing transaction, if any,
    /// has been rolled back.
    #[error("backend error: {0}")]
    Backend(String),

    /// A stored value could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for ArchiveError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}
