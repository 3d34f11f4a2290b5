use thiserror::Error;

/// Errors produced while fetching media bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The attempt exceeded its network timeout.
    #[error("fetch timed out")]
    Timeout,

    /// Transport-level failure (connection reset, DNS, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The media host answered with a non-success status.
    #[error("unexpected status: {0}")]
    Status(u16),

    /// No fetch capability was available at startup.
    #[error("media fetching is unavailable")]
    Unavailable,
}

impl FetchError {
    /// Whether a retry could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) => true,
            Self::Status(code) => *code >= 500,
            Self::Unavailable => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::Transport("reset".into()).is_retryable());
        assert!(FetchError::Status(503).is_retryable());
        assert!(!FetchError::Status(404).is_retryable());
        assert!(!FetchError::Unavailable.is_retryable());
    }
}
