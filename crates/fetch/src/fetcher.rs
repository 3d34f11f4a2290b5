use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use remnant_core::InboundMessage;

use crate::error::FetchError;

/// Host-supplied capability that resolves a message's media bytes.
///
/// The protocol adapter owns the actual download machinery; the pipeline
/// only sees this trait. Implementations should make a single attempt per
/// call; retries are layered on by [`RetryDownloader`].
///
/// [`RetryDownloader`]: crate::retry::RetryDownloader
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, message: &InboundMessage) -> Result<Bytes, FetchError>;
}

/// Stand-in used when no fetch capability exists at startup.
///
/// Logs once at construction; every fetch fails with
/// [`FetchError::Unavailable`], which is not retried.
#[derive(Debug, Clone, Copy)]
pub struct DisabledFetcher;

impl DisabledFetcher {
    #[must_use]
    pub fn new() -> Self {
        warn!("no media fetch capability available, downloads are disabled");
        Self
    }
}

impl Default for DisabledFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetcher for DisabledFetcher {
    async fn fetch(&self, _message: &InboundMessage) -> Result<Bytes, FetchError> {
        Err(FetchError::Unavailable)
    }
}
