use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::timeout;
use tracing::{debug, warn};

use remnant_core::{EventSink, InboundMessage, PipelineEvent};

use crate::error::FetchError;
use crate::fetcher::MediaFetcher;

/// Network timeout applied to each individual attempt.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay before retrying the given one-based attempt: `2^attempt` seconds.
fn delay_for(attempt: u32) -> Duration {
    Duration::from_secs(1_u64 << attempt.min(10))
}

/// Wraps a [`MediaFetcher`] with bounded retries and exponential backoff.
///
/// Exhausting all attempts is non-fatal: a `DownloadFailed` event is
/// emitted once and the fetch resolves to `None`, so the message is still
/// archived without its media.
pub struct RetryDownloader {
    fetcher: Arc<dyn MediaFetcher>,
    sink: Arc<dyn EventSink>,
}

impl RetryDownloader {
    #[must_use]
    pub fn new(fetcher: Arc<dyn MediaFetcher>, sink: Arc<dyn EventSink>) -> Self {
        Self { fetcher, sink }
    }

    /// Fetch a message's media, attempting up to `max_attempts` times.
    pub async fn fetch(&self, message: &InboundMessage, max_attempts: u32) -> Option<Bytes> {
        let mut last_error = String::new();
        let mut attempts = 0;

        for attempt in 1..=max_attempts {
            attempts = attempt;
            let result = match timeout(ATTEMPT_TIMEOUT, self.fetcher.fetch(message)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout),
            };

            match result {
                Ok(bytes) => {
                    debug!(message = %message.id, attempt, "media fetched");
                    return Some(bytes);
                }
                Err(FetchError::Unavailable) => {
                    // Capability is permanently absent, already logged once.
                    return None;
                }
                Err(err) => {
                    warn!(message = %message.id, attempt, error = %err, "media fetch failed");
                    last_error = err.to_string();
                    if !err.is_retryable() {
                        break;
                    }
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(delay_for(attempt)).await;
            }
        }

        self.sink.emit(PipelineEvent::DownloadFailed {
            message: message.id.clone(),
            attempts,
            reason: last_error,
        });
        None
    }
}
