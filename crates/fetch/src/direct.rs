use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, warn};

use remnant_core::{InboundMessage, MediaContent, MessageContent};

/// Default host used to derive a URL from a relative media path.
pub const DEFAULT_MEDIA_HOST: &str = "https://mmg.whatsapp.net";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "WhatsApp/2.24.1.88 N";

/// How a message's media can be reached directly.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    Url(String),
    Thumbnail(Vec<u8>),
    None,
}

/// Fetches broadcast-channel media over plain HTTPS.
///
/// Channel media is not served through the primary fetch path. Resolution
/// order: an explicit URL field, then a URL derived from the relative media
/// path, then the embedded thumbnail as a last resort.
pub struct DirectFetcher {
    client: reqwest::Client,
    media_host: String,
}

impl DirectFetcher {
    #[must_use]
    pub fn new(media_host: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            media_host: media_host.into(),
        }
    }

    fn resolve(&self, media: &MediaContent) -> Resolution {
        if let Some(url) = &media.url {
            return Resolution::Url(url.clone());
        }
        if let Some(path) = &media.direct_path {
            return Resolution::Url(format!("{}{path}", self.media_host));
        }
        if let Some(thumbnail) = &media.thumbnail {
            return Resolution::Thumbnail(thumbnail.clone());
        }
        Resolution::None
    }

    /// Fetch the message's media directly. Failures are non-fatal.
    pub async fn fetch(&self, message: &InboundMessage) -> Option<Bytes> {
        let Some(media) = media_of(message) else {
            warn!(message = %message.id, "no media content for direct fetch");
            return None;
        };

        let url = match self.resolve(media) {
            Resolution::Url(url) => url,
            Resolution::Thumbnail(bytes) => {
                debug!(message = %message.id, "using embedded thumbnail as media");
                return Some(Bytes::from(bytes));
            }
            Resolution::None => {
                warn!(message = %message.id, "no URL, path, or thumbnail to fetch from");
                return None;
            }
        };

        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "*/*")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        match response {
            Ok(response) => match response.bytes().await {
                Ok(bytes) => {
                    debug!(message = %message.id, size = bytes.len(), "direct fetch complete");
                    Some(bytes)
                }
                Err(err) => {
                    warn!(message = %message.id, error = %err, "direct fetch body read failed");
                    None
                }
            },
            Err(err) => {
                warn!(message = %message.id, error = %err, "direct fetch failed");
                None
            }
        }
    }
}

impl Default for DirectFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIA_HOST)
    }
}

fn media_of(message: &InboundMessage) -> Option<&MediaContent> {
    match message.content.as_ref()?.unwrapped() {
        MessageContent::Image(media)
        | MessageContent::Video(media)
        | MessageContent::Audio(media) => Some(media),
        MessageContent::Sticker { media, .. } | MessageContent::Document { media, .. } => {
            Some(media)
        }
        _ => None,
    }
}
