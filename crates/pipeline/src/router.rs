use std::sync::Arc;

use bytes::Bytes;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use remnant_archive::{AddOutcome, Archive, ArchiveError};
use remnant_core::message::{InboundMessage, MessageContent};
use remnant_core::record::{DeletionContext, MessageKind, NewMessage, RecoveredContent};
use remnant_core::{
    ChatId, EventSink, MessageId, NullSink, PipelineEvent, RemnantError, UserId, classify,
    extract_preview, is_media_capable,
};
use remnant_fetch::{DirectFetcher, DisabledFetcher, MediaFetcher, RetryDownloader};
use remnant_state::{MessageCache, RateLimiter};

use crate::analyzer::BehaviorAnalyzer;
use crate::config::{RouterConfig, is_valid_monitor_id};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::notify::NotificationBuilder;
use crate::sweeper::RetentionSweeper;

/// An event handed to the pipeline by the protocol adapter.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// A message arrived and should be archived.
    New(InboundMessage),
    /// A previously delivered message was deleted.
    Deleted {
        chat: ChatId,
        user: UserId,
        message: MessageId,
        context: DeletionContext,
    },
    /// A message was edited; the new revision is re-archived.
    Edited(InboundMessage),
    /// A view-once message was opened; archived like a new message.
    ViewOnce(InboundMessage),
}

impl InboundEvent {
    fn key(&self) -> (&ChatId, &UserId) {
        match self {
            Self::New(m) | Self::Edited(m) | Self::ViewOnce(m) => (&m.chat, &m.sender),
            Self::Deleted { chat, user, .. } => (chat, user),
        }
    }
}

/// Why an event was turned away before any handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The (chat, user) pair exhausted its admission window.
    RateLimited,
    /// The pipeline was disabled at startup by an invalid monitor id.
    Disabled,
}

/// What processing an event came to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The message was classified and written to the archive.
    Archived { kind: MessageKind },
    /// The message classified as unsupported and was not archived.
    Discarded,
    /// A deletion was matched to archived content and a notification
    /// was delivered.
    Recovered,
    /// A deletion referenced content the pipeline never saw.
    NotFound,
    /// Identical content from the same user and second already exists
    /// under a different id.
    Duplicate,
    Rejected(RejectReason),
    /// A handler failed; contained at the router boundary.
    Failed { error: String },
}

/// The pipeline's entry point. Gates every event through the rate
/// limiter, dispatches by kind, and contains handler failures so a bad
/// event can never take the stream down.
pub struct EventRouter {
    config: RouterConfig,
    enabled: bool,
    limiter: Arc<RateLimiter>,
    cache: Arc<MessageCache>,
    archive: Arc<Archive>,
    downloader: RetryDownloader,
    direct: DirectFetcher,
    analyzer: BehaviorAnalyzer,
    notifier: NotificationBuilder,
    sink: Arc<dyn EventSink>,
    metrics: Arc<PipelineMetrics>,
    audit_tasks: TaskTracker,
}

impl EventRouter {
    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Whether the pipeline accepted its monitored destination at startup.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current counters plus live cache and limiter sizes.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.cache.len(), self.limiter.len())
    }

    /// Build the periodic maintenance task sharing this router's state.
    /// The sweeper runs until a shutdown signal is sent on the returned
    /// channel.
    #[must_use]
    pub fn retention_sweeper(&self) -> (RetentionSweeper, tokio::sync::mpsc::Sender<()>) {
        RetentionSweeper::new(
            Arc::clone(&self.archive),
            Arc::clone(&self.cache),
            Arc::clone(&self.limiter),
            Arc::clone(&self.metrics),
            self.config.retention,
            self.config.sweep_interval,
        )
    }

    /// Wait for outstanding audit writes to land. Call once when the
    /// pipeline is being shut down; no further events should be processed
    /// afterwards.
    pub async fn shutdown(&self) {
        self.audit_tasks.close();
        self.audit_tasks.wait().await;
    }

    /// Process one inbound event to completion.
    pub async fn process(&self, event: InboundEvent) -> EventOutcome {
        if !self.enabled {
            return EventOutcome::Rejected(RejectReason::Disabled);
        }

        let (chat, user) = event.key();
        if !self.limiter.admit(chat, user) {
            self.metrics.increment_rate_limited();
            return EventOutcome::Rejected(RejectReason::RateLimited);
        }
        self.metrics.increment_dispatched();

        let (stage, result) = match event {
            InboundEvent::New(message)
            | InboundEvent::Edited(message)
            | InboundEvent::ViewOnce(message) => ("ingest", self.handle_new(&message).await),
            InboundEvent::Deleted {
                chat,
                user,
                message,
                context,
            } => (
                "recover",
                self.handle_deleted(&chat, &user, &message, &context).await,
            ),
        };

        match result {
            Ok(outcome) => outcome,
            Err(error) => {
                self.metrics.increment_failed();
                warn!(stage, %error, "event handler failed");
                self.sink.emit(PipelineEvent::ProcessingError {
                    stage: stage.to_owned(),
                    reason: error.to_string(),
                });
                EventOutcome::Failed {
                    error: error.to_string(),
                }
            }
        }
    }

    async fn handle_new(&self, message: &InboundMessage) -> Result<EventOutcome, RemnantError> {
        let classification = classify(message);
        if classification.status == -1 {
            debug!(id = %message.id, "unsupported message discarded");
            self.metrics.increment_discarded();
            return Ok(EventOutcome::Discarded);
        }

        let media = self.acquire_media(message).await;
        let attrs = media_attrs(message);

        let record = NewMessage {
            id: message.id.clone(),
            user: message.sender.clone(),
            chat: message.chat.clone(),
            timestamp: message.timestamp,
            body: extract_preview(message),
            kind: classification.kind,
            ephemeral: message.is_ephemeral(),
            mimetype: attrs.mimetype,
            width: attrs.width,
            height: attrs.height,
            duration_secs: attrs.duration_secs,
            file_length: attrs.file_length,
            thumbnail: attrs.thumbnail,
            media,
        };

        match self.archive.add(&record).await.map_err(archive_error)? {
            AddOutcome::DuplicateContent { hash } => {
                debug!(id = %record.id, hash, "duplicate content skipped");
                self.metrics.increment_duplicates();
                Ok(EventOutcome::Duplicate)
            }
            AddOutcome::Stored { .. } | AddOutcome::Replaced { .. } => {
                self.cache.put(record);
                self.metrics.increment_archived();
                Ok(EventOutcome::Archived {
                    kind: classification.kind,
                })
            }
        }
    }

    async fn handle_deleted(
        &self,
        chat: &ChatId,
        user: &UserId,
        message: &MessageId,
        context: &DeletionContext,
    ) -> Result<EventOutcome, RemnantError> {
        let content = match self.cache.get(message) {
            Some(cached) => Some(RecoveredContent::from(cached)),
            None => self
                .archive
                .lookup(user, message)
                .await
                .map_err(archive_error)?,
        };
        let Some(content) = content else {
            debug!(id = %message, "deletion with no archived content");
            self.metrics.increment_not_found();
            return Ok(EventOutcome::NotFound);
        };

        let assessment = self.analyzer.assess(user).await;
        debug!(id = %message, risk = assessment.score, "recovering deleted message");

        let notification = self.notifier.build(&content, context);
        self.sink.emit(PipelineEvent::Deliver {
            chat: ChatId::new(self.config.monitor.clone()),
            notification,
            quoted: Some(message.clone()),
        });

        // Fire-and-forget audit trail; a logging failure never fails the
        // recovery, and the write does not hold up the recovery path.
        let details = serde_json::json!({
            "type": content.kind.label(),
            "deleted_by_admin": context.deleted_by_admin,
        });
        let archive = Arc::clone(&self.archive);
        let (user, chat, id) = (user.clone(), chat.clone(), message.clone());
        let _ = self.audit_tasks.spawn(async move {
            if let Err(error) = archive
                .log_event("MESSAGE_DELETED", &user, &chat, &id, &details)
                .await
            {
                warn!(%error, "event log append failed");
            }
        });

        self.metrics.increment_recovered();
        Ok(EventOutcome::Recovered)
    }

    /// Resolve media bytes for a media-capable message.
    ///
    /// An embedded location preview supplies the bytes directly with no
    /// network round trip. Broadcast-channel media is fetched straight
    /// from the media host since channel messages carry no download
    /// session. Everything else goes through the retrying downloader.
    async fn acquire_media(&self, message: &InboundMessage) -> Option<Bytes> {
        if !is_media_capable(message) {
            return None;
        }
        if let Some(MessageContent::Location(pin)) =
            message.content.as_ref().map(MessageContent::unwrapped)
        {
            return pin.thumbnail.clone().map(Bytes::from);
        }
        if message.chat.as_str().contains("@newsletter") {
            return self.direct.fetch(message).await;
        }
        self.downloader
            .fetch(message, self.config.max_download_attempts)
            .await
    }
}

fn archive_error(e: ArchiveError) -> RemnantError {
    RemnantError::Archive(e.to_string())
}

#[derive(Default)]
struct MediaAttrs {
    mimetype: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration_secs: Option<u32>,
    file_length: Option<u64>,
    thumbnail: Option<Vec<u8>>,
}

fn media_attrs(message: &InboundMessage) -> MediaAttrs {
    let Some(content) = message.content.as_ref().map(MessageContent::unwrapped) else {
        return MediaAttrs::default();
    };
    match content {
        MessageContent::Image(media)
        | MessageContent::Video(media)
        | MessageContent::Audio(media)
        | MessageContent::Document { media, .. } => attrs_of(media),
        MessageContent::Sticker { media, animated } => {
            let mut attrs = attrs_of(media);
            // Lottie stickers declare a vector mimetype the downloaded
            // raster bytes do not match.
            if *animated || attrs.mimetype.as_deref() == Some("application/was") {
                attrs.mimetype = Some("image/webp".to_owned());
            }
            attrs
        }
        MessageContent::Location(pin) => MediaAttrs {
            mimetype: pin.thumbnail.is_some().then(|| "image/jpeg".to_owned()),
            thumbnail: pin.thumbnail.clone(),
            ..MediaAttrs::default()
        },
        _ => MediaAttrs::default(),
    }
}

fn attrs_of(media: &remnant_core::message::MediaContent) -> MediaAttrs {
    MediaAttrs {
        mimetype: media.mimetype.clone(),
        width: media.width,
        height: media.height,
        duration_secs: media.duration_secs,
        file_length: media.file_length,
        thumbnail: media.thumbnail.clone(),
    }
}

/// Assembles an [`EventRouter`] from its collaborators. Only the archive
/// is mandatory; the fetcher defaults to disabled and the sink discards
/// events.
#[derive(Default)]
pub struct RouterBuilder {
    config: RouterConfig,
    archive: Option<Arc<Archive>>,
    fetcher: Option<Arc<dyn MediaFetcher>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl RouterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn monitor(mut self, id: impl Into<String>) -> Self {
        self.config.monitor = id.into();
        self
    }

    #[must_use]
    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn archive(mut self, archive: Arc<Archive>) -> Self {
        self.archive = Some(archive);
        self
    }

    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn MediaFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<EventRouter, RemnantError> {
        let archive = self
            .archive
            .ok_or_else(|| RemnantError::Configuration("an archive is required".to_owned()))?;

        let enabled = is_valid_monitor_id(&self.config.monitor);
        if !enabled {
            warn!(
                monitor = %self.config.monitor,
                "monitored destination id is invalid, pipeline disabled"
            );
        }

        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Arc::new(DisabledFetcher::new()));
        let sink = self.sink.unwrap_or_else(|| Arc::new(NullSink));

        let limiter = Arc::new(RateLimiter::new(
            self.config.rate_limit,
            self.config.rate_window,
        ));
        let cache = Arc::new(MessageCache::new(self.config.cache_ttl));
        let downloader = RetryDownloader::new(fetcher, Arc::clone(&sink));
        let analyzer = BehaviorAnalyzer::new(Arc::clone(&archive), Arc::clone(&sink));

        Ok(EventRouter {
            config: self.config,
            enabled,
            limiter,
            cache,
            archive,
            downloader,
            direct: DirectFetcher::default(),
            analyzer,
            notifier: NotificationBuilder::new(),
            sink,
            metrics: Arc::new(PipelineMetrics::default()),
            audit_tasks: TaskTracker::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use remnant_archive::ArchiveConfig;

    use super::*;

    async fn archive() -> Arc<Archive> {
        Arc::new(
            Archive::connect(&ArchiveConfig::in_memory())
                .await
                .expect("in-memory archive"),
        )
    }

    #[tokio::test]
    async fn invalid_monitor_disables_the_pipeline() {
        let router = EventRouter::builder()
            .monitor("YOUR_LOG_GROUP_ID_HERE@g.us")
            .archive(archive().await)
            .build()
            .expect("router");

        assert!(!router.is_enabled());
        let outcome = router
            .process(InboundEvent::New(InboundMessage::new(
                "m1",
                "123@g.us",
                "u1@s.whatsapp.net",
                MessageContent::Text {
                    body: "hi".to_owned(),
                },
            )))
            .await;
        assert_eq!(outcome, EventOutcome::Rejected(RejectReason::Disabled));
    }

    #[tokio::test]
    async fn missing_archive_is_a_configuration_error() {
        let err = EventRouter::builder()
            .monitor("123456789@g.us")
            .build()
            .err()
            .map(|e| e.to_string());
        assert!(err.is_some_and(|e| e.contains("archive")));
    }

    #[tokio::test]
    async fn protocol_messages_are_discarded() {
        let router = EventRouter::builder()
            .monitor("123456789@g.us")
            .archive(archive().await)
            .build()
            .expect("router");

        let outcome = router
            .process(InboundEvent::New(InboundMessage::new(
                "m1",
                "123@g.us",
                "u1@s.whatsapp.net",
                MessageContent::Protocol(remnant_core::message::ProtocolAction::Other),
            )))
            .await;
        assert_eq!(outcome, EventOutcome::Discarded);
    }

    #[test]
    fn lottie_sticker_mimetype_is_normalized() {
        let message = InboundMessage::new(
            "m1",
            "123@g.us",
            "u1@s.whatsapp.net",
            MessageContent::Sticker {
                media: remnant_core::message::MediaContent {
                    mimetype: Some("application/was".to_owned()),
                    ..remnant_core::message::MediaContent::default()
                },
                animated: true,
            },
        );
        let attrs = media_attrs(&message);
        assert_eq!(attrs.mimetype.as_deref(), Some("image/webp"));
    }
}
