use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::content_hash;
use crate::types::{ChatId, MessageId, UserId};

/// Canonical message types with their fixed status codes.
///
/// The numeric codes are part of the persisted schema and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
    Sticker,
    Video,
    Audio,
    Document,
    Contact,
    Poll,
    Event,
    ContactList,
    Location,
    /// Control/protocol messages; never archived.
    Unsupported,
}

impl MessageKind {
    /// The fixed status code stored in the archive.
    #[must_use]
    pub fn status_code(self) -> i64 {
        match self {
            Self::Text => 0,
            Self::Image => 1,
            Self::Sticker => 3,
            Self::Video => 4,
            Self::Audio => 6,
            Self::Document => 7,
            Self::Contact => 8,
            Self::Poll => 9,
            Self::Event => 10,
            Self::ContactList => 11,
            Self::Location => 12,
            Self::Unsupported => -1,
        }
    }

    /// Map a stored status code back to a kind. Unknown codes render as
    /// text, matching how archived rows from older schema revisions are
    /// treated.
    #[must_use]
    pub fn from_status(status: i64) -> Self {
        match status {
            1 => Self::Image,
            3 => Self::Sticker,
            4 => Self::Video,
            6 => Self::Audio,
            7 => Self::Document,
            8 => Self::Contact,
            9 => Self::Poll,
            10 => Self::Event,
            11 => Self::ContactList,
            12 => Self::Location,
            -1 => Self::Unsupported,
            _ => Self::Text,
        }
    }

    /// Statuses that bump the per-user media counters.
    #[must_use]
    pub fn counts_as_media(self) -> bool {
        matches!(
            self,
            Self::Image | Self::Sticker | Self::Video | Self::Audio | Self::Location
        )
    }

    /// Statuses exempt from the retention sweep.
    #[must_use]
    pub fn retained_indefinitely(self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }

    /// Human label used in notification headers.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Sticker => "sticker",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Contact => "contact",
            Self::Poll => "poll",
            Self::Event => "event",
            Self::ContactList => "contacts",
            Self::Location => "location",
            Self::Unsupported => "unsupported",
        }
    }
}

/// A classified message headed for the archive. This is also the payload
/// cached in memory between ingestion and a possible deletion event, so the
/// cache path and the durable path hand downstream code the same fields.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: MessageId,
    pub user: UserId,
    pub chat: ChatId,
    pub timestamp: DateTime<Utc>,
    pub body: String,
    pub kind: MessageKind,
    pub ephemeral: bool,
    pub mimetype: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<u32>,
    pub file_length: Option<u64>,
    pub thumbnail: Option<Vec<u8>>,
    /// Raw (uncompressed) media bytes; compression happens at write time.
    pub media: Option<Bytes>,
}

impl NewMessage {
    /// Byte size recorded for this message: downloaded payload first, then
    /// the declared file length, then zero.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.media
            .as_ref()
            .map(|m| m.len() as u64)
            .or(self.file_length)
            .unwrap_or(0)
    }

    /// Dedup hash over (user, body-or-empty, timestamp truncated to seconds).
    #[must_use]
    pub fn dedup_hash(&self) -> String {
        content_hash(&self.user, &self.body, self.timestamp)
    }
}

/// The one canonical shape for recovered message content, regardless of
/// whether it came from the in-memory cache or the durable archive. Media is
/// always raw bytes here; the archive decompresses before constructing this.
#[derive(Debug, Clone)]
pub struct RecoveredContent {
    pub id: MessageId,
    pub user: UserId,
    pub chat: ChatId,
    pub timestamp: DateTime<Utc>,
    pub body: String,
    pub kind: MessageKind,
    pub size: u64,
    pub ephemeral: bool,
    pub mimetype: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<u32>,
    pub media: Option<Bytes>,
}

impl From<NewMessage> for RecoveredContent {
    fn from(m: NewMessage) -> Self {
        let size = m.size();
        Self {
            id: m.id,
            user: m.user,
            chat: m.chat,
            timestamp: m.timestamp,
            body: m.body,
            kind: m.kind,
            size,
            ephemeral: m.ephemeral,
            mimetype: m.mimetype,
            width: m.width,
            height: m.height,
            duration_secs: m.duration_secs,
            media: m.media,
        }
    }
}

/// Who deleted the message, as resolved by the protocol adapter.
#[derive(Debug, Clone, Default)]
pub struct DeletionContext {
    /// Display name of the original author.
    pub display_name: String,
    /// `true` when a group admin removed someone else's message.
    pub deleted_by_admin: bool,
    /// Display name of the admin, when known.
    pub admin_name: Option<String>,
}
