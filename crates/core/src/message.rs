use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChatId, MessageId, UserId};

/// Media attributes shared by image, sticker, video, audio, and document
/// content. The protocol adapter fills in whatever the wire message carried;
/// every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaContent {
    pub caption: Option<String>,
    pub mimetype: Option<String>,
    /// Explicit download URL, when the platform provides one.
    pub url: Option<String>,
    /// Relative media path used to derive a URL on the media host.
    pub direct_path: Option<String>,
    /// Embedded preview bytes, already decoded from the wire encoding.
    pub thumbnail: Option<Vec<u8>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<u32>,
    pub file_length: Option<u64>,
}

impl MediaContent {
    /// Decode a base64 thumbnail as delivered by the protocol adapter.
    /// Invalid payloads are dropped rather than propagated.
    #[must_use]
    pub fn with_thumbnail_base64(mut self, encoded: &str) -> Self {
        self.thumbnail = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .ok();
        self
    }
}

/// A single shared contact card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactCard {
    pub display_name: Option<String>,
    /// Raw vCard text, stored verbatim.
    pub vcard: String,
}

/// A shared calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub name: String,
    pub description: Option<String>,
    /// Unix seconds.
    pub start_time: i64,
    /// Unix seconds.
    pub end_time: i64,
    pub canceled: bool,
    pub scheduled_call: bool,
    pub extra_guests_allowed: bool,
}

/// A shared location pin, optionally carrying an embedded map preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPin {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
    pub address: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<Vec<u8>>,
}

/// Control messages the platform uses for protocol bookkeeping. These are
/// never archived; a revoke is the deletion signal for its target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolAction {
    /// The sender revoked a previously delivered message.
    Revoke { target: MessageId },
    /// Any other control message (history sync, key rotation, ...).
    Other,
}

/// System stub codes delivered without a content body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStub {
    /// The referenced message was removed.
    Removed,
    /// Any other stub (membership changes, subject edits, ...).
    Other,
}

/// The single content variant carried by an inbound message.
///
/// Poll creation versions 1 through 3 collapse into the one `Poll` variant.
/// `Ephemeral` wraps exactly one level of disappearing-message content;
/// classification unwraps it once and treats deeper nesting as unsupported.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        body: String,
    },
    Image(MediaContent),
    Sticker {
        media: MediaContent,
        /// Lottie (animated vector) stickers set this flag.
        animated: bool,
    },
    Video(MediaContent),
    Audio(MediaContent),
    Document {
        name: Option<String>,
        media: MediaContent,
    },
    Contact(ContactCard),
    ContactList {
        display_name: Option<String>,
        contacts: Vec<ContactCard>,
    },
    Location(LocationPin),
    Poll {
        name: String,
        options: Vec<String>,
    },
    Event(CalendarEvent),
    Protocol(ProtocolAction),
    Ephemeral(Box<MessageContent>),
}

impl MessageContent {
    /// Unwrap one level of ephemeral wrapping, returning the inner content.
    /// Non-wrapped content is returned unchanged.
    #[must_use]
    pub fn unwrapped(&self) -> &MessageContent {
        match self {
            Self::Ephemeral(inner) => inner,
            other => other,
        }
    }
}

/// A raw inbound message as handed over by the protocol adapter.
///
/// Stub-only events (system notices) carry no content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: MessageId,
    pub chat: ChatId,
    pub sender: UserId,
    pub timestamp: DateTime<Utc>,
    pub stub: Option<SystemStub>,
    pub content: Option<MessageContent>,
}

impl InboundMessage {
    /// Create a content-bearing message timestamped now.
    #[must_use]
    pub fn new(
        id: impl Into<MessageId>,
        chat: impl Into<ChatId>,
        sender: impl Into<UserId>,
        content: MessageContent,
    ) -> Self {
        Self {
            id: id.into(),
            chat: chat.into(),
            sender: sender.into(),
            timestamp: Utc::now(),
            stub: None,
            content: Some(content),
        }
    }

    /// `true` when the content arrived under an ephemeral wrapper.
    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        matches!(self.content, Some(MessageContent::Ephemeral(_)))
    }

    /// Resolve the deletion signal, if this message carries one.
    ///
    /// A protocol revoke names the original message explicitly; a `Removed`
    /// system stub targets the event's own id (broadcast-channel removals
    /// reuse the id of the deleted entry).
    #[must_use]
    pub fn revoked_target(&self) -> Option<MessageId> {
        if let Some(MessageContent::Protocol(ProtocolAction::Revoke { target })) =
            self.content.as_ref().map(MessageContent::unwrapped)
        {
            return Some(target.clone());
        }
        if self.stub == Some(SystemStub::Removed) {
            return Some(self.id.clone());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(body: &str) -> MessageContent {
        MessageContent::Text {
            body: body.to_owned(),
        }
    }

    #[test]
    fn unwrapped_passes_plain_content_through() {
        let content = text("hello");
        assert!(matches!(
            content.unwrapped(),
            MessageContent::Text { body } if body == "hello"
        ));
    }

    #[test]
    fn unwrapped_removes_one_ephemeral_level() {
        let content = MessageContent::Ephemeral(Box::new(text("hidden")));
        assert!(matches!(
            content.unwrapped(),
            MessageContent::Text { body } if body == "hidden"
        ));
    }

    #[test]
    fn revoked_target_from_protocol_revoke() {
        let msg = InboundMessage::new(
            "proto-1",
            "123@g.us",
            "u1@s.whatsapp.net",
            MessageContent::Protocol(ProtocolAction::Revoke {
                target: MessageId::new("m1"),
            }),
        );
        assert_eq!(msg.revoked_target(), Some(MessageId::new("m1")));
    }

    #[test]
    fn revoked_target_from_removed_stub() {
        let mut msg = InboundMessage::new("m9", "55@newsletter", "55@newsletter", text(""));
        msg.content = None;
        msg.stub = Some(SystemStub::Removed);
        assert_eq!(msg.revoked_target(), Some(MessageId::new("m9")));
    }

    #[test]
    fn ordinary_message_is_not_a_deletion_signal() {
        let msg = InboundMessage::new("m1", "c1@g.us", "u1@s.whatsapp.net", text("hi"));
        assert!(msg.revoked_target().is_none());
    }

    #[test]
    fn thumbnail_base64_decoding() {
        let media = MediaContent::default().with_thumbnail_base64("aGVsbG8=");
        assert_eq!(media.thumbnail.as_deref(), Some(b"hello".as_slice()));

        let bad = MediaContent::default().with_thumbnail_base64("!!not base64!!");
        assert!(bad.thumbnail.is_none());
    }
}
