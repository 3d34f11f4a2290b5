//! Classification of raw inbound messages into canonical types.
//!
//! Classification is total: every message variant, including one level of
//! ephemeral wrapping, maps to exactly one [`MessageKind`]. Protocol/control
//! messages and stub-only events classify as unsupported and are never
//! archived.

use chrono::DateTime;

use crate::message::{InboundMessage, MessageContent};
use crate::record::MessageKind;

/// The outcome of classifying an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: MessageKind,
    pub status: i64,
}

/// Classify a message into its canonical type and status code.
#[must_use]
pub fn classify(message: &InboundMessage) -> Classification {
    let kind = match message.content.as_ref() {
        None => MessageKind::Unsupported,
        Some(content) => kind_of(content.unwrapped()),
    };
    Classification {
        kind,
        status: kind.status_code(),
    }
}

fn kind_of(content: &MessageContent) -> MessageKind {
    match content {
        MessageContent::Text { .. } => MessageKind::Text,
        MessageContent::Image(_) => MessageKind::Image,
        MessageContent::Sticker { .. } => MessageKind::Sticker,
        MessageContent::Video(_) => MessageKind::Video,
        MessageContent::Audio(_) => MessageKind::Audio,
        MessageContent::Document { .. } => MessageKind::Document,
        MessageContent::Contact(_) => MessageKind::Contact,
        MessageContent::ContactList { .. } => MessageKind::ContactList,
        MessageContent::Location(_) => MessageKind::Location,
        MessageContent::Poll { .. } => MessageKind::Poll,
        MessageContent::Event(_) => MessageKind::Event,
        MessageContent::Protocol(_) => MessageKind::Unsupported,
        // Only one wrapping level is honored.
        MessageContent::Ephemeral(_) => MessageKind::Unsupported,
    }
}

/// Whether this message can carry downloadable media bytes.
///
/// Location pins count when they carry an embedded preview, since the
/// preview is archived as the message's media.
#[must_use]
pub fn is_media_capable(message: &InboundMessage) -> bool {
    match message.content.as_ref().map(MessageContent::unwrapped) {
        Some(
            MessageContent::Image(_)
            | MessageContent::Sticker { .. }
            | MessageContent::Video(_)
            | MessageContent::Audio(_)
            | MessageContent::Document { .. },
        ) => true,
        Some(MessageContent::Location(pin)) => pin.thumbnail.is_some(),
        _ => false,
    }
}

/// Produce the type-specific human summary stored as the message body.
#[must_use]
pub fn extract_preview(message: &InboundMessage) -> String {
    let Some(content) = message.content.as_ref() else {
        return String::new();
    };

    match content.unwrapped() {
        MessageContent::Text { body } => body.clone(),
        MessageContent::Image(media) | MessageContent::Video(media) => {
            media.caption.clone().unwrap_or_default()
        }
        MessageContent::Sticker { animated, .. } => {
            if *animated {
                "Animated sticker".to_owned()
            } else {
                String::new()
            }
        }
        MessageContent::Audio(_) => String::new(),
        MessageContent::Document { name, media } => {
            let file_name = name.clone().unwrap_or_else(|| "Document".to_owned());
            let size = media
                .file_length
                .map_or_else(|| "unknown size".to_owned(), format_bytes);
            let mime = media
                .mimetype
                .as_deref()
                .and_then(|m| m.split('/').nth(1))
                .map_or_else(|| "FILE".to_owned(), str::to_uppercase);
            format!("{file_name}\n{size} \u{2022} {mime}")
        }
        MessageContent::Contact(card) => {
            let display = card
                .display_name
                .clone()
                .unwrap_or_else(|| "Name unavailable".to_owned());
            format!("Contact: {display}\n{}", card.vcard)
        }
        MessageContent::ContactList {
            display_name,
            contacts,
        } => {
            let mut out = display_name.clone().unwrap_or_else(|| "Contacts".to_owned());
            out.push('\n');
            for (index, card) in contacts.iter().enumerate() {
                out.push_str(&format!("\n--- CONTACT {} ---\n", index + 1));
                out.push_str(&format!(
                    "Name: {}\n",
                    card.display_name.as_deref().unwrap_or("Unnamed")
                ));
                if card.vcard.is_empty() {
                    out.push_str("No vCard\n");
                } else {
                    out.push_str(&card.vcard);
                    out.push('\n');
                }
            }
            out
        }
        MessageContent::Location(pin) => {
            let mut out = format!(
                "Location shared\nCoordinates: {:.6}, {:.6}",
                pin.latitude, pin.longitude
            );
            if let Some(name) = &pin.name {
                out.push_str(&format!("\nName: {name}"));
            }
            if let Some(address) = &pin.address {
                out.push_str(&format!("\nAddress: {address}"));
            }
            if let Some(url) = &pin.url {
                out.push_str(&format!("\nURL: {url}"));
            }
            out
        }
        MessageContent::Poll { name, options } => {
            format!("{name} [{}]", options.join(" | "))
        }
        MessageContent::Event(ev) => {
            let status = if ev.canceled { "CANCELED" } else { "ACTIVE" };
            let call = if ev.scheduled_call {
                " \u{2022} Scheduled call"
            } else {
                ""
            };
            let guests = if ev.extra_guests_allowed {
                "Extra guests allowed"
            } else {
                "Closed guest list"
            };
            format!(
                "{}\n{}\nStarts: {}\nEnds: {}\n{status}{call}\n{guests}",
                ev.name,
                ev.description.as_deref().unwrap_or("No description"),
                format_event_time(ev.start_time),
                format_event_time(ev.end_time),
            )
        }
        MessageContent::Protocol(_) | MessageContent::Ephemeral(_) => String::new(),
    }
}

fn format_event_time(unix_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs, 0)
        .map_or_else(|| "unknown".to_owned(), |t| t.format("%d/%m/%Y %H:%M").to_string())
}

/// Format a byte count in 1024-based units with up to two decimals.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_owned();
    }
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    let exponent = ((bytes.ilog2() / 10) as usize).min(UNITS.len() - 1);
    #[allow(clippy::cast_precision_loss)]
    let value = bytes as f64 / 1024f64.powi(i32::try_from(exponent).unwrap_or(0));
    let mut rendered = format!("{value:.2}");
    while rendered.ends_with('0') {
        rendered.pop();
    }
    if rendered.ends_with('.') {
        rendered.pop();
    }
    format!("{rendered} {}", UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{
        CalendarEvent, ContactCard, LocationPin, MediaContent, ProtocolAction,
    };
    use crate::types::MessageId;

    fn msg(content: MessageContent) -> InboundMessage {
        InboundMessage::new("m1", "c1@g.us", "u1@s.whatsapp.net", content)
    }

    fn media() -> MediaContent {
        MediaContent {
            mimetype: Some("image/jpeg".into()),
            file_length: Some(2048),
            ..MediaContent::default()
        }
    }

    #[test]
    fn every_variant_classifies() {
        let cases: Vec<(MessageContent, MessageKind)> = vec![
            (MessageContent::Text { body: "hi".into() }, MessageKind::Text),
            (MessageContent::Image(media()), MessageKind::Image),
            (
                MessageContent::Sticker {
                    media: media(),
                    animated: false,
                },
                MessageKind::Sticker,
            ),
            (MessageContent::Video(media()), MessageKind::Video),
            (MessageContent::Audio(media()), MessageKind::Audio),
            (
                MessageContent::Document {
                    name: Some("report.pdf".into()),
                    media: media(),
                },
                MessageKind::Document,
            ),
            (
                MessageContent::Contact(ContactCard {
                    display_name: Some("Ana".into()),
                    vcard: "BEGIN:VCARD\nEND:VCARD".into(),
                }),
                MessageKind::Contact,
            ),
            (
                MessageContent::ContactList {
                    display_name: None,
                    contacts: vec![],
                },
                MessageKind::ContactList,
            ),
            (
                MessageContent::Location(LocationPin {
                    latitude: 0.0,
                    longitude: 0.0,
                    name: None,
                    address: None,
                    url: None,
                    thumbnail: None,
                }),
                MessageKind::Location,
            ),
            (
                MessageContent::Poll {
                    name: "lunch?".into(),
                    options: vec!["yes".into(), "no".into()],
                },
                MessageKind::Poll,
            ),
            (
                MessageContent::Event(CalendarEvent {
                    name: "standup".into(),
                    description: None,
                    start_time: 0,
                    end_time: 0,
                    canceled: false,
                    scheduled_call: false,
                    extra_guests_allowed: false,
                }),
                MessageKind::Event,
            ),
            (
                MessageContent::Protocol(ProtocolAction::Revoke {
                    target: MessageId::new("x"),
                }),
                MessageKind::Unsupported,
            ),
        ];

        for (content, expected) in cases {
            let c = classify(&msg(content));
            assert_eq!(c.kind, expected);
            assert_eq!(c.status, expected.status_code());
        }
    }

    #[test]
    fn ephemeral_wrap_is_unwrapped_once() {
        let wrapped = MessageContent::Ephemeral(Box::new(MessageContent::Image(media())));
        assert_eq!(classify(&msg(wrapped)).kind, MessageKind::Image);

        let nested = MessageContent::Ephemeral(Box::new(MessageContent::Ephemeral(Box::new(
            MessageContent::Text { body: "x".into() },
        ))));
        assert_eq!(classify(&msg(nested)).kind, MessageKind::Unsupported);
    }

    #[test]
    fn stub_only_message_is_unsupported() {
        let mut m = msg(MessageContent::Text { body: String::new() });
        m.content = None;
        assert_eq!(classify(&m).status, -1);
    }

    #[test]
    fn location_media_capability_depends_on_preview() {
        let with_preview = MessageContent::Location(LocationPin {
            latitude: 1.0,
            longitude: 2.0,
            name: None,
            address: None,
            url: None,
            thumbnail: Some(vec![0xff, 0xd8]),
        });
        let without = MessageContent::Location(LocationPin {
            latitude: 1.0,
            longitude: 2.0,
            name: None,
            address: None,
            url: None,
            thumbnail: None,
        });
        assert!(is_media_capable(&msg(with_preview)));
        assert!(!is_media_capable(&msg(without)));
        assert!(is_media_capable(&msg(MessageContent::Image(media()))));
        assert!(!is_media_capable(&msg(MessageContent::Text {
            body: "x".into()
        })));
    }

    #[test]
    fn location_preview_uses_six_decimal_places() {
        let content = MessageContent::Location(LocationPin {
            latitude: -23.550_52,
            longitude: -46.633_309,
            name: Some("Downtown".into()),
            address: None,
            url: None,
            thumbnail: None,
        });
        let preview = extract_preview(&msg(content));
        assert!(preview.contains("Coordinates: -23.550520, -46.633309"));
        assert!(preview.contains("Name: Downtown"));
    }

    #[test]
    fn document_preview_has_name_size_and_mime() {
        let content = MessageContent::Document {
            name: Some("report.pdf".into()),
            media: MediaContent {
                mimetype: Some("application/pdf".into()),
                file_length: Some(2048),
                ..MediaContent::default()
            },
        };
        let preview = extract_preview(&msg(content));
        assert_eq!(preview, "report.pdf\n2 KB \u{2022} PDF");
    }

    #[test]
    fn poll_preview_joins_options_with_pipes() {
        let content = MessageContent::Poll {
            name: "lunch".into(),
            options: vec!["pizza".into(), "sushi".into(), "salad".into()],
        };
        assert_eq!(extract_preview(&msg(content)), "lunch [pizza | sushi | salad]");
    }

    #[test]
    fn multi_contact_preview_uses_fixed_delimiter() {
        let content = MessageContent::ContactList {
            display_name: Some("Team".into()),
            contacts: vec![
                ContactCard {
                    display_name: Some("Ana".into()),
                    vcard: "BEGIN:VCARD\nFN:Ana\nEND:VCARD".into(),
                },
                ContactCard {
                    display_name: None,
                    vcard: String::new(),
                },
            ],
        };
        let preview = extract_preview(&msg(content));
        assert!(preview.contains("--- CONTACT 1 ---"));
        assert!(preview.contains("--- CONTACT 2 ---"));
        assert!(preview.contains("Name: Ana"));
        assert!(preview.contains("Name: Unnamed"));
        assert!(preview.contains("No vCard"));
    }

    #[test]
    fn event_preview_flags() {
        let content = MessageContent::Event(CalendarEvent {
            name: "launch".into(),
            description: Some("ship it".into()),
            start_time: 1_750_000_000,
            end_time: 1_750_003_600,
            canceled: true,
            scheduled_call: true,
            extra_guests_allowed: false,
        });
        let preview = extract_preview(&msg(content));
        assert!(preview.starts_with("launch\nship it\nStarts: "));
        assert!(preview.contains("CANCELED"));
        assert!(preview.contains("Scheduled call"));
        assert!(preview.contains("Closed guest list"));
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(2 * 1024 * 1024), "2 MB");
    }
}
