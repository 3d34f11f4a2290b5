use std::sync::LazyLock;

use regex::Regex;

use remnant_core::record::{DeletionContext, MessageKind, RecoveredContent};
use remnant_core::{Notification, format_bytes};

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+[\d\s-]+").unwrap_or_else(|_| unreachable!("pattern is valid")));

static CONTACT_DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"--- CONTACT \d+ ---").unwrap_or_else(|_| unreachable!("pattern is valid"))
});

/// Address classification by domain suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressScope {
    /// A direct user address.
    Direct,
    /// A group conversation.
    Group,
    /// A broadcast list.
    BroadcastList,
    /// A broadcast channel. Channel addresses are public and are never
    /// redacted.
    Channel,
    /// An anonymized relay address.
    Anonymized,
    Unknown,
}

impl AddressScope {
    #[must_use]
    pub fn classify(address: &str) -> Self {
        if address.contains("@s.whatsapp.net") {
            Self::Direct
        } else if address.contains("@g.us") {
            Self::Group
        } else if address.contains("@broadcast") {
            Self::BroadcastList
        } else if address.contains("@newsletter") {
            Self::Channel
        } else if address.contains("@lid") {
            Self::Anonymized
        } else {
            Self::Unknown
        }
    }

    fn sender_heading(self) -> &'static str {
        match self {
            Self::Direct => "SENDER NUMBER",
            Self::Group => "SENDER GROUP",
            Self::BroadcastList => "BROADCAST LIST SENDER",
            Self::Channel => "CHANNEL SENDER",
            Self::Anonymized => "ANONYMIZED SENDER",
            Self::Unknown => "UNKNOWN SENDER",
        }
    }

    fn chat_heading(self) -> &'static str {
        match self {
            Self::Group => "GROUP ID",
            Self::Channel => "CHANNEL ID",
            Self::Anonymized => "ANONYMIZED CHAT ID",
            Self::Direct | Self::BroadcastList | Self::Unknown => "CHAT ID",
        }
    }
}

/// Redact a phone-like identifier to its first five characters.
///
/// Short identifiers pass through unchanged; they are not phone numbers.
#[must_use]
pub fn redact_address(address: &str) -> String {
    let clean = address.replace("@s.whatsapp.net", "");
    if clean.chars().count() > 8 {
        let prefix: String = clean.chars().take(5).collect();
        format!("{prefix}...")
    } else {
        clean
    }
}

/// Renders a recovered message into a deliverable [`Notification`].
///
/// Sections are appended in a fixed order; a section with nothing to say
/// is omitted entirely rather than rendered empty. The registration
/// timestamp is the one section that always appears.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationBuilder;

impl NotificationBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn build(&self, content: &RecoveredContent, context: &DeletionContext) -> Notification {
        let mut text = format!("{}\nFrom: {}", header(content.kind), context.display_name);

        text.push_str("\n\nDELETED BY");
        if context.deleted_by_admin {
            let admin = context.admin_name.as_deref().unwrap_or("Unknown");
            text.push_str(&format!("\n> Admin: {admin}"));
        } else {
            text.push_str("\n> Removed by the author");
        }

        if let Some(section) = media_section(content) {
            text.push_str(&section);
        }

        text.push_str(&format!(
            "\n\nARCHIVED AT\n> {}",
            content.timestamp.format("%d/%m/%Y %H:%M:%S")
        ));

        if content.ephemeral {
            text.push_str(
                "\n\nEPHEMERAL MESSAGE\n> This message was set to disappear after being viewed.",
            );
        }

        let sender_scope = AddressScope::classify(&content.user);
        let chat_scope = AddressScope::classify(&content.chat);
        let unredacted = sender_scope == AddressScope::Channel
            || matches!(chat_scope, AddressScope::Channel | AddressScope::Anonymized);
        let sender = if unredacted {
            content.user.to_string()
        } else {
            redact_address(&content.user)
        };
        text.push_str(&format!("\n\n{}\n> {sender}", sender_scope.sender_heading()));

        text.push_str(&format!(
            "\n\n{}\n> {}",
            chat_scope.chat_heading(),
            content.chat
        ));

        if let Some(section) = content_section(content) {
            text.push_str(&section);
        }

        Notification {
            kind: content.kind,
            text,
            media: content.media.clone(),
            mime_type: content.mimetype.clone(),
            file_name: file_name(content),
            vcard: vcard(content),
        }
    }
}

fn header(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Image => "DELETED IMAGE",
        MessageKind::Sticker => "DELETED STICKER",
        MessageKind::Video => "DELETED VIDEO",
        MessageKind::Audio => "DELETED AUDIO",
        MessageKind::Document => "DELETED DOCUMENT",
        MessageKind::Poll => "DELETED POLL",
        MessageKind::Event => "DELETED EVENT",
        MessageKind::Contact => "DELETED CONTACT",
        MessageKind::ContactList => "DELETED CONTACTS",
        MessageKind::Location => "DELETED LOCATION",
        MessageKind::Text | MessageKind::Unsupported => "DELETED MESSAGE",
    }
}

fn media_section(content: &RecoveredContent) -> Option<String> {
    if content.size == 0 {
        return None;
    }
    let size = format_bytes(content.size);

    match content.kind {
        MessageKind::Image | MessageKind::Video | MessageKind::Sticker => {
            let mut section = format!("\n\nMEDIA\n> {size}");
            if let (Some(width), Some(height)) = (content.width, content.height) {
                section.push_str(&format!(" \u{2022} {width}x{height}"));
            }
            if content.kind == MessageKind::Video {
                if let Some(duration) = content.duration_secs {
                    section.push_str(&format!(" \u{2022} {duration}s"));
                }
            }
            Some(section)
        }
        MessageKind::Audio => {
            let mut section = format!("\n\nAUDIO\n> {size}");
            if let Some(duration) = content.duration_secs {
                section.push_str(&format!(" \u{2022} {duration}s"));
            }
            Some(section)
        }
        MessageKind::Document => {
            let mut section = format!("\n\nFILE\n> {size}");
            if let Some(subtype) = content
                .mimetype
                .as_deref()
                .and_then(|m| m.split('/').nth(1))
            {
                section.push_str(&format!(" \u{2022} {}", subtype.to_uppercase()));
            }
            Some(section)
        }
        _ => None,
    }
}

fn content_section(content: &RecoveredContent) -> Option<String> {
    let body = content.body.trim();
    if body.is_empty() {
        return None;
    }

    if content.kind == MessageKind::Contact && body.contains("BEGIN:VCARD") {
        let name = body
            .lines()
            .find_map(|line| line.strip_prefix("FN:"))
            .unwrap_or("Name unavailable");
        let phone = body
            .lines()
            .find(|line| line.contains("TEL"))
            .and_then(|line| PHONE.find(line))
            .map_or("Phone unavailable", |m| m.as_str());
        return Some(format!(
            "\n\nCONTENT\n> Name: {name}\n> Phone: {phone}\n> Full vCard archived"
        ));
    }

    if content.kind == MessageKind::ContactList && body.contains("--- CONTACT") {
        let total = CONTACT_DELIMITER.find_iter(body).count();
        return Some(format!(
            "\n\nCONTENT\n> Total: {total} contacts\n> All vCards archived"
        ));
    }

    let preview = if body.chars().count() > 100 {
        let truncated: String = body.chars().take(100).collect();
        format!("{truncated}...")
    } else {
        body.to_owned()
    };
    Some(format!("\n\nCONTENT\n> {preview}"))
}

fn file_name(content: &RecoveredContent) -> Option<String> {
    if content.kind != MessageKind::Document {
        return None;
    }
    // The first preview line is the stored file name.
    let name = content
        .body
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .unwrap_or("recovered_document");
    Some(name.to_owned())
}

fn vcard(content: &RecoveredContent) -> Option<String> {
    match content.kind {
        MessageKind::Contact => {
            // Stored as "Contact: <name>\n<vcard>".
            let card: Vec<&str> = content.body.lines().skip(1).collect();
            if card.is_empty() {
                None
            } else {
                Some(card.join("\n"))
            }
        }
        MessageKind::ContactList if !content.body.is_empty() => Some(content.body.clone()),
        _ => None,
    }
}
