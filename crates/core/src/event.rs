//! Outbound pipeline events.
//!
//! The pipeline reports its results through an [`EventSink`] supplied by the
//! host. Delivery is fire-and-forget from the pipeline's point of view: a
//! sink that needs to do slow work should hand the event off internally.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::record::MessageKind;
use crate::types::{ChatId, MessageId, UserId};

/// A recovered message rendered for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: MessageKind,
    /// Formatted text block, section order is fixed.
    pub text: String,
    /// Raw media bytes to attach, when the message carried any.
    pub media: Option<Bytes>,
    pub mime_type: Option<String>,
    /// File name for document attachments.
    pub file_name: Option<String>,
    /// vCard payload for contact messages delivered as contacts.
    pub vcard: Option<String>,
}

/// Behavioral risk signals for a single user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactors {
    /// Lifetime deleted-message count exceeds 50.
    pub high_deletion_rate: bool,
    /// Last recorded activity is less than a minute old.
    pub rapid_activity: bool,
    /// Media messages make up more than 80% of the user's messages.
    pub media_heavy: bool,
}

impl RiskFactors {
    /// Fraction of risk signals currently raised, in `[0.0, 1.0]`.
    #[must_use]
    pub fn score(&self) -> f64 {
        let raised = u8::from(self.high_deletion_rate)
            + u8::from(self.rapid_activity)
            + u8::from(self.media_heavy);
        f64::from(raised) / 3.0
    }
}

/// Everything the pipeline reports to the host.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A deleted message was recovered and formatted for delivery to the
    /// monitored destination, quoting the recovered message when the
    /// transport supports it.
    Deliver {
        chat: ChatId,
        notification: Notification,
        quoted: Option<MessageId>,
    },
    /// Media could not be fetched after all retry attempts.
    DownloadFailed {
        message: MessageId,
        attempts: u32,
        reason: String,
    },
    /// An internal failure was contained at the pipeline boundary.
    ProcessingError { stage: String, reason: String },
    /// A user's deletion behavior crossed the risk threshold.
    SuspiciousActivity {
        user: UserId,
        score: f64,
        factors: RiskFactors,
    },
}

/// Host-supplied receiver for pipeline events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: PipelineEvent) {}
}
