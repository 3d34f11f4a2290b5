pub mod classify;
pub mod error;
pub mod event;
pub mod hash;
pub mod message;
pub mod record;
pub mod types;

pub use classify::{Classification, classify, extract_preview, format_bytes, is_media_capable};
pub use error::RemnantError;
pub use event::{EventSink, Notification, NullSink, PipelineEvent, RiskFactors};
pub use hash::content_hash;
pub use message::{
    CalendarEvent, ContactCard, InboundMessage, LocationPin, MediaContent, MessageContent,
    ProtocolAction, SystemStub,
};
pub use record::{DeletionContext, MessageKind, NewMessage, RecoveredContent};
pub use types::{ChatId, MessageId, UserId};
