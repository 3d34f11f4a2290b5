//! Durable archive for captured messages.
//!
//! Backed by SQLite through `sqlx`. Five relations: the message rows
//! themselves, per-message metadata, compressed media blobs, per-user
//! aggregate stats, and an append-only event log. Writes for a single
//! message happen in one transaction; a failure rolls the whole message
//! back.

pub mod compress;
pub mod config;
pub mod error;
pub mod migrations;
pub mod store;

pub use config::ArchiveConfig;
pub use error::ArchiveError;
pub use store::{AddOutcome, Archive, EventLogEntry, UserStats};
