use bytes::Bytes;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

use remnant_core::record::{MessageKind, NewMessage, RecoveredContent};
use remnant_core::{ChatId, MessageId, UserId};

use crate::compress;
use crate::config::ArchiveConfig;
use crate::error::ArchiveError;
use crate::migrations;

/// Outcome of archiving a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// First time this message id was seen.
    Stored { hash: String },
    /// The same id was re-ingested; the prior row was replaced.
    Replaced { hash: String },
    /// A different message id already holds this content hash. Nothing was
    /// written.
    DuplicateContent { hash: String },
}

/// Aggregate per-user counters, as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub user: UserId,
    pub total_messages: i64,
    pub deleted_messages: i64,
    pub media_messages: i64,
    pub last_activity: Option<DateTime<Utc>>,
    pub risk_score: f64,
}

/// A row from the append-only event log.
#[derive(Debug, Clone)]
pub struct EventLogEntry {
    pub event_type: String,
    pub user_id: String,
    pub chat_id: String,
    pub message_id: String,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct LookupRow {
    id: String,
    user: String,
    chat_id: String,
    timestamp: i64,
    body: Option<String>,
    status: Option<i64>,
    size: i64,
    ephemeral: i64,
    mimetype: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
    duration: Option<i64>,
    media_data: Option<Vec<u8>>,
    compressed: Option<i64>,
}

/// SQLite-backed message archive.
///
/// All writes for a single message go through one transaction in [`add`];
/// any failure rolls the whole message back and is propagated, single
/// attempt. Media blobs are compressed on the way in and transparently
/// decompressed by [`lookup`].
///
/// [`add`]: Archive::add
/// [`lookup`]: Archive::lookup
pub struct Archive {
    pool: SqlitePool,
}

impl Archive {
    /// Open the archive described by `config`, creating the database file
    /// and schema as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Connection`] if the pool cannot be created,
    /// or [`ArchiveError::Backend`] if migrations fail.
    pub async fn connect(config: &ArchiveConfig) -> Result<Self, ArchiveError> {
        let options: SqliteConnectOptions = config
            .url
            .parse::<SqliteConnectOptions>()
            .map_err(|e| ArchiveError::Connection(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size)
            .connect_with(options)
            .await
            .map_err(|e| ArchiveError::Connection(e.to_string()))?;

        Self::from_pool(pool).await
    }

    /// Build an archive over an existing pool, running migrations.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Backend`] if migrations fail.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, ArchiveError> {
        migrations::run_migrations(&pool)
            .await
            .map_err(|e| ArchiveError::Backend(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Archive one message: message row, optional metadata row, optional
    /// compressed media row, and the user-stats upsert, in one transaction.
    ///
    /// Re-ingesting an id replaces its row (last-write-wins). A content
    /// hash already held by a *different* id is rejected without writing.
    pub async fn add(&self, record: &NewMessage) -> Result<AddOutcome, ArchiveError> {
        let hash = record.dedup_hash();
        let mut tx = self.pool.begin().await?;

        // Same content hash under another id: skip, never overwrite.
        let holder: Option<(String,)> = sqlx::query_as("SELECT id FROM messages WHERE hash = ?")
            .bind(&hash)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some((existing_id,)) = holder {
            if existing_id != *record.id {
                debug!(
                    message = %record.id,
                    holder = %existing_id,
                    "content hash already archived under another id"
                );
                return Ok(AddOutcome::DuplicateContent { hash });
            }
        }

        let existing: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM messages WHERE id = ?")
            .bind(record.id.as_str())
            .fetch_optional(&mut *tx)
            .await?;
        let replaced = existing.is_some();

        sqlx::query(
            "INSERT INTO messages (id, user, chat_id, timestamp, body, type, status, hash, size, ephemeral) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (id) DO UPDATE SET \
                 user = excluded.user, \
                 chat_id = excluded.chat_id, \
                 timestamp = excluded.timestamp, \
                 body = excluded.body, \
                 type = excluded.type, \
                 status = excluded.status, \
                 hash = excluded.hash, \
                 size = excluded.size, \
                 ephemeral = excluded.ephemeral, \
                 updated_at = strftime('%s', 'now')",
        )
        .bind(record.id.as_str())
        .bind(record.user.as_str())
        .bind(record.chat.as_str())
        .bind(record.timestamp.timestamp())
        .bind(&record.body)
        .bind(record.kind.label())
        .bind(record.kind.status_code())
        .bind(&hash)
        .bind(i64::try_from(record.size()).unwrap_or(i64::MAX))
        .bind(i64::from(record.ephemeral))
        .execute(&mut *tx)
        .await?;

        let has_metadata = record.mimetype.is_some()
            || record.width.is_some()
            || record.height.is_some()
            || record.duration_secs.is_some()
            || record.file_length.is_some()
            || record.thumbnail.is_some();
        if has_metadata {
            sqlx::query(
                "INSERT INTO message_metadata \
                     (message_id, mimetype, width, height, duration, file_length, thumbnail) \
                 VALUES (?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT (message_id) DO UPDATE SET \
                     mimetype = excluded.mimetype, \
                     width = excluded.width, \
                     height = excluded.height, \
                     duration = excluded.duration, \
                     file_length = excluded.file_length, \
                     thumbnail = excluded.thumbnail",
            )
            .bind(record.id.as_str())
            .bind(&record.mimetype)
            .bind(record.width.map(i64::from))
            .bind(record.height.map(i64::from))
            .bind(record.duration_secs.map(i64::from))
            .bind(
                record
                    .file_length
                    .map(|v| i64::try_from(v).unwrap_or(i64::MAX)),
            )
            .bind(&record.thumbnail)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(media) = &record.media {
            let stored = compress::compress(media);
            sqlx::query(
                "INSERT INTO media_storage \
                     (message_id, media_data, compressed, original_size, compressed_size) \
                 VALUES (?, ?, ?, ?, ?) \
                 ON CONFLICT (message_id) DO UPDATE SET \
                     media_data = excluded.media_data, \
                     compressed = excluded.compressed, \
                     original_size = excluded.original_size, \
                     compressed_size = excluded.compressed_size",
            )
            .bind(record.id.as_str())
            .bind(&stored.data)
            .bind(i64::from(stored.compressed))
            .bind(i64::try_from(media.len()).unwrap_or(i64::MAX))
            .bind(i64::try_from(stored.data.len()).unwrap_or(i64::MAX))
            .execute(&mut *tx)
            .await?;
        }

        let media_delta = i64::from(record.kind.counts_as_media());
        sqlx::query(
            "INSERT INTO user_stats \
                 (user_id, total_messages, deleted_messages, media_messages, last_activity) \
             VALUES (?, 1, ?, ?, ?) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 total_messages = total_messages + 1, \
                 deleted_messages = deleted_messages + excluded.deleted_messages, \
                 media_messages = media_messages + excluded.media_messages, \
                 last_activity = excluded.last_activity",
        )
        .bind(record.user.as_str())
        .bind(media_delta)
        .bind(media_delta)
        .bind(Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if replaced {
            Ok(AddOutcome::Replaced { hash })
        } else {
            Ok(AddOutcome::Stored { hash })
        }
    }

    /// Fetch an archived message with its metadata and media, scoped to the
    /// owning user. Media is decompressed transparently.
    pub async fn lookup(
        &self,
        user: &UserId,
        id: &MessageId,
    ) -> Result<Option<RecoveredContent>, ArchiveError> {
        let row: Option<LookupRow> = sqlx::query_as(
            "SELECT \
                 m.id, m.user, m.chat_id, m.timestamp, m.body, m.status, \
                 m.size, m.ephemeral, \
                 mm.mimetype, mm.width, mm.height, mm.duration, \
                 ms.media_data, ms.compressed \
             FROM messages m \
             LEFT JOIN message_metadata mm ON m.id = mm.message_id \
             LEFT JOIN media_storage ms ON m.id = ms.message_id \
             WHERE m.id = ? AND m.user = ?",
        )
        .bind(id.as_str())
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let media = row.media_data.map(|data| {
                Bytes::from(compress::decompress(&data, row.compressed.unwrap_or(0) != 0))
            });
            RecoveredContent {
                id: MessageId::new(row.id),
                user: UserId::new(row.user),
                chat: ChatId::new(row.chat_id),
                timestamp: DateTime::from_timestamp(row.timestamp, 0).unwrap_or_default(),
                body: row.body.unwrap_or_default(),
                kind: MessageKind::from_status(row.status.unwrap_or(-1)),
                size: u64::try_from(row.size).unwrap_or(0),
                ephemeral: row.ephemeral != 0,
                mimetype: row.mimetype,
                width: row.width.and_then(|v| u32::try_from(v).ok()),
                height: row.height.and_then(|v| u32::try_from(v).ok()),
                duration_secs: row.duration.and_then(|v| u32::try_from(v).ok()),
                media,
            }
        }))
    }

    /// Read a user's aggregate counters.
    pub async fn user_stats(&self, user: &UserId) -> Result<Option<UserStats>, ArchiveError> {
        let row: Option<(i64, i64, i64, Option<i64>, f64)> = sqlx::query_as(
            "SELECT total_messages, deleted_messages, media_messages, last_activity, risk_score \
             FROM user_stats WHERE user_id = ?",
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(total_messages, deleted_messages, media_messages, last_activity, risk_score)| {
                UserStats {
                    user: user.clone(),
                    total_messages,
                    deleted_messages,
                    media_messages,
                    last_activity: last_activity.and_then(|s| DateTime::from_timestamp(s, 0)),
                    risk_score,
                }
            },
        ))
    }

    /// Delete message rows older than `cutoff`, except image and video
    /// rows, which are retained indefinitely. Dependent metadata and media
    /// rows cascade. Returns the number of message rows removed.
    pub async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, ArchiveError> {
        let result = sqlx::query("DELETE FROM messages WHERE timestamp < ? AND status NOT IN (?, ?)")
            .bind(cutoff.timestamp())
            .bind(MessageKind::Image.status_code())
            .bind(MessageKind::Video.status_code())
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!(removed, "retention sweep removed expired messages");
        }
        Ok(removed)
    }

    /// Append a diagnostic record to the event log. Never read back by the
    /// pipeline.
    pub async fn log_event(
        &self,
        event_type: &str,
        user: &UserId,
        chat: &ChatId,
        message_id: &MessageId,
        details: &serde_json::Value,
    ) -> Result<(), ArchiveError> {
        sqlx::query(
            "INSERT INTO event_logs (event_type, user_id, chat_id, message_id, details) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(event_type)
        .bind(user.as_str())
        .bind(chat.as_str())
        .bind(message_id.as_str())
        .bind(details.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent event-log rows, newest first.
    pub async fn recent_events(&self, limit: u32) -> Result<Vec<EventLogEntry>, ArchiveError> {
        let rows: Vec<(
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            i64,
        )> = sqlx::query_as(
            "SELECT event_type, user_id, chat_id, message_id, details, timestamp \
             FROM event_logs ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(event_type, user_id, chat_id, message_id, details, timestamp)| EventLogEntry {
                    event_type: event_type.unwrap_or_default(),
                    user_id: user_id.unwrap_or_default(),
                    chat_id: chat_id.unwrap_or_default(),
                    message_id: message_id.unwrap_or_default(),
                    details: details
                        .and_then(|d| serde_json::from_str(&d).ok())
                        .unwrap_or(serde_json::Value::Null),
                    timestamp: DateTime::from_timestamp(timestamp, 0).unwrap_or_default(),
                },
            )
            .collect())
    }
}
