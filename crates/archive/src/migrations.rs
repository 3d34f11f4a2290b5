use sqlx::SqlitePool;

/// Run database migrations, creating required tables if they do not exist.
///
/// Creates the five archive relations and their query indexes. Foreign keys
/// are declared with `ON DELETE CASCADE` so a retention sweep of message
/// rows takes dependent metadata and media rows with it; enforcement is
/// enabled per-connection by the pool's connect options.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let create_messages = "CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            user TEXT NOT NULL,
            chat_id TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            body TEXT,
            type TEXT,
            status INTEGER,
            hash TEXT UNIQUE,
            size INTEGER DEFAULT 0,
            ephemeral INTEGER DEFAULT 0,
            created_at INTEGER DEFAULT (strftime('%s', 'now')),
            updated_at INTEGER DEFAULT (strftime('%s', 'now'))
        )";

    let create_metadata = "CREATE TABLE IF NOT EXISTS message_metadata (
            message_id TEXT PRIMARY KEY,
            mimetype TEXT,
            width INTEGER,
            height INTEGER,
            duration INTEGER,
            file_length INTEGER,
            thumbnail BLOB,
            FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE
        )";

    let create_media = "CREATE TABLE IF NOT EXISTS media_storage (
            message_id TEXT PRIMARY KEY,
            media_data BLOB,
            compressed INTEGER DEFAULT 0,
            original_size INTEGER,
            compressed_size INTEGER,
            FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE
        )";

    let create_user_stats = "CREATE TABLE IF NOT EXISTS user_stats (
            user_id TEXT PRIMARY KEY,
            total_messages INTEGER DEFAULT 0,
            deleted_messages INTEGER DEFAULT 0,
            media_messages INTEGER DEFAULT 0,
            last_activity INTEGER,
            risk_score REAL DEFAULT 0.0
        )";

    let create_event_logs = "CREATE TABLE IF NOT EXISTS event_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_type TEXT,
            user_id TEXT,
            chat_id TEXT,
            message_id TEXT,
            details TEXT,
            timestamp INTEGER DEFAULT (strftime('%s', 'now'))
        )";

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_messages_user_time ON messages(user, timestamp DESC)",
        "CREATE INDEX IF NOT EXISTS idx_messages_chat_time ON messages(chat_id, timestamp DESC)",
        "CREATE INDEX IF NOT EXISTS idx_messages_status ON messages(status)",
        "CREATE INDEX IF NOT EXISTS idx_messages_hash ON messages(hash)",
        "CREATE INDEX IF NOT EXISTS idx_user_stats_activity ON user_stats(last_activity)",
        "CREATE INDEX IF NOT EXISTS idx_event_logs_time ON event_logs(timestamp DESC)",
    ];

    sqlx::query(create_messages).execute(pool).await?;
    sqlx::query(create_metadata).execute(pool).await?;
    sqlx::query(create_media).execute(pool).await?;
    sqlx::query(create_user_stats).execute(pool).await?;
    sqlx::query(create_event_logs).execute(pool).await?;

    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}
