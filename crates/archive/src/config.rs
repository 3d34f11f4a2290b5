/// Configuration for the SQLite archive.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// SQLite connection URL (e.g. `sqlite://remnant.db`).
    pub url: String,

    /// Maximum number of connections in the `sqlx` connection pool.
    pub pool_size: u32,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            url: String::from("sqlite://remnant.db"),
            pool_size: 5,
        }
    }
}

impl ArchiveConfig {
    /// Configuration for an in-memory database.
    ///
    /// The pool is capped at a single connection: each connection to
    /// `sqlite::memory:` opens its own private database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            url: String::from("sqlite::memory:"),
            pool_size: 1,
        }
    }
}
