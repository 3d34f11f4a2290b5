use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use remnant_core::{MessageId, NewMessage};

/// A cached message together with its eviction deadline.
#[derive(Debug, Clone)]
struct Entry {
    message: NewMessage,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// TTL-bounded cache of recently seen messages, keyed by message id.
///
/// A deletion can only be recovered while the original message is still
/// cached, so the TTL is the recovery horizon. Expired entries are lazily
/// evicted on read; [`sweep`] removes them in bulk.
///
/// [`sweep`]: MessageCache::sweep
#[derive(Debug)]
pub struct MessageCache {
    ttl: Duration,
    entries: DashMap<MessageId, Entry>,
}

impl MessageCache {
    /// Create a cache whose entries live for `ttl` after insertion.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Cache a message. Re-inserting the same id refreshes its deadline.
    pub fn put(&self, message: NewMessage) {
        self.entries.insert(
            message.id.clone(),
            Entry {
                message,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Fetch a cached message by id.
    ///
    /// Returns `None` once the entry's TTL has elapsed, removing it on the
    /// way out. The entry itself stays cached so repeated deletions of the
    /// same id within the TTL still resolve.
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<NewMessage> {
        if let Some(entry) = self.entries.get(id) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(id);
                return None;
            }
            return Some(entry.message.clone());
        }
        None
    }

    /// Drop every expired entry, returning how many were evicted.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before - self.entries.len()
    }

    /// Number of cached entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use remnant_core::record::MessageKind;
    use remnant_core::{ChatId, UserId};

    use super::*;

    fn sample(id: &str) -> NewMessage {
        NewMessage {
            id: MessageId::new(id),
            user: UserId::new("u@s.whatsapp.net"),
            chat: ChatId::new("123@g.us"),
            timestamp: Utc::now(),
            body: "hello".to_owned(),
            kind: MessageKind::Text,
            ephemeral: false,
            mimetype: None,
            width: None,
            height: None,
            duration_secs: None,
            file_length: None,
            thumbnail: None,
            media: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn get_returns_live_entries() {
        let cache = MessageCache::new(Duration::from_secs(300));
        cache.put(sample("m1"));

        let found = cache.get(&MessageId::new("m1"));
        assert_eq!(found.map(|m| m.body), Some("hello".to_owned()));
        assert!(cache.get(&MessageId::new("m2")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MessageCache::new(Duration::from_secs(300));
        cache.put(sample("m1"));

        tokio::time::advance(Duration::from_secs(301)).await;

        assert!(cache.get(&MessageId::new("m1")).is_none());
        assert!(cache.is_empty(), "expired entry is removed on read");
    }

    #[tokio::test(start_paused = true)]
    async fn reinsert_refreshes_deadline() {
        let cache = MessageCache::new(Duration::from_secs(300));
        cache.put(sample("m1"));

        tokio::time::advance(Duration::from_secs(200)).await;
        cache.put(sample("m1"));
        tokio::time::advance(Duration::from_secs(200)).await;

        assert!(cache.get(&MessageId::new("m1")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_get_within_ttl_keeps_entry() {
        let cache = MessageCache::new(Duration::from_secs(300));
        cache.put(sample("m1"));

        assert!(cache.get(&MessageId::new("m1")).is_some());
        assert!(cache.get(&MessageId::new("m1")).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired() {
        let cache = MessageCache::new(Duration::from_secs(300));
        cache.put(sample("old"));

        tokio::time::advance(Duration::from_secs(301)).await;
        cache.put(sample("new"));
        let evicted = cache.sweep();

        assert_eq!(evicted, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&MessageId::new("new")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_reports_zero_when_nothing_expired() {
        let cache = MessageCache::new(Duration::from_secs(300));
        cache.put(sample("m1"));
        cache.put(sample("m2"));

        assert_eq!(cache.sweep(), 0);
        assert_eq!(cache.len(), 2);
    }
}
