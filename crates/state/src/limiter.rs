use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::warn;

use remnant_core::{ChatId, UserId};

/// A single (chat, user) counting window.
#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl Window {
    /// Returns `true` once the window's span has fully elapsed.
    fn is_stale(&self, span: Duration) -> bool {
        Instant::now().duration_since(self.started) >= span
    }
}

/// Fixed-window rate limiter keyed by (chat, user), backed by a [`DashMap`].
///
/// Each key gets an independent window; the first event after a window
/// lapses starts a fresh one with a count of 1. The check and the count
/// update happen under the map's entry lock, so interleaved callers cannot
/// corrupt a single key's window. Stale windows are evicted lazily when the
/// same key reappears, or in bulk via [`prune`].
///
/// [`prune`]: RateLimiter::prune
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    span: Duration,
    windows: DashMap<(ChatId, UserId), Window>,
    rejected: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter allowing `limit` events per `span` per (chat, user).
    #[must_use]
    pub fn new(limit: u32, span: Duration) -> Self {
        Self {
            limit,
            span,
            windows: DashMap::new(),
            rejected: AtomicU64::new(0),
        }
    }

    /// Record one event, returning `true` if it is within the limit.
    pub fn admit(&self, chat: &ChatId, user: &UserId) -> bool {
        let mut allowed = true;

        self.windows
            .entry((chat.clone(), user.clone()))
            .and_modify(|window| {
                if window.is_stale(self.span) {
                    window.started = Instant::now();
                    window.count = 1;
                } else if window.count < self.limit {
                    window.count += 1;
                } else {
                    allowed = false;
                }
            })
            .or_insert_with(|| Window {
                started: Instant::now(),
                count: 1,
            });

        if !allowed {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(chat = %chat, user = %user, limit = self.limit, "rate limit exceeded");
        }

        allowed
    }

    /// Drop every window whose span has fully elapsed.
    pub fn prune(&self) {
        self.windows.retain(|_, window| !window.is_stale(self.span));
    }

    /// Number of keys currently holding a window, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Total events rejected since construction.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}
