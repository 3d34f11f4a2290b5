use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters tracking pipeline outcomes.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Events that passed the rate gate and reached a handler.
    pub dispatched: AtomicU64,
    /// Messages written to the archive.
    pub archived: AtomicU64,
    /// Deletion events successfully recovered and delivered.
    pub recovered: AtomicU64,
    /// Deletion events with no archived content on either path.
    pub not_found: AtomicU64,
    /// Events dropped by the rate limiter.
    pub rate_limited: AtomicU64,
    /// Messages classified as unsupported and not archived.
    pub discarded: AtomicU64,
    /// Messages skipped because their content was already archived under
    /// another id.
    pub duplicates: AtomicU64,
    /// Handler invocations that failed and were contained at the boundary.
    pub failed: AtomicU64,
}

impl PipelineMetrics {
    pub fn increment_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_archived(&self) {
        self.archived.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_recovered(&self) {
        self.recovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_duplicates(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a consistent point-in-time snapshot of all counters, together
    /// with the current cache and limiter sizes.
    pub fn snapshot(&self, cache_size: usize, limiter_size: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            archived: self.archived.load(Ordering::Relaxed),
            recovered: self.recovered.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cache_size,
            limiter_size,
        }
    }
}

/// A plain data snapshot of [`PipelineMetrics`] at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Events that passed the rate gate and reached a handler.
    pub dispatched: u64,
    /// Messages written to the archive.
    pub archived: u64,
    /// Deletion events successfully recovered and delivered.
    pub recovered: u64,
    /// Deletion events with no archived content.
    pub not_found: u64,
    /// Events dropped by the rate limiter.
    pub rate_limited: u64,
    /// Messages classified as unsupported and not archived.
    pub discarded: u64,
    /// Messages skipped as already-archived content.
    pub duplicates: u64,
    /// Handler invocations that failed.
    pub failed: u64,
    /// Live entries in the message cache.
    pub cache_size: usize,
    /// Keys currently tracked by the rate limiter.
    pub limiter_size: usize,
}
