//! Periodic maintenance for the pipeline's durable and in-memory state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, error, info};

use remnant_archive::Archive;
use remnant_state::{MessageCache, RateLimiter};

use crate::metrics::PipelineMetrics;

/// Runs the retention sweep until shutdown is signaled.
///
/// Each tick purges expired archive rows, drops dead cache entries, prunes
/// stale rate windows, and logs a metrics snapshot. The sweep runs on its
/// own task and never blocks event processing.
pub struct RetentionSweeper {
    archive: Arc<Archive>,
    cache: Arc<MessageCache>,
    limiter: Arc<RateLimiter>,
    metrics: Arc<PipelineMetrics>,
    retention: Duration,
    sweep_interval: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

impl RetentionSweeper {
    /// Create a sweeper and the channel used to stop it.
    #[must_use]
    pub fn new(
        archive: Arc<Archive>,
        cache: Arc<MessageCache>,
        limiter: Arc<RateLimiter>,
        metrics: Arc<PipelineMetrics>,
        retention: Duration,
        sweep_interval: Duration,
    ) -> (Self, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        (
            Self {
                archive,
                cache,
                limiter,
                metrics,
                retention,
                sweep_interval,
                shutdown_rx,
            },
            shutdown_tx,
        )
    }

    /// Run until a shutdown signal arrives. The first sweep happens
    /// immediately, then every `sweep_interval`.
    pub async fn run(mut self) {
        info!(interval_secs = self.sweep_interval.as_secs(), "retention sweeper starting");
        let mut ticker = interval(self.sweep_interval);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("retention sweeper received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    self.sweep().await;
                }
            }
        }

        info!("retention sweeper stopped");
    }

    async fn sweep(&self) {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.retention)
                .unwrap_or_else(|_| chrono::Duration::days(7));
        match self.archive.purge_expired(cutoff).await {
            Ok(removed) => debug!(removed, "retention sweep completed"),
            Err(e) => error!(error = %e, "retention sweep failed"),
        }
        let evicted = self.cache.sweep();
        self.limiter.prune();

        let snapshot = self.metrics.snapshot(self.cache.len(), self.limiter.len());
        info!(
            evicted,
            dispatched = snapshot.dispatched,
            archived = snapshot.archived,
            recovered = snapshot.recovered,
            not_found = snapshot.not_found,
            rate_limited = snapshot.rate_limited,
            discarded = snapshot.discarded,
            duplicates = snapshot.duplicates,
            failed = snapshot.failed,
            cache_size = snapshot.cache_size,
            limiter_size = snapshot.limiter_size,
            "maintenance sweep"
        );
    }
}
