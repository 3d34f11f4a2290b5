use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use remnant_archive::Archive;
use remnant_core::{EventSink, PipelineEvent, RiskFactors, UserId};

/// Risk score above which a `SuspiciousActivity` event is emitted.
const ALERT_THRESHOLD: f64 = 0.6;

/// A user's risk score with the factors behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAssessment {
    pub score: f64,
    pub factors: RiskFactors,
}

/// Scores a user's deletion behavior from their aggregate stats.
///
/// A pure read: the analyzer never mutates stats. Three boolean factors
/// each contribute a third of the score; crossing the alert threshold
/// emits a `SuspiciousActivity` event. A stats read failure degrades to a
/// zero score rather than failing the deletion handler.
pub struct BehaviorAnalyzer {
    archive: Arc<Archive>,
    sink: Arc<dyn EventSink>,
}

impl BehaviorAnalyzer {
    #[must_use]
    pub fn new(archive: Arc<Archive>, sink: Arc<dyn EventSink>) -> Self {
        Self { archive, sink }
    }

    /// Assess `user`, emitting an alert when the score crosses the
    /// threshold.
    pub async fn assess(&self, user: &UserId) -> RiskAssessment {
        let stats = match self.archive.user_stats(user).await {
            Ok(Some(stats)) => stats,
            Ok(None) => {
                return RiskAssessment {
                    score: 0.0,
                    factors: RiskFactors::default(),
                };
            }
            Err(err) => {
                warn!(user = %user, error = %err, "behavior analysis failed");
                return RiskAssessment {
                    score: 0.0,
                    factors: RiskFactors::default(),
                };
            }
        };

        let rapid_activity = stats
            .last_activity
            .is_some_and(|last| (Utc::now() - last).num_seconds() < 60);
        #[allow(clippy::cast_precision_loss)]
        let media_heavy = stats.media_messages as f64 > stats.total_messages as f64 * 0.8;
        let factors = RiskFactors {
            high_deletion_rate: stats.deleted_messages > 50,
            rapid_activity,
            media_heavy,
        };
        let score = factors.score();

        if score > ALERT_THRESHOLD {
            self.sink.emit(PipelineEvent::SuspiciousActivity {
                user: user.clone(),
                score,
                factors,
            });
        }

        RiskAssessment { score, factors }
    }
}
