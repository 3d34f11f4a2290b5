//! The recovery pipeline.
//!
//! [`EventRouter`] is the entry point: every inbound event passes the rate
//! limiter gate, then dispatches by kind. New messages are classified,
//! their media fetched, and handed to the archive; deletion events resolve
//! the original content (cache first, durable store as fallback), run the
//! behavior analyzer, and render a notification for the delivery
//! collaborator. A failure inside any handler is contained at the router
//! boundary and reported as an outcome, never a panic or a propagated
//! error.

pub mod analyzer;
pub mod config;
pub mod metrics;
pub mod notify;
pub mod router;
pub mod sweeper;

pub use analyzer::{BehaviorAnalyzer, RiskAssessment};
pub use config::RouterConfig;
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use notify::{AddressScope, NotificationBuilder};
pub use router::{EventOutcome, EventRouter, InboundEvent, RejectReason, RouterBuilder};
pub use sweeper::RetentionSweeper;
