//! In-memory state for the recovery pipeline.
//!
//! Two concerns live here: a fixed-window per-user [`RateLimiter`] and a
//! TTL-bounded [`MessageCache`] holding recent messages so their content is
//! still at hand when a deletion arrives. Both are fully synchronous
//! internally and safe to share across tasks.

pub mod cache;
pub mod limiter;

pub use cache::MessageCache;
pub use limiter::RateLimiter;
