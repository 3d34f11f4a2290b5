//! Media fetching.
//!
//! The primary fetch path is a host-supplied [`MediaFetcher`] capability;
//! when none is available at startup, [`DisabledFetcher`] stands in and
//! every fetch resolves to nothing. [`RetryDownloader`] wraps the capability
//! with bounded retries and exponential backoff. [`DirectFetcher`] covers
//! broadcast-channel media, which is served from a plain HTTPS URL instead
//! of the primary path.

pub mod direct;
pub mod error;
pub mod fetcher;
pub mod retry;

pub use direct::DirectFetcher;
pub use error::FetchError;
pub use fetcher::{DisabledFetcher, MediaFetcher};
pub use retry::RetryDownloader;
