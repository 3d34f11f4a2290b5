use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

/// Monitored destination ids must be a numeric group id at the group
/// domain. Placeholder values left in a config template fail this pattern.
static MONITOR_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+@g\.us$").unwrap_or_else(|_| unreachable!("pattern is valid"))
});

/// Whether `id` is a usable monitored destination.
#[must_use]
pub fn is_valid_monitor_id(id: &str) -> bool {
    MONITOR_ID.is_match(id)
}

/// Tunables for the event router and its periodic maintenance.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Destination chat that receives recovery notifications. An invalid
    /// or placeholder value disables the whole pipeline at startup.
    pub monitor: String,

    /// How long archived rows live before the retention sweep removes them.
    pub retention: Duration,

    /// Lifetime of cached messages; also the recovery fast-path horizon.
    pub cache_ttl: Duration,

    /// Rate limiter window span.
    pub rate_window: Duration,

    /// Events admitted per (chat, user) per window.
    pub rate_limit: u32,

    /// Download attempts before a fetch gives up.
    pub max_download_attempts: u32,

    /// How often the retention sweep runs.
    pub sweep_interval: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            monitor: String::new(),
            retention: Duration::from_secs(7 * 24 * 60 * 60),
            cache_ttl: Duration::from_secs(300),
            rate_window: Duration::from_secs(60),
            rate_limit: 50,
            max_download_attempts: 3,
            sweep_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_group_ids_are_valid() {
        assert!(is_valid_monitor_id("123456789@g.us"));
        assert!(is_valid_monitor_id("1@g.us"));
    }

    #[test]
    fn placeholder_and_malformed_ids_are_invalid() {
        assert!(!is_valid_monitor_id("YOUR_LOG_GROUP_ID_HERE@g.us"));
        assert!(!is_valid_monitor_id(""));
        assert!(!is_valid_monitor_id("123456789@s.whatsapp.net"));
        assert!(!is_valid_monitor_id("123456789@g.us "));
        assert!(!is_valid_monitor_id("abc@g.us"));
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = RouterConfig::default();
        assert_eq!(cfg.retention, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(cfg.cache_ttl, Duration::from_secs(300));
        assert_eq!(cfg.rate_window, Duration::from_secs(60));
        assert_eq!(cfg.rate_limit, 50);
        assert_eq!(cfg.max_download_attempts, 3);
    }
}
