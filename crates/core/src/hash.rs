//! Dedup hash computation for archived messages.
//!
//! The hash collapses duplicate deliveries of the same content: two events
//! from the same user with the same body inside the same wall-clock second
//! produce the same fingerprint.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::types::UserId;

/// Compute the dedup hash for a message.
///
/// The hash is a hex-encoded SHA-256 of `user:body:seconds`, where the
/// timestamp is truncated to whole seconds. An absent body contributes the
/// empty string.
#[must_use]
pub fn content_hash(user: &UserId, body: &str, timestamp: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(body.as_bytes());
    hasher.update(b":");
    hasher.update(timestamp.timestamp().to_string().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn identical_inputs_hash_identically() {
        let user = UserId::new("u1@s.whatsapp.net");
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(
            content_hash(&user, "hello", ts),
            content_hash(&user, "hello", ts)
        );
    }

    #[test]
    fn sub_second_jitter_is_collapsed() {
        let user = UserId::new("u1@s.whatsapp.net");
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let later = base + chrono::Duration::milliseconds(400);
        assert_eq!(
            content_hash(&user, "hello", base),
            content_hash(&user, "hello", later)
        );
    }

    #[test]
    fn next_second_changes_the_hash() {
        let user = UserId::new("u1@s.whatsapp.net");
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let next = base + chrono::Duration::seconds(1);
        assert_ne!(
            content_hash(&user, "hello", base),
            content_hash(&user, "hello", next)
        );
    }

    #[test]
    fn body_and_user_are_significant() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let a = UserId::new("a@s.whatsapp.net");
        let b = UserId::new("b@s.whatsapp.net");
        assert_ne!(content_hash(&a, "x", ts), content_hash(&b, "x", ts));
        assert_ne!(content_hash(&a, "x", ts), content_hash(&a, "y", ts));
    }

    #[test]
    fn hash_is_hex_sha256() {
        let user = UserId::new("u1@s.whatsapp.net");
        let h = content_hash(&user, "", Utc::now());
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
