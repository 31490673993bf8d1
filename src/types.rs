//! Shared types for mutex implementations.

use serde::Deserialize;
use serde::Serialize;

/// Lease entry recorded by a mutex implementation while a lock is held.
///
/// Serialized as JSON for human readability and debugging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MutexLease {
    /// The lock name this lease belongs to.
    pub name: String,
    /// When the lock was acquired (Unix timestamp milliseconds).
    pub acquired_at_ms: u64,
    /// Lease duration in milliseconds.
    pub lease_ms: u64,
    /// Deadline = acquired_at_ms + lease_ms.
    pub deadline_ms: u64,
}

impl MutexLease {
    /// Create a lease starting now.
    pub fn new(name: impl Into<String>, lease_ms: u64) -> Self {
        let acquired_at_ms = now_unix_ms();
        Self {
            name: name.into(),
            acquired_at_ms,
            lease_ms,
            deadline_ms: acquired_at_ms.saturating_add(lease_ms),
        }
    }

    /// Check if this lease has expired.
    pub fn is_expired(&self) -> bool {
        now_unix_ms() > self.deadline_ms
    }

    /// Remaining lease time in milliseconds (0 if expired).
    pub fn remaining_ms(&self) -> u64 {
        self.deadline_ms.saturating_sub(now_unix_ms())
    }
}

/// Get current Unix timestamp in milliseconds.
///
/// Returns 0 if system time is before the Unix epoch rather than panicking.
#[inline]
pub fn now_unix_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_lease_is_not_expired() {
        let lease = MutexLease::new("lock:sequence:orders", 30_000);
        assert!(!lease.is_expired());
        assert!(lease.remaining_ms() > 29_000);
    }

    #[test]
    fn past_deadline_lease_is_expired() {
        let lease = MutexLease {
            name: "lock:sequence:orders".to_string(),
            acquired_at_ms: now_unix_ms() - 10_000,
            lease_ms: 5_000,
            deadline_ms: now_unix_ms() - 5_000,
        };
        assert!(lease.is_expired());
        assert_eq!(lease.remaining_ms(), 0);
    }

    #[test]
    fn lease_round_trips_through_json() {
        let lease = MutexLease::new("lock:sequence:orders", 10_000);
        let raw = serde_json::to_string(&lease).unwrap();
        let decoded: MutexLease = serde_json::from_str(&raw).unwrap();
        assert_eq!(decoded, lease);
    }
}
