//! Error types for sequence operations.

use snafu::Snafu;

use crate::store::StoreError;

/// Errors surfaced by [`Sequence`](crate::Sequence) operations.
///
/// None of these are retried or recovered internally; every failure reaches
/// the caller synchronously. Silent retry could mask double-initialization
/// or lost-update bugs, so callers that want resilience apply retry/backoff
/// above this layer.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SequenceError {
    /// Step was zero or negative. Rejected before any network access.
    #[snafu(display("step must be a positive integer, got {step}"))]
    InvalidStep {
        /// The rejected step value.
        step: i64,
    },

    /// Communication with the backing store failed.
    #[snafu(display("store communication failure: {source}"))]
    Store {
        /// The underlying store error.
        source: StoreError,
    },

    /// Timed out waiting for the initialization mutex.
    #[snafu(display("failed to acquire lock '{name}' within {wait_ms}ms"))]
    LockAcquisition {
        /// The lock name.
        name: String,
        /// How long the call was willing to wait.
        wait_ms: u64,
    },

    /// The counter is still absent after a lock-guarded initialization
    /// completed. An internal-consistency violation, not a transient fault.
    #[snafu(display("counter '{key}' is uninitialized after initialization completed"))]
    Uninitialized {
        /// The counter key.
        key: String,
    },

    /// The stored value could not be interpreted as a counter.
    #[snafu(display("corrupted counter value at '{key}': {reason}"))]
    CorruptedValue {
        /// The counter key.
        key: String,
        /// Description of what was found.
        reason: String,
    },

    /// A computed counter value fell outside the i64 range.
    #[snafu(display("counter '{key}' exceeded the representable value range"))]
    ValueRangeExceeded {
        /// The counter key.
        key: String,
    },
}

impl From<StoreError> for SequenceError {
    fn from(source: StoreError) -> Self {
        match source {
            StoreError::NonNumericValue { key, value } => SequenceError::CorruptedValue {
                key,
                reason: format!("not a valid i64: {value:?}"),
            },
            other => SequenceError::Store { source: other },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_step_display() {
        let err = SequenceError::InvalidStep { step: -5 };
        assert_eq!(err.to_string(), "step must be a positive integer, got -5");
    }

    #[test]
    fn non_numeric_store_error_maps_to_corrupted_value() {
        let err: SequenceError = StoreError::NonNumericValue {
            key: "orders".to_string(),
            value: "banana".to_string(),
        }
        .into();
        assert!(matches!(err, SequenceError::CorruptedValue { ref key, .. } if key == "orders"));
    }

    #[test]
    fn connection_store_error_maps_to_store() {
        let err: SequenceError = StoreError::Connection {
            reason: "refused".to_string(),
        }
        .into();
        assert!(matches!(err, SequenceError::Store { .. }));
    }
}
