//! Store-facing traits consumed by the sequence backends.
//!
//! Nothing in this crate talks to a concrete server. Each backend is generic
//! over one of these traits; production adapters wrap a network client, and
//! tests use the deterministic implementations in [`crate::test_support`].

use std::time::Duration;

use async_trait::async_trait;
use snafu::Snafu;

/// Errors from the backing store or the mutex service.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// Network or protocol failure talking to the store.
    #[snafu(display("store connection failure: {reason}"))]
    Connection {
        /// Description of the failure.
        reason: String,
    },

    /// The store rejected or failed a script execution.
    #[snafu(display("script execution failed: {reason}"))]
    Script {
        /// Description of what went wrong.
        reason: String,
    },

    /// The stored value is not a decimal integer.
    #[snafu(display("value at '{key}' is not an integer: {value:?}"))]
    NonNumericValue {
        /// The key holding the bad value.
        key: String,
        /// The raw stored value.
        value: String,
    },

    /// A persisted lease entry could not be decoded.
    #[snafu(display("lease entry for '{name}' is malformed: {reason}"))]
    MalformedLease {
        /// The lock name the entry belongs to.
        name: String,
        /// Description of the decode failure.
        reason: String,
    },
}

/// A store that executes a short atomic script against a single key.
///
/// The store must run the whole script as one indivisible unit per key:
/// concurrent calls on the same key are linearized by the store, not by this
/// client.
#[async_trait]
pub trait ScriptStore: Send + Sync {
    /// Execute a counter script against `key`.
    ///
    /// Arguments are decimal strings; the script parses them back to numbers
    /// before arithmetic. Returns `None` when the script signals absence
    /// (no value existed and no default was supplied).
    async fn eval_counter_script(&self, script: &str, key: &str, args: &[String])
        -> Result<Option<i64>, StoreError>;

    /// Read the counter at `key`, `None` when absent.
    async fn get_counter(&self, key: &str) -> Result<Option<i64>, StoreError>;

    /// Overwrite the counter at `key`.
    async fn set_counter(&self, key: &str, value: i64) -> Result<(), StoreError>;

    /// Delete the counter at `key`. Returns whether a value was removed.
    async fn delete_counter(&self, key: &str) -> Result<bool, StoreError>;
}

/// A store exposing only a bare atomic integer per key.
#[async_trait]
pub trait AtomicStore: Send + Sync {
    /// Check whether `key` holds a value.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Read the integer at `key`.
    ///
    /// Returns 0 when the key is absent, so callers must use
    /// [`exists`](Self::exists) rather than trust a zero as "uninitialized".
    async fn get(&self, key: &str) -> Result<i64, StoreError>;

    /// Overwrite the integer at `key`.
    async fn set(&self, key: &str, value: i64) -> Result<(), StoreError>;

    /// Atomically add `delta` to `key` and return the new value.
    async fn add_and_get(&self, key: &str, delta: i64) -> Result<i64, StoreError>;

    /// Delete `key`, returning whether a value was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

/// A named distributed mutex with a bounded wait and a bounded lease.
#[async_trait]
pub trait DistributedMutex: Send + Sync {
    /// Try to acquire `name`, waiting up to `wait`.
    ///
    /// An acquired lock auto-expires after `lease`, so a crashed holder
    /// cannot block others forever. Returns `false` when the wait bound
    /// elapses without acquisition.
    async fn try_acquire(&self, name: &str, wait: Duration, lease: Duration) -> Result<bool, StoreError>;

    /// Release `name`. Only the current holder may call this.
    async fn release(&self, name: &str) -> Result<(), StoreError>;
}
