//! The sequence contract shared by every backend.

use async_trait::async_trait;
use snafu::ensure;
use snafu::OptionExt;

use crate::error::InvalidStepSnafu;
use crate::error::SequenceError;
use crate::error::UninitializedSnafu;
use crate::error::ValueRangeExceededSnafu;
use crate::pure::fallback_default;
use crate::pure::is_valid_step;

/// Deferred computation producing a sequence's initial value.
///
/// Invoked only when the sequence has never been initialized in the store
/// and the caller supplies no explicit default.
pub type InitialValueSupplier = Box<dyn Fn() -> i64 + Send + Sync>;

/// A named, remotely stored monotonic counter.
///
/// Implementations are stateless between calls: the remote key is the only
/// source of truth, and no value is ever cached client-side. A cache would
/// reintroduce the read-modify-write race this crate exists to avoid.
#[async_trait]
pub trait Sequence: Send + Sync {
    /// The key identifying this sequence in the store's namespace.
    fn key(&self) -> &str;

    /// Read-only view of the sequence: the remote value when present,
    /// otherwise the configured initial value. Never mutates the store.
    async fn current_value(&self) -> Result<i64, SequenceError>;

    /// The atomic primitive behind [`next`](Self::next).
    ///
    /// - Key exists: atomically add `step`, return the new value.
    /// - Key absent, `default` supplied: atomically initialize the key to
    ///   `default` and return exactly `default` (not `default + step`).
    /// - Key absent, no default: no mutation, return `None`.
    async fn raw_next(&self, step: i64, default: Option<i64>) -> Result<Option<i64>, SequenceError>;

    /// Increment the sequence by `step`, initializing it on first use.
    ///
    /// First attempts `raw_next(step, None)`. When the key has never been
    /// written that returns `None`, so a fallback default of
    /// `current_value() + step` is computed in a separate read round trip
    /// and committed with a second `raw_next`. The read and the initializing
    /// write are deliberately not atomic with each other: whichever racing
    /// caller's write lands first wins, and the others degrade to plain
    /// increments of the winner's value.
    async fn next(&self, step: i64) -> Result<i64, SequenceError> {
        ensure!(is_valid_step(step), InvalidStepSnafu { step });

        if let Some(value) = self.raw_next(step, None).await? {
            return Ok(value);
        }

        let baseline = self.current_value().await?;
        let default = fallback_default(baseline, step).context(ValueRangeExceededSnafu { key: self.key() })?;
        match self.raw_next(step, Some(default)).await? {
            Some(value) => Ok(value),
            // A default was supplied, so the primitive must produce a value.
            None => UninitializedSnafu { key: self.key() }.fail(),
        }
    }

    /// Delete the remote key. The next [`next`](Self::next) call behaves as
    /// first use. Succeeds on an already-absent key.
    async fn reset(&self) -> Result<(), SequenceError>;

    /// Unconditionally overwrite the remote value.
    ///
    /// Bypasses the atomicity protocol with respect to concurrent
    /// incrementers. Operator escape hatch only; never call this from
    /// steady-state increment paths.
    async fn force_set(&self, value: i64) -> Result<(), SequenceError>;
}
