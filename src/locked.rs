//! Lock-guarded counter backend for stores without scripting.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use snafu::ensure;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::error::InvalidStepSnafu;
use crate::error::LockAcquisitionSnafu;
use crate::error::SequenceError;
use crate::error::UninitializedSnafu;
use crate::pure::is_valid_step;
use crate::pure::lock_name_for;
use crate::sequence::InitialValueSupplier;
use crate::sequence::Sequence;
use crate::store::AtomicStore;
use crate::store::DistributedMutex;

/// Timeouts for the initialization mutex.
#[derive(Debug, Clone)]
pub struct LockedCounterConfig {
    /// How long to wait for the mutex before failing the call.
    pub wait_timeout: Duration,
    /// How long an acquired lock stays valid before auto-expiring.
    pub lease_timeout: Duration,
}

impl Default for LockedCounterConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(5),
            lease_timeout: Duration::from_secs(10),
        }
    }
}

/// Counter over a bare atomic integer store.
///
/// Increments take a no-lock fast path through the store's native atomic
/// add. First-use initialization takes a slow path guarded by a distributed
/// mutex scoped to this counter. After acquiring the mutex the slow path
/// re-checks existence, since another client may have initialized between
/// the probe and the lock grant, and the initialize-then-add runs inside
/// one critical section so a late initialization cannot silently overwrite
/// a concurrent fast-path add.
pub struct LockedCounter<S: AtomicStore + ?Sized, M: DistributedMutex + ?Sized> {
    store: Arc<S>,
    mutex: Arc<M>,
    key: String,
    lock_name: String,
    initial_value: InitialValueSupplier,
    config: LockedCounterConfig,
}

impl<S: AtomicStore + ?Sized, M: DistributedMutex + ?Sized> LockedCounter<S, M> {
    /// Create a counter over `key` with default lock timeouts.
    pub fn new(
        store: Arc<S>,
        mutex: Arc<M>,
        key: impl Into<String>,
        initial_value: impl Fn() -> i64 + Send + Sync + 'static,
    ) -> Self {
        Self::with_config(store, mutex, key, initial_value, LockedCounterConfig::default())
    }

    /// Create a counter with explicit lock timeouts.
    pub fn with_config(
        store: Arc<S>,
        mutex: Arc<M>,
        key: impl Into<String>,
        initial_value: impl Fn() -> i64 + Send + Sync + 'static,
        config: LockedCounterConfig,
    ) -> Self {
        let key = key.into();
        assert!(!key.is_empty(), "COUNTER: key must not be empty");
        assert!(!config.wait_timeout.is_zero(), "COUNTER: wait timeout must be positive");
        assert!(!config.lease_timeout.is_zero(), "COUNTER: lease timeout must be positive");

        let lock_name = lock_name_for(&key);
        Self {
            store,
            mutex,
            key,
            lock_name,
            initial_value: Box::new(initial_value),
            config,
        }
    }

    /// Name of the mutex guarding this counter's initialization.
    pub fn lock_name(&self) -> &str {
        &self.lock_name
    }

    /// Run the lock-guarded slow path: acquire, double-check, initialize if
    /// still absent, add, and always release.
    async fn locked_slow_path(&self, step: i64, default: Option<i64>) -> Result<i64, SequenceError> {
        let acquired = self
            .mutex
            .try_acquire(&self.lock_name, self.config.wait_timeout, self.config.lease_timeout)
            .await?;
        ensure!(
            acquired,
            LockAcquisitionSnafu {
                name: self.lock_name.clone(),
                wait_ms: self.config.wait_timeout.as_millis() as u64,
            }
        );

        let result = self.initialize_and_add(step, default).await;
        self.release_init_lock().await;
        result
    }

    /// Slow path body. Must run while holding the initialization lock.
    async fn initialize_and_add(&self, step: i64, default: Option<i64>) -> Result<i64, SequenceError> {
        // Double-check: another client may have initialized while we waited.
        if self.store.exists(&self.key).await? {
            debug!(key = %self.key, "counter initialized by another client while waiting for lock");
            return Ok(self.store.add_and_get(&self.key, step).await?);
        }

        if let Some(default) = default {
            // Explicit default: initialize to it and return it exactly.
            self.store.set(&self.key, default).await?;
            debug!(key = %self.key, default, "counter initialized with explicit default");
            return Ok(default);
        }

        warn!(key = %self.key, "counter missing from store, reinitializing");
        let initial = (self.initial_value)();
        self.store.set(&self.key, initial).await?;
        info!(key = %self.key, initial, "counter initialized");

        // The write just succeeded, so continued absence means the store is
        // violating its own contract.
        ensure!(
            self.store.exists(&self.key).await?,
            UninitializedSnafu { key: &self.key }
        );
        Ok(self.store.add_and_get(&self.key, step).await?)
    }

    async fn release_init_lock(&self) {
        // The lease bounds how long a failed release can block other clients.
        if let Err(error) = self.mutex.release(&self.lock_name).await {
            warn!(lock = %self.lock_name, %error, "failed to release initialization lock");
        }
    }
}

#[async_trait]
impl<S: AtomicStore + ?Sized, M: DistributedMutex + ?Sized> Sequence for LockedCounter<S, M> {
    fn key(&self) -> &str {
        &self.key
    }

    async fn current_value(&self) -> Result<i64, SequenceError> {
        // The store reports 0 for absent keys, so existence is probed
        // explicitly instead of trusting a zero.
        if self.store.exists(&self.key).await? {
            Ok(self.store.get(&self.key).await?)
        } else {
            Ok((self.initial_value)())
        }
    }

    async fn raw_next(&self, step: i64, default: Option<i64>) -> Result<Option<i64>, SequenceError> {
        ensure!(is_valid_step(step), InvalidStepSnafu { step });

        // Fast path: the store's add is atomic, no lock needed.
        if self.store.exists(&self.key).await? {
            let value = self.store.add_and_get(&self.key, step).await?;
            trace!(key = %self.key, value, "generated next counter value");
            return Ok(Some(value));
        }

        match default {
            // Absent with no default: report absence without mutating.
            None => Ok(None),
            Some(_) => Ok(Some(self.locked_slow_path(step, default).await?)),
        }
    }

    async fn next(&self, step: i64) -> Result<i64, SequenceError> {
        ensure!(is_valid_step(step), InvalidStepSnafu { step });

        if self.store.exists(&self.key).await? {
            let value = self.store.add_and_get(&self.key, step).await?;
            trace!(key = %self.key, value, "generated next counter value");
            return Ok(value);
        }

        self.locked_slow_path(step, None).await
    }

    async fn reset(&self) -> Result<(), SequenceError> {
        self.store.delete(&self.key).await?;
        info!(key = %self.key, "counter reset, key deleted");
        Ok(())
    }

    async fn force_set(&self, value: i64) -> Result<(), SequenceError> {
        self.store.set(&self.key, value).await?;
        info!(key = %self.key, value, "counter value forcibly set");
        Ok(())
    }
}
