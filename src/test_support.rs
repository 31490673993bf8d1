//! Deterministic in-memory implementations of the store traits.
//!
//! These model the store contracts exactly — script indivisibility,
//! absent-key behavior, lock leases — without any network, so concurrency
//! tests are reproducible. Production adapters wrapping a real store live
//! outside this crate.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

use crate::script::NEXT_VALUE_SCRIPT;
use crate::script::NEXT_VALUE_WITH_DEFAULT_SCRIPT;
use crate::store::AtomicStore;
use crate::store::DistributedMutex;
use crate::store::ScriptStore;
use crate::store::StoreError;
use crate::types::MutexLease;

/// How often waiting mutex clients re-probe the lease table.
const MUTEX_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Failure injection shared by the in-memory stores.
struct FailureState {
    offline: AtomicBool,
    /// Operations to allow before going offline (-1 = disabled).
    remaining: AtomicI64,
}

impl FailureState {
    fn new() -> Self {
        Self {
            offline: AtomicBool::new(false),
            remaining: AtomicI64::new(-1),
        }
    }

    fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
        if !offline {
            self.remaining.store(-1, Ordering::SeqCst);
        }
    }

    fn fail_after(&self, operations: i64) {
        self.remaining.store(operations, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Connection {
                reason: "store offline".to_string(),
            });
        }
        if self.remaining.load(Ordering::SeqCst) >= 0 && self.remaining.fetch_sub(1, Ordering::SeqCst) <= 0 {
            self.offline.store(true, Ordering::SeqCst);
            return Err(StoreError::Connection {
                reason: "store offline".to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory store with counter-script execution.
///
/// Counters are kept as decimal strings, matching the wire representation a
/// real scripting store would hold.
pub struct MemoryScriptStore {
    data: RwLock<BTreeMap<String, String>>,
    failure: FailureState,
}

impl Default for MemoryScriptStore {
    fn default() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            failure: FailureState::new(),
        }
    }
}

impl MemoryScriptStore {
    /// Create a new store wrapped in `Arc`.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent operation fail with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.failure.set_offline(offline);
    }

    /// Allow `operations` more successful operations, then go offline.
    pub fn fail_after(&self, operations: i64) {
        self.failure.fail_after(operations);
    }

    /// Write a raw value directly, bypassing the integer contract. Lets
    /// tests stage corrupted data.
    pub async fn put_raw(&self, key: &str, value: &str) {
        self.data.write().await.insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl ScriptStore for MemoryScriptStore {
    async fn eval_counter_script(
        &self,
        script: &str,
        key: &str,
        args: &[String],
    ) -> Result<Option<i64>, StoreError> {
        self.failure.check()?;
        if script != NEXT_VALUE_SCRIPT && script != NEXT_VALUE_WITH_DEFAULT_SCRIPT {
            return Err(StoreError::Script {
                reason: format!("unknown script ({} bytes)", script.len()),
            });
        }
        let step: i64 = args
            .first()
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| StoreError::Script {
                reason: "missing or invalid step argument".to_string(),
            })?;

        // The whole branch-and-mutate runs under one write lock, matching
        // the indivisible execution a real scripting store provides.
        let mut data = self.data.write().await;
        match data.get(key) {
            Some(raw) => {
                let current: i64 = raw.parse().map_err(|_| StoreError::NonNumericValue {
                    key: key.to_string(),
                    value: raw.clone(),
                })?;
                let new_value = current + step;
                data.insert(key.to_string(), new_value.to_string());
                Ok(Some(new_value))
            }
            None => match args.get(1) {
                Some(default_raw) => {
                    let default: i64 = default_raw.parse().map_err(|_| StoreError::Script {
                        reason: format!("invalid default argument: {default_raw:?}"),
                    })?;
                    data.insert(key.to_string(), default_raw.clone());
                    Ok(Some(default))
                }
                None => Ok(None),
            },
        }
    }

    async fn get_counter(&self, key: &str) -> Result<Option<i64>, StoreError> {
        self.failure.check()?;
        let data = self.data.read().await;
        match data.get(key) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| StoreError::NonNumericValue {
                    key: key.to_string(),
                    value: raw.clone(),
                }),
            None => Ok(None),
        }
    }

    async fn set_counter(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.failure.check()?;
        self.data.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_counter(&self, key: &str) -> Result<bool, StoreError> {
        self.failure.check()?;
        Ok(self.data.write().await.remove(key).is_some())
    }
}

/// In-memory store exposing a bare atomic integer per key.
pub struct MemoryAtomicStore {
    data: RwLock<BTreeMap<String, i64>>,
    failure: FailureState,
}

impl Default for MemoryAtomicStore {
    fn default() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            failure: FailureState::new(),
        }
    }
}

impl MemoryAtomicStore {
    /// Create a new store wrapped in `Arc`.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent operation fail with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.failure.set_offline(offline);
    }

    /// Allow `operations` more successful operations, then go offline.
    pub fn fail_after(&self, operations: i64) {
        self.failure.fail_after(operations);
    }
}

#[async_trait]
impl AtomicStore for MemoryAtomicStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.failure.check()?;
        Ok(self.data.read().await.contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<i64, StoreError> {
        self.failure.check()?;
        Ok(self.data.read().await.get(key).copied().unwrap_or(0))
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.failure.check()?;
        self.data.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn add_and_get(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        self.failure.check()?;
        let mut data = self.data.write().await;
        // Absent keys count from zero, matching atomic-integer stores.
        let value = data.entry(key.to_string()).or_insert(0);
        *value += delta;
        Ok(*value)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.failure.check()?;
        Ok(self.data.write().await.remove(key).is_some())
    }
}

/// In-memory mutex honoring wait and lease bounds.
///
/// Leases are persisted as JSON entries the way a store-backed mutex would
/// record them, so expiry behaves like the production shape.
pub struct MemoryMutex {
    leases: Mutex<BTreeMap<String, String>>,
}

impl Default for MemoryMutex {
    fn default() -> Self {
        Self {
            leases: Mutex::new(BTreeMap::new()),
        }
    }
}

impl MemoryMutex {
    /// Create a new mutex service wrapped in `Arc`.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn try_acquire_once(&self, name: &str, lease: Duration) -> Result<bool, StoreError> {
        let mut leases = self.leases.lock().await;
        if let Some(raw) = leases.get(name) {
            let entry: MutexLease = serde_json::from_str(raw).map_err(|source| StoreError::MalformedLease {
                name: name.to_string(),
                reason: source.to_string(),
            })?;
            // An expired lease belongs to a crashed holder and is replaceable.
            if !entry.is_expired() {
                return Ok(false);
            }
        }

        let entry = MutexLease::new(name, lease.as_millis() as u64);
        let raw = serde_json::to_string(&entry).map_err(|source| StoreError::MalformedLease {
            name: name.to_string(),
            reason: source.to_string(),
        })?;
        leases.insert(name.to_string(), raw);
        Ok(true)
    }
}

#[async_trait]
impl DistributedMutex for MemoryMutex {
    async fn try_acquire(&self, name: &str, wait: Duration, lease: Duration) -> Result<bool, StoreError> {
        let deadline = Instant::now() + wait;
        loop {
            if self.try_acquire_once(name, lease).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(MUTEX_POLL_INTERVAL).await;
        }
    }

    async fn release(&self, name: &str) -> Result<(), StoreError> {
        self.leases.lock().await.remove(name);
        Ok(())
    }
}
