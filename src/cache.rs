//! Two-tier versioned cache.
//!
//! Entries are addressed by `(namespace, version, key)` and stored under the
//! percent-encoded storage key built by [`storage_key`]. Lookups go to the
//! in-process tier first, then to the [`DurableStore`]; a durable hit is
//! copied into the local tier. There is no TTL and no eviction. An entry
//! becomes unreachable only when its namespace version is bumped.
//!
//! Storage problems never surface to callers:
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | durable read error | logged, treated as a miss |
//! | durable value is not JSON | logged as corruption, treated as a miss |
//! | durable write error | logged, local tier still updated |

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use care_cache_core::store::{storage_key, DurableStore, Namespace};
use care_cache_core::{CanonicalRecord, CareError, RecordKind};

/// Point-in-time copy of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub local_hits: u64,
    pub durable_hits: u64,
    pub misses: u64,
    pub corrupted: u64,
    pub writes: u64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.local_hits + self.durable_hits
    }
}

#[derive(Debug, Default)]
struct Counters {
    local_hits: AtomicU64,
    durable_hits: AtomicU64,
    misses: AtomicU64,
    corrupted: AtomicU64,
    writes: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Cache of JSON values over a local map and a durable store.
pub struct VersionedCache {
    local: RwLock<HashMap<String, Value>>,
    durable: Arc<dyn DurableStore>,
    counters: Counters,
}

impl VersionedCache {
    pub fn new(durable: Arc<dyn DurableStore>) -> Self {
        Self {
            local: RwLock::new(HashMap::new()),
            durable,
            counters: Counters::default(),
        }
    }

    /// Look up a value. Absent, unreadable and corrupted entries are all
    /// `None`.
    pub async fn get(&self, namespace: Namespace, version: &str, key: &str) -> Option<Value> {
        let storage_key = storage_key(namespace, version, key);
        self.get_by_storage_key(&storage_key).await
    }

    /// Store a value under `(namespace, version, key)`, replacing any
    /// previous one.
    pub async fn set(&self, namespace: Namespace, version: &str, key: &str, value: &Value) {
        let storage_key = storage_key(namespace, version, key);
        self.set_by_storage_key(&storage_key, value).await
    }

    /// Look up a record of `kind`. A value that does not decode as that
    /// kind counts as corruption: it is dropped from the local tier and
    /// reported as a miss.
    pub async fn get_record(
        &self,
        namespace: Namespace,
        version: &str,
        key: &str,
        kind: RecordKind,
    ) -> Option<CanonicalRecord> {
        let storage_key = storage_key(namespace, version, key);
        let value = self.get_by_storage_key(&storage_key).await?;
        match CanonicalRecord::from_value(kind, value) {
            Ok(record) => Some(record),
            Err(e) => {
                self.local.write().remove(&storage_key);
                self.report_corruption(&storage_key, e.to_string());
                None
            }
        }
    }

    pub async fn get_by_storage_key(&self, storage_key: &str) -> Option<Value> {
        if let Some(value) = self.local.read().get(storage_key).cloned() {
            Counters::bump(&self.counters.local_hits);
            tracing::debug!(key = %storage_key, "cache hit (local)");
            return Some(value);
        }

        let raw = match self.durable.get(storage_key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "durable cache read failed");
                None
            }
        };

        let Some(raw) = raw else {
            Counters::bump(&self.counters.misses);
            tracing::debug!(key = %storage_key, "cache miss");
            return None;
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => {
                self.local
                    .write()
                    .insert(storage_key.to_string(), value.clone());
                Counters::bump(&self.counters.durable_hits);
                tracing::debug!(key = %storage_key, "cache hit (durable)");
                Some(value)
            }
            Err(e) => {
                self.report_corruption(storage_key, e.to_string());
                None
            }
        }
    }

    pub async fn set_by_storage_key(&self, storage_key: &str, value: &Value) {
        self.local
            .write()
            .insert(storage_key.to_string(), value.clone());
        Counters::bump(&self.counters.writes);

        if let Err(e) = self.durable.set(storage_key, &value.to_string()).await {
            tracing::warn!(key = %storage_key, error = %e, "durable cache write failed");
        } else {
            tracing::info!(key = %storage_key, "cache write");
        }
    }

    /// Number of entries held in the local tier.
    pub fn local_len(&self) -> usize {
        self.local.read().len()
    }

    pub fn stats(&self) -> CacheStats {
        let c = &self.counters;
        CacheStats {
            local_hits: c.local_hits.load(Ordering::Relaxed),
            durable_hits: c.durable_hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            corrupted: c.corrupted.load(Ordering::Relaxed),
            writes: c.writes.load(Ordering::Relaxed),
        }
    }

    fn report_corruption(&self, storage_key: &str, reason: String) {
        Counters::bump(&self.counters.corrupted);
        Counters::bump(&self.counters.misses);
        let err = CareError::CacheCorruption {
            key: storage_key.to_string(),
            reason,
        };
        tracing::warn!(error = %err, "ignoring cache entry");
    }
}
