/*!
 * Token Cache
 * Expiring token -> record map with expiry-on-read
 */

use super::record::Record;
use crate::core::clock::Clock;
use crate::core::limits::TOKEN_CACHE_INITIAL_CAPACITY;
use crate::core::types::Token;
use ahash::RandomState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Expiring record store keyed by token
///
/// # Concurrency
/// Sharded map: operations on unrelated tokens never contend on a
/// global lock, and each key is updated atomically.
pub struct TokenCache {
    records: DashMap<Token, Arc<Record>, RandomState>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
}

impl TokenCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::with_capacity_and_hasher(
                TOKEN_CACHE_INITIAL_CAPACITY,
                RandomState::new(),
            ),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired: AtomicU64::new(0),
        }
    }

    /// Store a record under `token`, replacing any previous binding
    pub fn put(&self, token: Token, record: Record) {
        trace!(token = %token, "token cached");
        self.records.insert(token, Arc::new(record));
    }

    /// Fetch a live record
    ///
    /// An expired record is deleted before `None` is returned, so it can
    /// never be observed again.
    pub fn get(&self, token: &Token) -> Option<Arc<Record>> {
        let now = self.clock.now();

        if let Some(entry) = self.records.get(token) {
            if !entry.is_expired_at(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(Arc::clone(entry.value()));
            }
            // Release the shard read lock before taking the write lock
            drop(entry);
            if self
                .records
                .remove_if(token, |_, record| record.is_expired_at(now))
                .is_some()
            {
                self.expired.fetch_add(1, Ordering::Relaxed);
                debug!(token = %token, "token expired on read");
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Evict a token explicitly
    pub fn remove(&self, token: &Token) -> Option<Arc<Record>> {
        self.records.remove(token).map(|(_, record)| record)
    }

    /// Drop every expired record, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0usize;
        self.records.retain(|_, record| {
            let keep = !record.is_expired_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            self.expired.fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, "expired tokens swept");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&self) {
        self.records.clear();
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            size: self.records.len(),
            hits,
            misses,
            expired: self.expired.load(Ordering::Relaxed),
            hit_rate,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub hit_rate: f64,
}
