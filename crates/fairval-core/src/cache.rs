//! In-memory TTL cache for normalized records.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{DataKind, FinancialData, Listing, MarketData, SourceId};

/// Default time-to-live for cached records.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Cache key: data kind, listing and the source that produced the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: DataKind,
    pub listing: Listing,
    pub source: SourceId,
}

impl CacheKey {
    pub fn new(kind: DataKind, listing: &Listing, source: &SourceId) -> Self {
        Self {
            kind,
            listing: listing.clone(),
            source: source.clone(),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.kind, self.listing.market, self.listing.symbol, self.source
        )
    }
}

/// Normalized record held by the coordinator's cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedRecord {
    Market(MarketData),
    Financials(FinancialData),
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    data: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner<K, V> {
    map: HashMap<K, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<K, V> CacheInner<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn new(default_ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            default_ttl,
        }
    }

    fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).and_then(|entry| {
            if Instant::now() < entry.expires_at {
                Some(entry.data.clone())
            } else {
                None
            }
        })
    }

    fn put(&mut self, key: K, data: V, ttl_override: Option<Duration>) {
        let ttl = ttl_override.unwrap_or(self.default_ttl);
        let expires_at = Instant::now() + ttl;
        self.map.insert(key, CacheEntry { data, expires_at });
    }

    fn clear_expired(&mut self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);
    }
}

/// Thread-safe in-memory cache with lazy expiry.
///
/// Expired entries read as misses and stay in place until overwritten or
/// purged with [`CacheStore::clear_expired`]; nothing sweeps in the
/// background. Writes are serialized by the store lock.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    inner: Arc<tokio::sync::RwLock<CacheInner<K, V>>>,
}

impl<K, V> Clone for CacheStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create a new cache store with a default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner::new(default_ttl))),
        }
    }

    /// Create a disabled cache; every read misses and writes are dropped.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns the stored value only while `now < expires_at`.
    pub async fn get(&self, key: &K) -> Option<V> {
        let store = self.inner.read().await;
        store.get(key)
    }

    /// Stores a value with `expires_at = now + ttl`.
    ///
    /// If `ttl_override` is provided it replaces the default TTL. No-op when
    /// the cache is disabled.
    pub async fn put(&self, key: K, data: V, ttl_override: Option<Duration>) {
        let mut store = self.inner.write().await;

        if store.default_ttl == Duration::ZERO {
            return;
        }

        store.put(key, data, ttl_override);
    }

    /// Remove expired entries from the cache.
    pub async fn clear_expired(&self) {
        let mut store = self.inner.write().await;
        store.clear_expired();
    }

    /// Clear all entries from the cache.
    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.map.clear();
    }

    /// Number of entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_disabled(&self) -> bool {
        let store = self.inner.read().await;
        store.default_ttl == Duration::ZERO
    }
}
