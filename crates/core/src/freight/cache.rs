use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::rate_table::{RateTable, RateTableError};
use super::sources::{FreightSources, SourceError};
use super::surcharge::SurchargeCatalog;
use crate::domain::product::{Product, ProductId};

struct CacheEntry<V> {
    value: Arc<V>,
    stored_at: Instant,
}

/// Read-through cache of immutable snapshots.
///
/// Readers share an `RwLock`ed map. A miss takes a per-key async lock and
/// re-checks the map before fetching, so concurrent misses on one key
/// collapse into a single population. Invalidation bumps a generation
/// counter; a fetch that started before an invalidation is returned to its
/// caller but not stored. With a TTL, every store first evicts expired
/// entries, so the map only holds keys seen within the last TTL.
pub struct ReadThroughCache<K, V> {
    name: &'static str,
    ttl: Option<Duration>,
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    key_locks: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
    generation: AtomicU64,
    populations: AtomicU64,
}

impl<K, V> ReadThroughCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(name: &'static str, ttl: Option<Duration>) -> Self {
        Self {
            name,
            ttl,
            entries: RwLock::new(HashMap::new()),
            key_locks: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            populations: AtomicU64::new(0),
        }
    }

    /// Fresh cached value, if any.
    pub async fn get(&self, key: &K) -> Option<Arc<V>> {
        let entries = self.entries.read().await;
        entries.get(key).filter(|entry| self.is_fresh(entry)).map(|entry| entry.value.clone())
    }

    pub async fn get_or_try_populate<F, Fut, E>(&self, key: K, fetch: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        // Declared before the guard so the mutex is unlocked first on drop.
        let release = KeyLockRelease { cache: self, key: &key, key_lock: self.key_lock(&key) };
        let _guard = release.key_lock.lock().await;

        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let value = Arc::new(fetch().await?);
        self.populations.fetch_add(1, Ordering::Relaxed);

        {
            let mut entries = self.entries.write().await;
            if self.generation.load(Ordering::Acquire) == generation {
                self.evict_expired(&mut entries);
                entries.insert(
                    key.clone(),
                    CacheEntry { value: value.clone(), stored_at: Instant::now() },
                );
                debug!(
                    event_name = "freight.cache.populated",
                    cache = self.name,
                    key = ?key,
                    "cache entry populated"
                );
            }
        }

        Ok(value)
    }

    pub async fn invalidate(&self, key: &K) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.remove(key);
        info!(
            event_name = "freight.cache.invalidated",
            cache = self.name,
            key = ?key,
            "cache entry invalidated"
        );
    }

    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
        info!(event_name = "freight.cache.cleared", cache = self.name, "cache cleared");
    }

    /// Number of fetches performed since construction.
    pub fn populations(&self) -> u64 {
        self.populations.load(Ordering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_fresh(&self, entry: &CacheEntry<V>) -> bool {
        self.ttl.map_or(true, |ttl| entry.stored_at.elapsed() < ttl)
    }

    fn evict_expired(&self, entries: &mut HashMap<K, CacheEntry<V>>) {
        if self.ttl.is_none() {
            return;
        }

        let before = entries.len();
        entries.retain(|_, entry| self.is_fresh(entry));
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(
                event_name = "freight.cache.evicted",
                cache = self.name,
                evicted = evicted,
                "expired cache entries evicted"
            );
        }
    }

    fn key_lock(&self, key: &K) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key.clone()).or_default().clone()
    }

    fn release_key_lock(&self, key: &K, key_lock: &Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map plus ours means nobody else is waiting.
        if Arc::strong_count(key_lock) <= 2 {
            locks.remove(key);
        }
    }
}

/// Removes the per-key lock when its population finishes, fails or is
/// cancelled.
struct KeyLockRelease<'a, K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    cache: &'a ReadThroughCache<K, V>,
    key: &'a K,
    key_lock: Arc<tokio::sync::Mutex<()>>,
}

impl<K, V> Drop for KeyLockRelease<'_, K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    fn drop(&mut self) {
        self.cache.release_key_lock(self.key, &self.key_lock);
    }
}

/// Everything one product needs for a calculation, loaded together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub product: Product,
    pub rate_table: RateTable,
    pub surcharges: SurchargeCatalog,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("product {0} was not found")]
    NotFound(ProductId),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    RateTable(#[from] RateTableError),
}

/// Per-product snapshot cache. Rate edits must call [`RateCache::invalidate`]
/// for the affected product; entries are never mutated in place.
pub struct RateCache {
    sources: FreightSources,
    snapshots: ReadThroughCache<ProductId, ProductSnapshot>,
}

impl RateCache {
    pub fn new(sources: FreightSources) -> Self {
        Self { sources, snapshots: ReadThroughCache::new("product_snapshot", None) }
    }

    pub fn sources(&self) -> &FreightSources {
        &self.sources
    }

    pub async fn snapshot(&self, product_id: &ProductId) -> Result<Arc<ProductSnapshot>, SnapshotError> {
        self.snapshots
            .get_or_try_populate(product_id.clone(), || load_snapshot(&self.sources, product_id))
            .await
    }

    pub async fn invalidate(&self, product_id: &ProductId) {
        self.snapshots.invalidate(product_id).await;
    }

    pub async fn invalidate_all(&self) {
        self.snapshots.invalidate_all().await;
    }

    pub fn populations(&self) -> u64 {
        self.snapshots.populations()
    }
}

async fn load_snapshot(
    sources: &FreightSources,
    product_id: &ProductId,
) -> Result<ProductSnapshot, SnapshotError> {
    let (product, bands, surcharges, seasonal) = tokio::try_join!(
        sources.products.get(product_id),
        sources.rates.list_bands(product_id),
        sources.surcharges.list(product_id),
        sources.seasonal_surcharges.list(product_id),
    )?;
    let product = product.ok_or_else(|| SnapshotError::NotFound(product_id.clone()))?;

    let rate_table = RateTable::build(product.id.clone(), product.weight_unit, &bands)?;
    let surcharges = SurchargeCatalog::prepare(&surcharges, seasonal);

    Ok(ProductSnapshot { product, rate_table, surcharges })
}
