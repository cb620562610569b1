use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Context;
use moka::future::Cache;
use tokio::time::Instant;
use tracing::warn;

use super::dto::SearchResponse;

/// Identity of a search request as seen by the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub query: String,
    pub page: u32,
    pub page_size: u32,
}

impl CacheKey {
    pub fn new(query: &str, page: u32, page_size: u32) -> Self {
        Self {
            query: query.to_owned(),
            page,
            page_size,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Vec<u8>,
    created_at: Instant,
}

/// Time-boxed, size-bounded store of aggregated search pages.
///
/// Every `clear` bumps a generation; a page computed under an older
/// generation is never stored.
pub struct ResponseCache {
    ttl: Duration,
    entries: Cache<CacheKey, CacheEntry>,
    generation: AtomicU64,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let mut builder = Cache::builder().max_capacity(max_entries);
        if !ttl.is_zero() {
            builder = builder.time_to_live(ttl);
        }
        Self {
            ttl,
            entries: builder.build(),
            generation: AtomicU64::new(0),
        }
    }

    /// Token to hand back to `insert`, taken before computing a page.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn get(&self, key: &CacheKey) -> anyhow::Result<Option<SearchResponse>> {
        let Some(entry) = self.entries.get(key).await else {
            return Ok(None);
        };
        if entry.created_at.elapsed() >= self.ttl {
            self.entries.invalidate(key).await;
            return Ok(None);
        }
        match serde_json::from_slice(&entry.snapshot) {
            Ok(response) => Ok(Some(response)),
            Err(e) => {
                warn!(query = %key.query, error = %e, "dropping undecodable cache entry");
                self.entries.invalidate(key).await;
                Err(e).with_context(|| format!("decode cached page for {:?}", key.query))
            }
        }
    }

    /// Stores `response` unless caching is disabled or the cache was
    /// cleared since `generation` was taken. Returns whether it was stored.
    pub async fn insert(
        &self,
        key: CacheKey,
        response: &SearchResponse,
        generation: u64,
    ) -> anyhow::Result<bool> {
        if self.ttl.is_zero() || self.generation() != generation {
            return Ok(false);
        }
        let snapshot = serde_json::to_vec(response).context("encode page for cache")?;
        let entry = CacheEntry {
            snapshot,
            created_at: Instant::now(),
        };
        self.entries.insert(key.clone(), entry).await;
        // a clear that raced the insert wins
        if self.generation() != generation {
            self.entries.invalidate(&key).await;
            return Ok(false);
        }
        Ok(true)
    }

    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.invalidate_all();
    }

    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    #[cfg(test)]
    pub(crate) async fn corrupt(&self, key: &CacheKey) {
        let entry = CacheEntry {
            snapshot: b"{not json".to_vec(),
            created_at: Instant::now(),
        };
        self.entries.insert(key.clone(), entry).await;
    }
}
