//! External cache interface and a bounded in-memory implementation
//!
//! The acquisition pipeline treats the cache as an external collaborator:
//! any store exposing `get`/`setex` keyed by normalized URL works. The
//! bundled `MemoryPageCache` is an LRU with per-entry TTL, suitable for
//! embedding and tests; production deployments typically plug in a shared
//! store instead.

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Maximum entries retained by the in-memory cache
const MAX_CACHE_ENTRIES: usize = 10_000;

/// Key/value cache consumed by the content pipeline
///
/// Values are opaque strings: raw HTML under `page:` keys, JSON-encoded
/// extracted resources under `resource:` keys.
#[async_trait]
pub trait PageCache: Send + Sync {
    /// Fetch a value, or None on miss or expiry
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a value with a TTL in seconds; returns false if the store
    /// rejected the write
    async fn setex(&self, key: &str, ttl_secs: u64, value: String) -> bool;
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Bounded in-memory `PageCache` with per-entry TTL
pub struct MemoryPageCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl MemoryPageCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHE_ENTRIES)
    }

    /// Create a cache bounded to `capacity` entries (minimum 1)
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl Default for MemoryPageCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageCache for MemoryPageCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                // Expired entry: drop it rather than serving stale content
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    async fn setex(&self, key: &str, ttl_secs: u64, value: String) -> bool {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        };
        self.entries.lock().await.put(key.to_string(), entry);
        true
    }
}
