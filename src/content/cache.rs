// Response cache for content API reads
//
// Process-wide, in-memory, time-based. Entries older than the TTL are
// treated as missing and replaced on the next read. Writes invalidate the
// keys they affect before returning.

use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Default time-to-live for cached reads (2 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(120);

/// Logical cache keys
pub mod keys {
    pub const CATEGORIES: &str = "categories";
    pub const CART_PREFIX: &str = "user-cart-";

    pub fn menu_items(slug: &str) -> String {
        format!("menu-items-{}", slug)
    }

    pub fn cart(owner: &str) -> String {
        format!("{}{}", CART_PREFIX, owner)
    }

    pub fn orders(owner: &str) -> String {
        format!("user-orders-{}", owner)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Fresh entry for `key`, if any
    pub async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                debug!(key, "Returning cached content");
                Some(entry.data.clone())
            }
            _ => None,
        }
    }

    pub async fn insert(&self, key: impl Into<String>, data: Value) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.into(),
            CacheEntry {
                data,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            debug!(key, "Invalidated cache entry");
        }
    }

    /// Drop every entry whose key starts with `prefix`
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        debug!(prefix, removed = before - entries.len(), "Invalidated cache prefix");
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}
