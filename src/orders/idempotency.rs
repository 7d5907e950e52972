// Duplicate checkout protection
//
// A checkout attempt is keyed by who is ordering, what is in the cart and
// a five minute time bucket. While one attempt holds a key, a second
// submission with the same key is refused.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::cart::CartLineItem;

/// Width of the time bucket folded into the key
pub const IDEMPOTENCY_WINDOW_SECS: i64 = 300;

/// Derive the idempotency key for a checkout attempt
///
/// Line items are sorted first, so the key does not depend on the order
/// the content API listed them in.
pub fn idempotency_key(owner: &str, items: &[CartLineItem], now: DateTime<Utc>) -> String {
    let mut lines: Vec<String> = items
        .iter()
        .map(|item| format!("{}:{}", item.id, item.unit_price.normalize()))
        .collect();
    lines.sort();

    let bucket = now.timestamp().div_euclid(IDEMPOTENCY_WINDOW_SECS);

    let mut hasher = Sha256::new();
    hasher.update(owner.trim().to_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(lines.join(",").as_bytes());
    hasher.update(b"|");
    hasher.update(bucket.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Set of idempotency keys whose attempts are still running
#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or `None` when another attempt already holds it
    pub fn acquire(&self, key: String) -> Option<InFlightTicket> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(InFlightTicket {
            key,
            keys: Arc::clone(&self.keys),
        })
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Releases its key when dropped
#[derive(Debug)]
pub struct InFlightTicket {
    key: String,
    keys: Arc<Mutex<HashSet<String>>>,
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
