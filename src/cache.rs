//! Time-windowed response cache
//!
//! Normalized source payloads are cached for a fixed freshness window so that
//! repeated queries within the window skip the browser entirely. Staleness is
//! checked lazily on read; entries are never evicted and the map is unbounded
//! for the process lifetime.

use crate::types::{Flight, Hotel, Place, SourceKind};
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// One normalized, cacheable result set.
#[derive(Debug, Clone)]
pub enum SourcePayload {
    Transportation(Vec<Flight>),
    Hotels(Vec<Hotel>),
    Places(Vec<Place>),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: SourcePayload,
    stored_at: Instant,
}

/// Process-wide cache keyed by source kind plus query parameters.
#[derive(Debug)]
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Fetch a payload if present and still within the freshness window.
    ///
    /// A stale entry reads as a miss; it stays in the map until the next
    /// `put` overwrites it.
    pub fn get(&self, key: &str) -> Option<SourcePayload> {
        let entry = self.entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            debug!(key, "cache hit");
            Some(entry.payload.clone())
        } else {
            debug!(key, "cache entry expired");
            None
        }
    }

    /// Store a payload, overwriting any previous entry and restarting its
    /// freshness window.
    pub fn put(&self, key: String, payload: SourcePayload) {
        debug!(key, "cache store");
        self.entries.insert(
            key,
            CacheEntry {
                payload,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build a cache key from the source kind and the query parameters.
///
/// Parameter pairs are sorted by name so that the key is independent of the
/// order the caller supplied them in.
pub fn cache_key(kind: SourceKind, params: &[(&str, &str)]) -> String {
    let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    format!("{}:{}", kind, pairs.join("&"))
}
