//! Verification cache.
//!
//! Maps the raw credential string to the store record it resolved to, so a
//! repeated credential skips the store round trip and the hash comparison
//! until the entry's TTL lapses. Entries are evicted least-recently-used
//! once capacity is reached.
//!
//! Keys are bearer secrets: the cache is never persisted, logged or
//! exposed through `Debug`.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use cached::{Cached, TimedSizedCache};

use crate::config::CacheConfig;
use crate::store::StoredCredentialRecord;

/// TTL + LRU cache of verified credentials.
pub struct VerificationCache {
    inner: Mutex<TimedSizedCache<String, StoredCredentialRecord>>,
    ttl: Duration,
}

impl VerificationCache {
    /// `capacity` must be non-zero; TTL has one-second resolution.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(TimedSizedCache::with_size_and_lifespan(
                capacity.max(1),
                ttl.as_secs(),
            )),
            ttl,
        }
    }

    /// Build from config; `None` when capacity or TTL is zero.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        if config.capacity == 0 || config.ttl_secs == 0 {
            return None;
        }
        Some(Self::new(
            config.capacity,
            Duration::from_secs(config.ttl_secs),
        ))
    }

    /// Unexpired record for `credential`, if any.
    pub fn get(&self, credential: &str) -> Option<StoredCredentialRecord> {
        let mut cache = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        cache.cache_get(credential).cloned()
    }

    /// Insert or refresh an entry with the configured TTL.
    pub fn set(&self, credential: &str, record: StoredCredentialRecord) {
        let mut cache = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        cache.cache_set(credential.to_owned(), record);
    }

    pub fn len(&self) -> usize {
        let cache = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        cache.cache_size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for VerificationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
