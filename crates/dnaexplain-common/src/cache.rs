//! In-memory TTL cache for results of costly outbound lookups.
//!
//! No eviction policy beyond TTL: expired entries are dropped lazily on read
//! or when a caller runs `cleanup()`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub trait CacheStore<T>: Send + Sync {
    fn get(&self, key: &str) -> Option<T>;
    fn set(&self, key: &str, value: T, ttl: Duration);
    /// Evict every expired entry, returning how many were removed.
    fn cleanup(&self) -> usize;
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct TtlCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    default_ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(default_ttl: Duration) -> Self {
        Self { entries: Mutex::new(HashMap::new()), default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store with the cache's default TTL.
    pub fn insert(&self, key: &str, value: T) {
        self.set_at(key, value, self.default_ttl, Instant::now());
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<T> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if now >= entry.expires_at => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    pub fn set_at(&self, key: &str, value: T, ttl: Duration, now: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), CacheEntry { value, expires_at: now + ttl });
    }

    pub fn cleanup_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send> CacheStore<T> for TtlCache<T> {
    fn get(&self, key: &str) -> Option<T> {
        self.get_at(key, Instant::now())
    }

    fn set(&self, key: &str, value: T, ttl: Duration) {
        self.set_at(key, value, ttl, Instant::now());
    }

    fn cleanup(&self) -> usize {
        self.cleanup_at(Instant::now())
    }
}
