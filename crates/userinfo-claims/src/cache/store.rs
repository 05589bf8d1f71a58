//! LRU store with expire-after-access

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;

use super::config::CacheConfig;
use crate::models::UserInfo;

struct Entry {
    value: Arc<UserInfo>,
    last_access: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant, expire_after_access: Duration) -> bool {
        now.saturating_duration_since(self.last_access) >= expire_after_access
    }
}

#[derive(Debug)]
pub(super) enum Lookup {
    Hit(Arc<UserInfo>),
    Expired,
    Miss,
}

/// Bounded LRU map; expiry is evaluated lazily on access
pub(super) struct ExpiringLru {
    entries: LruCache<String, Entry>,
    expire_after_access: Duration,
}

impl ExpiringLru {
    pub(super) fn new(config: &CacheConfig) -> Self {
        Self {
            entries: LruCache::new(config.max_entries),
            expire_after_access: config.expire_after_access,
        }
    }

    /// Look up `key`, refreshing its access time on a hit
    ///
    /// Expired entries are removed.
    pub(super) fn get(&mut self, key: &str, now: Instant) -> Lookup {
        let expire_after_access = self.expire_after_access;
        match self.entries.get_mut(key) {
            None => return Lookup::Miss,
            Some(entry) if !entry.is_expired(now, expire_after_access) => {
                entry.last_access = now;
                return Lookup::Hit(Arc::clone(&entry.value));
            }
            Some(_) => {}
        }
        self.entries.pop(key);
        Lookup::Expired
    }

    /// Whether a live entry exists, without touching recency or access time
    pub(super) fn contains(&self, key: &str, now: Instant) -> bool {
        self.entries
            .peek(key)
            .is_some_and(|entry| !entry.is_expired(now, self.expire_after_access))
    }

    /// Insert or replace `key`; returns the evicted key, if any
    pub(super) fn insert(
        &mut self,
        key: String,
        value: Arc<UserInfo>,
        now: Instant,
    ) -> Option<String> {
        let entry = Entry {
            value,
            last_access: now,
        };
        match self.entries.push(key.clone(), entry) {
            Some((evicted, _)) if evicted != key => Some(evicted),
            _ => None,
        }
    }

    pub(super) fn remove(&mut self, key: &str) -> bool {
        self.entries.pop(key).is_some()
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(super) fn capacity(&self) -> NonZeroUsize {
        self.entries.cap()
    }
}
