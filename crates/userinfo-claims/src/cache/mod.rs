//! UserInfo cache
//!
//! Bounded LRU of produced [`UserInfo`] records with expire-after-access.
//! A miss starts one production per key through a [`UserInfoLoader`];
//! concurrent callers for the same key share that production's outcome.
//!
//! # Single Flight
//!
//! Productions run as spawned tokio tasks. The task inserts a successful
//! result into the store and retires its in-flight entry under the same lock
//! callers take to join or start a flight, so a caller either joins the
//! running production or finds its cached result. Failures are handed to
//! every waiter of that flight and never stored; the next caller retries.
//!
//! # Lock Order
//!
//! `in_flight` before `store`. Hits take only `store`.

mod config;
mod store;

use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tracing::Instrument;

pub use config::CacheConfig;
use store::{ExpiringLru, Lookup};

use crate::models::UserInfo;
use crate::{Error, Result};

/// Produces the UserInfo for a cache miss
#[async_trait]
pub trait UserInfoLoader: Send + Sync {
    async fn load(&self, user_key: &str) -> Result<UserInfo>;
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Productions that completed successfully
    pub loads: u64,
    pub load_failures: u64,
    pub evictions: u64,
    pub entry_count: u64,
}

type Flight = Shared<BoxFuture<'static, Result<Arc<UserInfo>>>>;

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    evictions: AtomicU64,
}

struct Inner {
    loader: Arc<dyn UserInfoLoader>,
    store: Mutex<ExpiringLru>,
    in_flight: Mutex<HashMap<String, Flight>>,
    counters: Counters,
}

enum Pending {
    Ready(Arc<UserInfo>),
    Flight(Flight),
}

/// Loading cache of UserInfo records keyed by user key
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct UserInfoCache {
    inner: Arc<Inner>,
}

impl fmt::Debug for UserInfoCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_flight = self.inner.in_flight.lock().len();
        let (capacity, entry_count) = {
            let store = self.inner.store.lock();
            (store.capacity(), store.len())
        };
        f.debug_struct("UserInfoCache")
            .field("capacity", &capacity)
            .field("entry_count", &entry_count)
            .field("in_flight", &in_flight)
            .finish_non_exhaustive()
    }
}

impl UserInfoCache {
    pub fn new(loader: Arc<dyn UserInfoLoader>, config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                loader,
                store: Mutex::new(ExpiringLru::new(config)),
                in_flight: Mutex::new(HashMap::new()),
                counters: Counters::default(),
            }),
        }
    }

    /// Cached UserInfo for `user_key`, producing it on a miss
    ///
    /// Must be called within a tokio runtime.
    pub async fn get(&self, user_key: &str) -> Result<Arc<UserInfo>> {
        let span = tracing::debug_span!("userinfo_cache.get", cache.key = user_key);

        async {
            if let Some(info) = self.lookup(user_key) {
                tracing::debug!(cache.result = "hit", cache.key = user_key);
                return Ok(info);
            }

            match self.join_or_start(user_key) {
                Pending::Ready(info) => Ok(info),
                Pending::Flight(flight) => flight.await,
            }
        }
        .instrument(span)
        .await
    }

    /// Drop the cached record for `user_key`
    ///
    /// A production already running for the key still stores its result.
    pub fn invalidate(&self, user_key: &str) -> bool {
        let removed = self.inner.store.lock().remove(user_key);
        tracing::debug!(cache.key = user_key, cache.removed = removed, "invalidate");
        removed
    }

    pub fn invalidate_all(&self) {
        self.inner.store.lock().clear();
    }

    /// Whether a live record is cached, without refreshing its access time
    pub fn contains(&self, user_key: &str) -> bool {
        self.inner.store.lock().contains(user_key, Instant::now())
    }

    pub fn len(&self) -> usize {
        self.inner.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let counters = &self.inner.counters;
        CacheStats {
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            loads: counters.loads.load(Ordering::Relaxed),
            load_failures: counters.load_failures.load(Ordering::Relaxed),
            evictions: counters.evictions.load(Ordering::Relaxed),
            entry_count: self.len() as u64,
        }
    }

    fn lookup(&self, user_key: &str) -> Option<Arc<UserInfo>> {
        let lookup = self.inner.store.lock().get(user_key, Instant::now());
        match lookup {
            Lookup::Hit(info) => {
                self.inner.record_hit();
                Some(info)
            }
            Lookup::Expired => {
                tracing::debug!(cache.key = user_key, "entry expired");
                None
            }
            Lookup::Miss => None,
        }
    }

    fn join_or_start(&self, user_key: &str) -> Pending {
        let mut in_flight = self.inner.in_flight.lock();

        if let Some(flight) = in_flight.get(user_key) {
            tracing::debug!(cache.result = "miss", cache.key = user_key, "joining production");
            self.inner.record_miss();
            return Pending::Flight(flight.clone());
        }

        // A flight may have completed since the unlocked lookup
        if let Lookup::Hit(info) = self.inner.store.lock().get(user_key, Instant::now()) {
            self.inner.record_hit();
            return Pending::Ready(info);
        }

        tracing::debug!(cache.result = "miss", cache.key = user_key, "starting production");
        self.inner.record_miss();
        let flight = Arc::clone(&self.inner).spawn_production(user_key.to_owned());
        in_flight.insert(user_key.to_owned(), flight.clone());
        Pending::Flight(flight)
    }
}

impl Inner {
    /// Must be called with `in_flight` locked; the task blocks on that lock
    /// before retiring the flight.
    fn spawn_production(self: Arc<Self>, user_key: String) -> Flight {
        let span = tracing::debug_span!("userinfo_cache.produce", cache.key = %user_key);

        let task = tokio::spawn(
            async move {
                let outcome = AssertUnwindSafe(self.loader.load(&user_key))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        Err(Error::Internal(format!(
                            "UserInfo production for {user_key} panicked"
                        )))
                    });
                self.complete(&user_key, outcome)
            }
            .instrument(span),
        );

        task.map(|joined| {
            joined.unwrap_or_else(|e| Err(Error::Internal(format!("production task failed: {e}"))))
        })
        .boxed()
        .shared()
    }

    fn complete(&self, user_key: &str, outcome: Result<UserInfo>) -> Result<Arc<UserInfo>> {
        let mut in_flight = self.in_flight.lock();

        let result = match outcome {
            Ok(info) => {
                let info = Arc::new(info);
                let mut store = self.store.lock();
                let evicted = store.insert(user_key.to_owned(), Arc::clone(&info), Instant::now());
                let size = store.len();
                drop(store);

                self.counters.loads.fetch_add(1, Ordering::Relaxed);
                if let Some(evicted) = evicted {
                    tracing::debug!(cache.evicted = %evicted, "evicted least recently used entry");
                    self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                    #[cfg(feature = "metrics")]
                    crate::observability::record_cache_eviction();
                }
                #[cfg(feature = "metrics")]
                {
                    crate::observability::record_production(true);
                    crate::observability::set_cache_size(size);
                }
                tracing::debug!(cache.key = user_key, cache.size = size, "stored UserInfo");
                Ok(info)
            }
            Err(e) => {
                self.counters.load_failures.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "metrics")]
                crate::observability::record_production(false);
                tracing::warn!(cache.key = user_key, error = %e, "UserInfo production failed");
                Err(e)
            }
        };

        in_flight.remove(user_key);
        result
    }

    fn record_hit(&self) {
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        crate::observability::record_cache_hit();
    }

    fn record_miss(&self) {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        crate::observability::record_cache_miss();
    }
}
