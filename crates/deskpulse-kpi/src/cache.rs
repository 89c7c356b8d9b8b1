// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-limited KPI result cache with single-flight computation.
//!
//! Each key moves through `Empty -> Computing -> Fresh -> Stale -> Computing`.
//! A key that is computing holds a shared future; every caller that arrives
//! meanwhile awaits that same future instead of starting its own.
//!
//! The map guard is only held while deciding what to do with a key, never
//! across an `.await`. The computation publishes its own outcome: on success
//! the slot becomes `Ready`, on failure the slot is removed so the next
//! caller starts over. A generation number stops a computation from
//! overwriting a slot that was invalidated and restarted in the meantime.

use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

/// How a cached lookup was served.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::AsRefStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CacheStatus {
    /// A fresh stored value was returned.
    Hit,
    /// This caller started the computation.
    Miss,
    /// This caller awaited a computation another caller started.
    Joined,
}

type SharedComputation<V, E> = Shared<BoxFuture<'static, Result<Arc<V>, E>>>;

enum Slot<V, E> {
    Computing {
        generation: u64,
        future: SharedComputation<V, E>,
    },
    Ready {
        value: Arc<V>,
        stored_at: Instant,
    },
}

struct Inner<K, V, E> {
    slots: DashMap<K, Slot<V, E>>,
    ttl: Duration,
    generation: AtomicU64,
}

impl<K, V, E> Inner<K, V, E>
where
    K: Eq + Hash,
{
    fn publish(&self, key: &K, generation: u64, value: &Arc<V>) {
        if let Some(mut slot) = self.slots.get_mut(key) {
            if matches!(&*slot, Slot::Computing { generation: g, .. } if *g == generation) {
                *slot = Slot::Ready {
                    value: Arc::clone(value),
                    stored_at: Instant::now(),
                };
            }
        }
    }

    fn abandon(&self, key: &K, generation: u64) {
        self.slots.remove_if(key, |_, slot| {
            matches!(slot, Slot::Computing { generation: g, .. } if *g == generation)
        });
    }
}

enum Action<V, E> {
    Hit(Arc<V>),
    Join(SharedComputation<V, E>),
    Lead(SharedComputation<V, E>),
}

/// Concurrent TTL cache keyed by request parameters.
///
/// Cloning is cheap and yields a handle to the same table.
pub struct KpiCache<K, V, E> {
    inner: Arc<Inner<K, V, E>>,
}

impl<K, V, E> Clone for KpiCache<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, E> std::fmt::Debug for KpiCache<K, V, E>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KpiCache")
            .field("ttl", &self.inner.ttl)
            .field("entries", &self.inner.slots.len())
            .finish()
    }
}

impl<K, V, E> KpiCache<K, V, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache; `ttl` applies to every key.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: DashMap::new(),
                ttl,
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Number of slots, including in-flight computations and stale values.
    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }

    /// Returns the fresh value for `key`, or computes it.
    ///
    /// `compute` is invoked only by the caller that moves the key into
    /// `Computing`. Callers arriving while it runs receive its result,
    /// success or failure. Failures are never stored.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: K,
        compute: F,
    ) -> Result<(Arc<V>, CacheStatus), E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let action = match self.inner.slots.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let current = match occupied.get() {
                    Slot::Ready { value, stored_at } if stored_at.elapsed() < self.inner.ttl => {
                        Some(Action::Hit(Arc::clone(value)))
                    }
                    Slot::Computing { future, .. } => Some(Action::Join(future.clone())),
                    Slot::Ready { .. } => None,
                };
                match current {
                    Some(action) => action,
                    None => {
                        debug!("cached value is stale, recomputing");
                        let (generation, future) = self.launch(key, compute());
                        occupied.insert(Slot::Computing {
                            generation,
                            future: future.clone(),
                        });
                        Action::Lead(future)
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let (generation, future) = self.launch(key, compute());
                vacant.insert(Slot::Computing {
                    generation,
                    future: future.clone(),
                });
                Action::Lead(future)
            }
        };

        match action {
            Action::Hit(value) => Ok((value, CacheStatus::Hit)),
            Action::Join(future) => {
                debug!("joining in-flight computation");
                future.await.map(|value| (value, CacheStatus::Joined))
            }
            Action::Lead(future) => {
                let purged = self.purge_expired();
                if purged > 0 {
                    debug!(purged, "evicted stale cache entries");
                }
                future.await.map(|value| (value, CacheStatus::Miss))
            }
        }
    }

    /// Drops the slot for `key`. An in-flight computation still delivers
    /// its result to its waiters but is not stored.
    pub fn invalidate(&self, key: &K) -> bool {
        self.inner.slots.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.inner.slots.clear();
    }

    /// Evicts stale values. In-flight computations are kept.
    ///
    /// Runs on every miss, so keys that are never requested again do not
    /// outlive their TTL by more than the next miss.
    pub fn purge_expired(&self) -> usize {
        let before = self.inner.slots.len();
        let ttl = self.inner.ttl;
        self.inner.slots.retain(|_, slot| match slot {
            Slot::Ready { stored_at, .. } => stored_at.elapsed() < ttl,
            Slot::Computing { .. } => true,
        });
        before.saturating_sub(self.inner.slots.len())
    }

    fn launch<Fut>(&self, key: K, computation: Fut) -> (u64, SharedComputation<V, E>)
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let table: Weak<Inner<K, V, E>> = Arc::downgrade(&self.inner);
        let future = async move {
            let result = computation.await.map(Arc::new);
            if let Some(inner) = table.upgrade() {
                match &result {
                    Ok(value) => inner.publish(&key, generation, value),
                    Err(_) => inner.abandon(&key, generation),
                }
            }
            result
        }
        .boxed()
        .shared();
        (generation, future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    use futures::future::join_all;

    #[derive(Debug, Clone, PartialEq)]
    struct Boom(&'static str);

    const TTL: Duration = Duration::from_secs(120);

    fn counted(
        executions: &Arc<AtomicUsize>,
        value: u32,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<u32, Boom>> {
        let executions = Arc::clone(executions);
        move || {
            async move {
                executions.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_execution() {
        let cache: KpiCache<&'static str, u32, Boom> = KpiCache::new(TTL);
        let executions = Arc::new(AtomicUsize::new(0));

        let results = join_all(
            (0..16).map(|_| cache.get_or_compute("summary", counted(&executions, 7))),
        )
        .await;

        assert_eq!(executions.load(Ordering::SeqCst), 1);
        assert_eq!(results.len(), 16);
        let mut misses = 0;
        for result in results {
            let (value, status) = result.expect("computation succeeds");
            assert_eq!(*value, 7);
            match status {
                CacheStatus::Miss => misses += 1,
                CacheStatus::Joined => {}
                CacheStatus::Hit => panic!("nothing was fresh yet"),
            }
        }
        assert_eq!(misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_value_is_a_hit() {
        let cache: KpiCache<&'static str, u32, Boom> = KpiCache::new(TTL);
        let executions = Arc::new(AtomicUsize::new(0));

        let (_, first) = cache
            .get_or_compute("frt", counted(&executions, 1))
            .await
            .expect("computes");
        tokio::time::advance(Duration::from_secs(60)).await;
        let (value, second) = cache
            .get_or_compute("frt", counted(&executions, 2))
            .await
            .expect("hits");

        assert_eq!(first, CacheStatus::Miss);
        assert_eq!(second, CacheStatus::Hit);
        assert_eq!(*value, 1);
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_triggers_exactly_one_more_execution() {
        let cache: KpiCache<&'static str, u32, Boom> = KpiCache::new(TTL);
        let executions = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_compute("backlog", counted(&executions, 1))
            .await
            .expect("computes");
        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        let results = join_all(
            (0..8).map(|_| cache.get_or_compute("backlog", counted(&executions, 2))),
        )
        .await;

        assert_eq!(executions.load(Ordering::SeqCst), 2);
        for result in results {
            let (value, _) = result.expect("recomputes");
            assert_eq!(*value, 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failure_reaches_every_waiter_and_is_not_cached() {
        let cache: KpiCache<&'static str, u32, Boom> = KpiCache::new(TTL);
        let executions = Arc::new(AtomicUsize::new(0));

        let failing = |executions: &Arc<AtomicUsize>| {
            let executions = Arc::clone(executions);
            move || {
                async move {
                    executions.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Err::<u32, _>(Boom("upstream down"))
                }
            }
        };

        let results =
            join_all((0..5).map(|_| cache.get_or_compute("resolution", failing(&executions))))
                .await;

        assert_eq!(executions.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap_err(), Boom("upstream down"));
        }
        assert!(cache.is_empty(), "failed computation must leave the key empty");

        let (value, status) = cache
            .get_or_compute("resolution", counted(&executions, 9))
            .await
            .expect("retries after failure");
        assert_eq!(*value, 9);
        assert_eq!(status, CacheStatus::Miss);
        assert_eq!(executions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let cache: KpiCache<String, u32, Boom> = KpiCache::new(TTL);
        let executions = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.get_or_compute("a".to_string(), counted(&executions, 1)),
            cache.get_or_compute("b".to_string(), counted(&executions, 2)),
        );

        assert_eq!(*a.expect("a").0, 1);
        assert_eq!(*b.expect("b").0, 2);
        assert_eq!(executions.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_recompute() {
        let cache: KpiCache<&'static str, u32, Boom> = KpiCache::new(TTL);
        let executions = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_compute("k", counted(&executions, 1))
            .await
            .expect("computes");
        assert!(cache.invalidate(&"k"));
        assert!(!cache.invalidate(&"k"));

        let (_, status) = cache
            .get_or_compute("k", counted(&executions, 2))
            .await
            .expect("recomputes");
        assert_eq!(status, CacheStatus::Miss);
        assert_eq!(executions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidated_computation_is_not_stored() {
        let cache: KpiCache<&'static str, u32, Boom> = KpiCache::new(TTL);
        let executions = Arc::new(AtomicUsize::new(0));

        let pending = cache.get_or_compute("k", counted(&executions, 1));
        let invalidate = async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            cache.invalidate(&"k");
        };
        let (result, ()) = tokio::join!(pending, invalidate);

        assert_eq!(*result.expect("waiter still gets the value").0, 1);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_expired_keeps_fresh_values() {
        let cache: KpiCache<&'static str, u32, Boom> = KpiCache::new(TTL);
        let executions = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_compute("old", counted(&executions, 1))
            .await
            .expect("computes");
        tokio::time::advance(Duration::from_secs(100)).await;
        cache
            .get_or_compute("new", counted(&executions, 2))
            .await
            .expect("computes");
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);

        let (_, status) = cache
            .get_or_compute("new", counted(&executions, 3))
            .await
            .expect("hits");
        assert_eq!(status, CacheStatus::Hit);
    }

    #[tokio::test(start_paused = true)]
    async fn miss_evicts_stale_entries_for_other_keys() {
        let cache: KpiCache<&'static str, u32, Boom> = KpiCache::new(TTL);
        let executions = Arc::new(AtomicUsize::new(0));

        for key in ["2025-12-01", "2025-12-02"] {
            cache
                .get_or_compute(key, counted(&executions, 1))
                .await
                .expect("computes");
        }
        assert_eq!(cache.len(), 2);
        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        let (_, status) = cache
            .get_or_compute("2025-12-03", counted(&executions, 2))
            .await
            .expect("computes");
        assert_eq!(status, CacheStatus::Miss);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_empties_the_table() {
        let cache: KpiCache<&'static str, u32, Boom> = KpiCache::new(TTL);
        let executions = Arc::new(AtomicUsize::new(0));
        cache
            .get_or_compute("k", counted(&executions, 1))
            .await
            .expect("computes");
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.ttl(), TTL);
    }

    #[test]
    fn cache_status_labels() {
        assert_eq!(CacheStatus::Hit.as_ref(), "hit");
        assert_eq!(CacheStatus::Joined.to_string(), "joined");
        assert_eq!(
            serde_json::to_string(&CacheStatus::Miss).expect("serializes"),
            "\"miss\""
        );
    }
}
