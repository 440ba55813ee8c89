// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Time-boxed in-memory cache.
//!
//! Each entry remembers when it was stored. Reads within `ttl` are served
//! from memory; older entries are treated as missing and re-fetched.
//! Writes elsewhere call [`TtlCache::invalidate`] so the next read goes to
//! the backend regardless of age. There is no size bound and no eviction
//! beyond replacing stale entries.
//!
//! Every key carries a generation that `invalidate` bumps. A fetch that
//! started before an invalidation hands its result to its caller but does
//! not store it, so a slow read can never put back data older than a write.

use dashmap::DashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

struct Slot<V> {
    entry: Option<Entry<V>>,
    generation: u64,
}

impl<V> Slot<V> {
    fn empty() -> Self {
        Self {
            entry: None,
            generation: 0,
        }
    }
}

/// Keyed cache with a fixed time-to-live.
pub struct TtlCache<K, V> {
    slots: DashMap<K, Slot<V>>,
    /// Bumped by `invalidate_all`.
    epoch: AtomicU64,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            epoch: AtomicU64::new(0),
            ttl,
        }
    }

    /// Cached value for `key` if it is younger than the TTL.
    pub fn get(&self, key: &K) -> Option<V> {
        let slot = self.slots.get(key)?;
        let entry = slot.entry.as_ref()?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Last stored value for `key`, however old.
    pub fn get_stale(&self, key: &K) -> Option<V> {
        let slot = self.slots.get(key)?;
        slot.entry.as_ref().map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        self.slots.entry(key).or_insert_with(Slot::empty).entry = Some(Entry {
            value,
            stored_at: Instant::now(),
        });
    }

    /// Drop the entry for `key` so the next read re-fetches.
    ///
    /// Fetches already running for `key` will not store their result.
    pub fn invalidate(&self, key: &K) {
        let mut slot = self.slots.entry(key.clone()).or_insert_with(Slot::empty);
        slot.generation += 1;
        if slot.entry.take().is_some() {
            tracing::debug!("Cache entry invalidated");
        }
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        for mut slot in self.slots.iter_mut() {
            slot.generation += 1;
            slot.entry = None;
        }
    }

    /// Return the fresh cached value, or run `fetch` once and cache its result.
    ///
    /// Errors from `fetch` are returned as-is and never cached. A result
    /// fetched across an invalidation of `key` is returned but not cached.
    pub async fn get_or_fetch<E, F, Fut>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let started = self.stamp(&key);
        let value = fetch().await?;
        self.insert_if_unchanged(key, value.clone(), started);
        Ok(value)
    }

    fn stamp(&self, key: &K) -> (u64, u64) {
        let generation = self.slots.get(key).map_or(0, |slot| slot.generation);
        (self.epoch.load(Ordering::SeqCst), generation)
    }

    /// Store `value` unless `key` was invalidated since `started`.
    fn insert_if_unchanged(&self, key: K, value: V, started: (u64, u64)) {
        let mut slot = self.slots.entry(key).or_insert_with(Slot::empty);
        if (self.epoch.load(Ordering::SeqCst), slot.generation) != started {
            tracing::debug!("Cache invalidated during fetch, result not stored");
            return;
        }
        slot.entry = Some(Entry {
            value,
            stored_at: Instant::now(),
        });
    }
}
