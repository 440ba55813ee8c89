// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-key guard against overlapping calls.
//!
//! While a flight for a key is running, further attempts for the same key
//! are refused instead of queued. The key is released when the
//! [`FlightGuard`] drops, so success, error and panic all reset it.

use dashmap::DashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

/// Set of keys with an operation currently in flight.
#[derive(Clone)]
pub struct SingleFlight<K>
where
    K: Eq + Hash,
{
    in_flight: Arc<DashMap<K, ()>>,
}

impl<K> Default for SingleFlight<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
        }
    }
}

impl<K> SingleFlight<K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`. Returns `None` if another flight already holds it.
    pub fn try_begin(&self, key: K) -> Option<FlightGuard<K>> {
        match self.in_flight.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                tracing::debug!(key = ?key, "Call already in flight, skipping");
                None
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(());
                Some(FlightGuard {
                    key: Some(key),
                    in_flight: self.in_flight.clone(),
                })
            }
        }
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Run `fut` under the guard for `key`, or return `None` without polling
    /// it if a flight is already running.
    pub async fn run<T, Fut>(&self, key: K, fut: Fut) -> Option<T>
    where
        Fut: Future<Output = T>,
    {
        let _guard = self.try_begin(key)?;
        Some(fut.await)
    }
}

/// Holds a key in flight until dropped.
pub struct FlightGuard<K>
where
    K: Eq + Hash,
{
    key: Option<K>,
    in_flight: Arc<DashMap<K, ()>>,
}

impl<K> Drop for FlightGuard<K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.in_flight.remove(&key);
        }
    }
}
