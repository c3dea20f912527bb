//! Expiring in-memory cache
//!
//! Every entry carries an absolute expiry. Reads check expiry lazily and drop
//! stale entries; a periodic sweep purges the rest. Correctness relies only on
//! the lazy check, so the sweep is skipped when no runtime is available.
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::cleanable::Cleanable;
use async_trait::async_trait;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

type Entries<K, V> = RwLock<HashMap<K, CacheEntry<V>>>;

/// Stand-in for "never" when a duration does not fit on the clock
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// The instant `after` from now, saturating at a far-future instant
pub(crate) fn deadline(after: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(after).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Key/value store with a per-entry time to live
pub struct ExpiringCache<K, V> {
    name: &'static str,
    entries: Arc<Entries<K, V>>,
    sweeper: Option<JoinHandle<()>>,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache that sweeps expired entries every `sweep_interval`
    ///
    /// The sweep task is only started when called from within a tokio runtime
    /// and `sweep_interval` is non-zero.
    pub fn new(name: &'static str, sweep_interval: Duration) -> Self {
        let entries = Arc::new(RwLock::new(HashMap::new()));
        let sweeper = Self::spawn_sweeper(name, Arc::downgrade(&entries), sweep_interval);
        Self {
            name,
            entries,
            sweeper,
        }
    }

    fn spawn_sweeper(
        name: &'static str,
        entries: Weak<Entries<K, V>>,
        sweep_interval: Duration,
    ) -> Option<JoinHandle<()>> {
        if sweep_interval.is_zero() {
            return None;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(cache = name, "No runtime available, relying on lazy expiry");
            return None;
        };

        Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval_at(deadline(sweep_interval), sweep_interval);
            loop {
                ticker.tick().await;
                let Some(entries) = entries.upgrade() else {
                    break;
                };
                let removed = purge_expired(&entries).await;
                if removed > 0 {
                    debug!(cache = name, removed = removed, "Swept expired entries");
                }
            }
        }))
    }

    /// Store `value` under `key` until `ttl` elapses, replacing any previous entry
    pub async fn set(&self, key: K, value: V, ttl: Duration) {
        let expires_at = deadline(ttl);
        let mut entries = self.entries.write().await;
        entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Get the value for `key` if present and not expired
    ///
    /// An expired entry is removed as a side effect.
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        // Re-check under the write lock, a concurrent set may have refreshed it.
        let expired = entries.get(key).map(|entry| entry.is_expired(now))?;
        if expired {
            entries.remove(key);
            debug!(cache = self.name, "Dropped expired entry on read");
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    /// Remove all expired entries, returning how many were dropped
    pub async fn sweep(&self) -> usize {
        purge_expired(&self.entries).await
    }

    /// Number of stored entries, including expired ones not yet swept
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn stop_sweeper(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.abort();
        }
    }
}

async fn purge_expired<K, V>(entries: &Entries<K, V>) -> usize
where
    K: Eq + Hash,
{
    let now = Instant::now();
    let mut entries = entries.write().await;
    let initial_count = entries.len();
    entries.retain(|_, entry| !entry.is_expired(now));
    initial_count - entries.len()
}

#[async_trait]
impl<K, V> Cleanable for ExpiringCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn destroy(&self) {
        self.stop_sweeper();
        self.entries.write().await.clear();
        debug!(cache = self.name, "Cache destroyed");
    }
}

impl<K, V> Drop for ExpiringCache<K, V> {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}
