//! In-memory store backend
//!
//! Backs leases with a process-local map. Entries honor their TTL on every
//! read, so expiry works without any background task; an optional sweeper
//! evicts dead entries to keep the map small under key churn.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::{LockKey, LockStore, StoreResult};

struct StoreEntry {
    token: String,
    expires_at: Instant,
}

impl StoreEntry {
    fn new(token: &str, ttl: Duration) -> Self {
        Self {
            token: token.to_string(),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory `LockStore` for testing and single-process use.
///
/// Clones share the underlying map, so several managers can contend for the
/// same entries the way they would against one remote store.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<DashMap<LockKey, StoreEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Start a background task that evicts expired entries every
    /// `sweep_interval`. Expiry is already enforced on read; the sweeper only
    /// bounds memory held by abandoned keys.
    pub fn with_sweeper(self, sweep_interval: Duration) -> Self {
        let entries = self.entries.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                ticker.tick().await;
                let expired: Vec<LockKey> = entries
                    .iter()
                    .filter(|entry| entry.value().is_expired())
                    .map(|entry| entry.key().clone())
                    .collect();

                for key in &expired {
                    entries.remove_if(key, |_, entry| entry.is_expired());
                }

                if !expired.is_empty() {
                    debug!(count = expired.len(), "swept expired store entries");
                }
            }
        });

        self
    }

    /// Number of entries currently held, live or not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LockStore for MemoryStore {
    async fn put_if_absent(&self, key: &LockKey, token: &str, ttl: Duration) -> StoreResult<bool> {
        let written = match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(StoreEntry::new(token, ttl));
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoreEntry::new(token, ttl));
                true
            }
        };

        if written {
            debug!(key = %key, "store entry written");
        }
        Ok(written)
    }

    async fn extend(&self, key: &LockKey, token: &str, ttl: Duration) -> StoreResult<bool> {
        if let Some(mut entry) = self.entries.get_mut(key)
            && entry.token == token
            && !entry.is_expired()
        {
            entry.expires_at = Instant::now() + ttl;
            return Ok(true);
        }
        Ok(false)
    }

    async fn remove_owned(&self, key: &LockKey, token: &str) -> StoreResult<bool> {
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.token == token && !entry.is_expired())
            .is_some();
        Ok(removed)
    }

    async fn remove(&self, key: &LockKey) -> StoreResult<bool> {
        let removed = self
            .entries
            .remove_if(key, |_, entry| !entry.is_expired())
            .is_some();
        Ok(removed)
    }
}
