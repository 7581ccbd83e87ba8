//! Lock manager: per-key lease bookkeeping and renewal scheduling
//!
//! The manager owns one store client and one renewal scheduler. Each
//! successful acquisition registers a `LockEntry` pairing the lease with its
//! renewal handle; the entry lives in a single concurrent map so a lease and
//! its renewal task are registered and evicted as one per-key operation.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, info};

use leasehold_store::{LockKey, LockStore};

use crate::config::LockManagerConfig;
use crate::error::LockResult;
use crate::lease::Lease;
use crate::metrics;
use crate::renewal::{RenewalHandle, RenewalScheduler};

struct LockEntry {
    lease: Arc<Lease>,
    renewal: RenewalHandle,
}

/// Auto-renewing lock manager over a shared store client.
///
/// Grants short leases and renews them in the background for as long as the
/// holder keeps the key registered, so a critical section may run longer
/// than the lease TTL while a crashed holder's lease still expires on its
/// own. At most one lease is registered per key per manager.
pub struct LockManager {
    store: Arc<dyn LockStore>,
    scheduler: RenewalScheduler,
    entries: DashMap<LockKey, LockEntry>,
    acquire_timeout: Duration,
    expire_timeout: Duration,
}

impl LockManager {
    /// Create a manager over `store`.
    ///
    /// Fails fast with `LockError::Config` on an invalid configuration,
    /// before any lock attempt.
    pub fn new(store: Arc<dyn LockStore>, config: LockManagerConfig) -> LockResult<Self> {
        config.validate()?;
        info!(
            pool_size = config.pool_size,
            acquire_timeout_ms = config.acquire_timeout_ms,
            expire_timeout_ms = config.expire_timeout_ms,
            "lock manager started"
        );

        Ok(Self {
            store,
            scheduler: RenewalScheduler::new(config.pool_size),
            entries: DashMap::new(),
            acquire_timeout: config.acquire_timeout(),
            expire_timeout: config.expire_timeout(),
        })
    }

    /// Create a manager with the default configuration
    pub fn with_defaults(store: Arc<dyn LockStore>) -> LockResult<Self> {
        Self::new(store, LockManagerConfig::default())
    }

    /// Acquire `key` with the configured timeouts, retrying until the
    /// acquisition timeout elapses. Returns `Ok(false)` when the key stayed
    /// busy the whole time.
    pub async fn lock(&self, key: impl Into<LockKey>) -> LockResult<bool> {
        self.lock_with(key, self.acquire_timeout, self.expire_timeout)
            .await
    }

    /// Acquire `key` with explicit timeouts
    pub async fn lock_with(
        &self,
        key: impl Into<LockKey>,
        acquire_timeout: Duration,
        expire_timeout: Duration,
    ) -> LockResult<bool> {
        self.do_lock(key.into(), acquire_timeout, expire_timeout, true)
            .await
    }

    /// Make a single acquisition attempt with the configured timeouts
    pub async fn try_lock(&self, key: impl Into<LockKey>) -> LockResult<bool> {
        self.try_lock_with(key, self.acquire_timeout, self.expire_timeout)
            .await
    }

    /// Make a single acquisition attempt with explicit timeouts
    pub async fn try_lock_with(
        &self,
        key: impl Into<LockKey>,
        acquire_timeout: Duration,
        expire_timeout: Duration,
    ) -> LockResult<bool> {
        self.do_lock(key.into(), acquire_timeout, expire_timeout, false)
            .await
    }

    async fn do_lock(
        &self,
        key: LockKey,
        acquire_timeout: Duration,
        expire_timeout: Duration,
        blocking: bool,
    ) -> LockResult<bool> {
        let lease = Arc::new(Lease::new(
            self.store.clone(),
            key.clone(),
            acquire_timeout,
            expire_timeout,
        ));

        let acquired = if blocking {
            lease.acquire().await?
        } else {
            lease.try_acquire().await?
        };
        if !acquired {
            metrics::record_acquire_failure();
            return Ok(false);
        }
        metrics::record_acquire();

        // Renew at a fifth of the TTL: four renewal chances per lease window.
        // The interval period must stay non-zero for sub-5ms TTLs.
        let period = (expire_timeout / 5).max(Duration::from_millis(1));
        let renewal = self.scheduler.schedule(lease.clone(), period);

        // Single-map insert; when two local callers both won against the
        // store, the replaced entry's renewal task must not keep running
        if let Some(replaced) = self.entries.insert(key, LockEntry { lease, renewal }) {
            replaced.renewal.cancel();
        }
        metrics::set_held_leases(self.entries.len());
        Ok(true)
    }

    /// Release the lease registered for `key`: evict it, stop its renewal
    /// task (an in-flight renewal finishes), and delete the remote entry if
    /// this lease still owns it. Returns `Ok(false)` when no lease was
    /// registered or the entry had already expired and been taken over.
    pub async fn release(&self, key: impl Into<LockKey>) -> LockResult<bool> {
        let key = key.into();
        let Some((_, entry)) = self.entries.remove(&key) else {
            return Ok(false);
        };
        entry.renewal.cancel();
        metrics::set_held_leases(self.entries.len());

        let released = entry.lease.release().await?;
        debug!(key = %key, released, "lock released");
        Ok(released)
    }

    /// Same bookkeeping as `release`, but force-deletes the remote entry
    /// regardless of current ownership. Administrative recovery.
    pub async fn clear(&self, key: impl Into<LockKey>) -> LockResult<bool> {
        let key = key.into();
        let Some((_, entry)) = self.entries.remove(&key) else {
            return Ok(false);
        };
        entry.renewal.cancel();
        metrics::set_held_leases(self.entries.len());

        let cleared = entry.lease.clear().await?;
        debug!(key = %key, cleared, "lock cleared");
        Ok(cleared)
    }

    /// The lease currently registered for `key`, if any. No side effects.
    pub fn get_lock(&self, key: impl Into<LockKey>) -> Option<Arc<Lease>> {
        self.entries.get(&key.into()).map(|entry| entry.lease.clone())
    }

    /// Number of leases currently registered
    pub fn held_count(&self) -> usize {
        self.entries.len()
    }

    /// Stop every renewal task and drop all registrations.
    ///
    /// Remote entries are not deleted; unreleased leases expire on their
    /// own once renewal stops.
    pub fn shutdown(&self) {
        for entry in self.entries.iter() {
            entry.value().renewal.cancel();
        }
        self.entries.clear();
        metrics::set_held_leases(0);
        info!("lock manager shut down");
    }
}
