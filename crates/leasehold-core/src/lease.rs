//! A lease: one outstanding claim on a key
//!
//! A lease writes a per-acquisition token into the store and uses it for
//! every owner-sensitive operation afterwards, so a release can never delete
//! an entry acquired by someone else after this lease expired naturally.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use leasehold_store::{LockKey, LockStore};

use crate::error::LockResult;
use crate::metrics;

/// Pause between acquisition attempts inside the blocking `acquire` loop
pub(crate) const ACQUIRE_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Lifecycle of a lease; `Released` and `Cleared` are terminal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseState {
    Unacquired,
    Held,
    Released,
    Cleared,
}

const STATE_UNACQUIRED: u8 = 0;
const STATE_HELD: u8 = 1;
const STATE_RELEASED: u8 = 2;
const STATE_CLEARED: u8 = 3;

/// One claim on a key against the remote store.
///
/// Created and registered by `LockManager`; never shared across managers.
pub struct Lease {
    store: Arc<dyn LockStore>,
    key: LockKey,
    token: String,
    acquire_timeout: Duration,
    expire_timeout: Duration,
    state: AtomicU8,
}

impl Lease {
    pub(crate) fn new(
        store: Arc<dyn LockStore>,
        key: LockKey,
        acquire_timeout: Duration,
        expire_timeout: Duration,
    ) -> Self {
        Self {
            store,
            key,
            token: Uuid::new_v4().to_string(),
            acquire_timeout,
            expire_timeout,
            state: AtomicU8::new(STATE_UNACQUIRED),
        }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// The per-acquisition ownership token written into the store
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expire_timeout(&self) -> Duration {
        self.expire_timeout
    }

    pub fn state(&self) -> LeaseState {
        match self.state.load(Ordering::Acquire) {
            STATE_HELD => LeaseState::Held,
            STATE_RELEASED => LeaseState::Released,
            STATE_CLEARED => LeaseState::Cleared,
            _ => LeaseState::Unacquired,
        }
    }

    fn set_state(&self, state: u8) {
        self.state.store(state, Ordering::Release);
    }

    /// Block until the key is acquired or `acquire_timeout` elapses.
    ///
    /// Retries every `ACQUIRE_RETRY_INTERVAL`, with a final attempt at the
    /// deadline. "Lock busy" is `Ok(false)`, never an error.
    pub async fn acquire(&self) -> LockResult<bool> {
        let deadline = Instant::now() + self.acquire_timeout;
        loop {
            if self.try_acquire().await? {
                return Ok(true);
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(key = %self.key, "lease acquisition timed out");
                return Ok(false);
            }
            tokio::time::sleep(ACQUIRE_RETRY_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Make exactly one acquisition attempt
    pub async fn try_acquire(&self) -> LockResult<bool> {
        match self.state() {
            LeaseState::Held => return Ok(true),
            LeaseState::Released | LeaseState::Cleared => return Ok(false),
            LeaseState::Unacquired => {}
        }

        let acquired = self
            .store
            .put_if_absent(&self.key, &self.token, self.expire_timeout)
            .await?;
        if acquired {
            self.set_state(STATE_HELD);
            debug!(key = %self.key, "lease acquired");
        }
        Ok(acquired)
    }

    /// Extend the remote TTL back to the full expiry window.
    ///
    /// Best-effort: store rejections and transport failures are logged and
    /// counted, never surfaced to the holder. On a lease that is no longer
    /// held this is a no-op, and the token guard makes it a no-op at the
    /// store even when the local state lags.
    pub async fn renew(&self) -> bool {
        if self.state() != LeaseState::Held {
            return false;
        }

        match self
            .store
            .extend(&self.key, &self.token, self.expire_timeout)
            .await
        {
            Ok(true) => {
                debug!(key = %self.key, "lease renewed");
                true
            }
            Ok(false) => {
                warn!(key = %self.key, "lease renewal rejected, entry expired or taken over");
                metrics::record_renewal_failure(&self.key);
                false
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "lease renewal failed");
                metrics::record_renewal_failure(&self.key);
                false
            }
        }
    }

    /// Delete the remote entry if this lease still owns it.
    ///
    /// Returns `Ok(false)` when the lease is not held or the entry already
    /// expired and was taken over.
    pub async fn release(&self) -> LockResult<bool> {
        if self.state() != LeaseState::Held {
            return Ok(false);
        }

        let removed = self.store.remove_owned(&self.key, &self.token).await?;
        self.set_state(STATE_RELEASED);
        debug!(key = %self.key, removed, "lease released");
        Ok(removed)
    }

    /// Delete the remote entry regardless of current ownership.
    ///
    /// Administrative recovery: removes the entry even when another holder
    /// owns it by now.
    pub async fn clear(&self) -> LockResult<bool> {
        let removed = self.store.remove(&self.key).await?;
        self.set_state(STATE_CLEARED);
        debug!(key = %self.key, removed, "lease cleared");
        Ok(removed)
    }
}
