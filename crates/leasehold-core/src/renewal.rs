//! Background renewal of held leases
//!
//! One fixed-rate task per held lease, all drawing permits from a shared
//! semaphore so a burst of due renewals cannot flood the store. Cancellation
//! is cooperative: the stop signal is observed between invocations, so an
//! in-flight renewal call always finishes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::time;
use tracing::debug;

use crate::lease::Lease;

pub(crate) struct RenewalScheduler {
    permits: Arc<Semaphore>,
}

impl RenewalScheduler {
    pub(crate) fn new(pool_size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(pool_size)),
        }
    }

    /// Spawn a fixed-rate renewal loop for `lease`.
    ///
    /// The first renewal runs one full `period` after scheduling; the loop
    /// stops when the handle is cancelled or dropped.
    pub(crate) fn schedule(&self, lease: Arc<Lease>, period: Duration) -> RenewalHandle {
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        let permits = self.permits.clone();

        tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = stop_rx.recv() => break,
                    _ = ticker.tick() => {
                        let Ok(_permit) = permits.acquire().await else {
                            break;
                        };
                        lease.renew().await;
                    }
                }
            }
            debug!(key = %lease.key(), "renewal task stopped");
        });

        RenewalHandle { stop_tx }
    }
}

/// Cancellable handle to one scheduled renewal loop
pub(crate) struct RenewalHandle {
    stop_tx: mpsc::Sender<()>,
}

impl RenewalHandle {
    /// Signal the loop to stop; a renewal already in flight finishes first.
    /// Dropping the handle has the same effect.
    pub(crate) fn cancel(&self) {
        let _ = self.stop_tx.try_send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leasehold_store::{LockKey, MemoryStore};

    fn held_lease(store: &MemoryStore, key: &str, expire: Duration) -> Arc<Lease> {
        Arc::new(Lease::new(
            Arc::new(store.clone()),
            LockKey::from(key),
            Duration::from_millis(100),
            expire,
        ))
    }

    #[tokio::test]
    async fn test_scheduled_renewal_keeps_lease_alive() {
        let store = MemoryStore::new();
        let lease = held_lease(&store, "k", Duration::from_millis(100));
        assert!(lease.try_acquire().await.unwrap());

        let scheduler = RenewalScheduler::new(4);
        let handle = scheduler.schedule(lease.clone(), Duration::from_millis(20));

        // Well past the unrenewed TTL the key is still taken
        tokio::time::sleep(Duration::from_millis(300)).await;
        let contender = held_lease(&store, "k", Duration::from_millis(100));
        assert!(!contender.try_acquire().await.unwrap());

        handle.cancel();
    }

    #[tokio::test]
    async fn test_cancel_stops_renewal() {
        let store = MemoryStore::new();
        let lease = held_lease(&store, "k", Duration::from_millis(80));
        assert!(lease.try_acquire().await.unwrap());

        let scheduler = RenewalScheduler::new(4);
        let handle = scheduler.schedule(lease.clone(), Duration::from_millis(20));
        handle.cancel();

        // With renewal stopped the entry expires on its own
        tokio::time::sleep(Duration::from_millis(200)).await;
        let contender = held_lease(&store, "k", Duration::from_millis(100));
        assert!(contender.try_acquire().await.unwrap());
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_renewal() {
        let store = MemoryStore::new();
        let lease = held_lease(&store, "k", Duration::from_millis(80));
        assert!(lease.try_acquire().await.unwrap());

        let scheduler = RenewalScheduler::new(4);
        drop(scheduler.schedule(lease.clone(), Duration::from_millis(20)));

        tokio::time::sleep(Duration::from_millis(200)).await;
        let contender = held_lease(&store, "k", Duration::from_millis(100));
        assert!(contender.try_acquire().await.unwrap());
    }
}
