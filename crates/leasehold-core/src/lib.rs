//! Leasehold - auto-renewing distributed locks
//!
//! This crate provides:
//! - `LockManager`: per-key lease bookkeeping over a shared store client
//! - `Lease`: one outstanding claim on a key, with blocking and
//!   single-attempt acquisition
//! - Background renewal at a fixed fraction of the lease TTL, so a holder
//!   alive past the TTL keeps its lease while a crashed holder's lease
//!   expires on its own
//!
//! Intended for critical sections whose duration cannot be bounded up
//! front: the lease stays short, and renewal does the stretching.

pub mod config;
pub mod error;
pub mod lease;
pub mod manager;
pub mod metrics;

mod renewal;

pub use config::LockManagerConfig;
pub use error::{LockError, LockResult};
pub use lease::{Lease, LeaseState};
pub use manager::LockManager;

// Store seam re-exports
pub use leasehold_store::{LockKey, LockStore, MemoryStore, StoreError, StoreResult};

#[cfg(feature = "redis-backend")]
pub use leasehold_store::RedisStore;
