//! Store clients for the leasehold lock manager
//!
//! This crate provides:
//! - `LockKey`: byte-sequence lock identity with a cached hash
//! - `LockStore`: the contract a remote key-value store must satisfy to back
//!   a lease (set-if-absent with expiry, token-guarded extend and delete,
//!   unconditional delete)
//! - `MemoryStore`: in-process backend for testing and single-node use
//! - `RedisStore`: Redis backend (feature: `redis-backend`)

pub mod client;
pub mod error;
pub mod key;
pub mod memory;

#[cfg(feature = "redis-backend")]
pub mod redis;

pub use client::LockStore;
pub use error::{StoreError, StoreResult};
pub use key::LockKey;
pub use memory::MemoryStore;

#[cfg(feature = "redis-backend")]
pub use redis::RedisStore;
