//! Store client contract consumed by leases

use std::time::Duration;

use async_trait::async_trait;

use crate::{LockKey, StoreResult};

/// Contract a remote key-value store must satisfy to back a lease.
///
/// All owner-sensitive operations carry the per-acquisition `token` written
/// at acquire time, so a store can verify that the caller still holds the
/// entry before mutating it.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Write `token` under `key` with the given TTL, only if no live entry
    /// exists. Returns `true` when the entry was written.
    async fn put_if_absent(&self, key: &LockKey, token: &str, ttl: Duration) -> StoreResult<bool>;

    /// Reset the TTL of `key` to the full window, only if the stored token
    /// matches. Returns `false` when the entry is gone or owned by someone
    /// else; extending is best-effort and safe to retry.
    async fn extend(&self, key: &LockKey, token: &str, ttl: Duration) -> StoreResult<bool>;

    /// Delete `key` only if the stored token matches. Returns `true` when an
    /// entry owned by `token` was removed.
    async fn remove_owned(&self, key: &LockKey, token: &str) -> StoreResult<bool>;

    /// Delete `key` regardless of who owns it. Administrative recovery path.
    async fn remove(&self, key: &LockKey) -> StoreResult<bool>;
}
