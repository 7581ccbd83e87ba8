//! Redis store backend (feature: `redis-backend`)
//!
//! Maps the store contract onto Redis primitives: `SET NX PX` for
//! acquisition and compare-token Lua scripts for the owner-guarded extend
//! and delete paths, so an entry taken over by another holder after natural
//! expiry is never touched.

use std::time::Duration;

use async_trait::async_trait;
use redis::Script;
use redis::aio::ConnectionManager;
use tracing::debug;

use crate::{LockKey, LockStore, StoreError, StoreResult};

const EXTEND_SCRIPT: &str = r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('pexpire', KEYS[1], ARGV[2])
else
    return 0
end
"#;

const REMOVE_OWNED_SCRIPT: &str = r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('del', KEYS[1])
else
    return 0
end
"#;

/// Redis-backed `LockStore`.
///
/// Uses a multiplexed connection with automatic reconnection; clones share
/// the connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to a Redis server.
    ///
    /// Example URLs:
    /// - `redis://127.0.0.1/`
    /// - `rediss://host:6379/`
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::Connection(format!("failed to create redis client: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| StoreError::Connection(format!("failed to connect redis: {e}")))?;

        debug!(url = %redis_url, "redis store connected");
        Ok(Self { conn })
    }

    /// Wrap an existing connection manager
    pub fn with_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn ttl_millis(ttl: Duration) -> u64 {
        ttl.as_millis() as u64
    }
}

#[async_trait]
impl LockStore for RedisStore {
    async fn put_if_absent(&self, key: &LockKey, token: &str, ttl: Duration) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key.as_bytes())
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(Self::ttl_millis(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn extend(&self, key: &LockKey, token: &str, ttl: Duration) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let extended: i64 = Script::new(EXTEND_SCRIPT)
            .key(key.as_bytes())
            .arg(token)
            .arg(Self::ttl_millis(ttl))
            .invoke_async(&mut conn)
            .await?;
        Ok(extended == 1)
    }

    async fn remove_owned(&self, key: &LockKey, token: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = Script::new(REMOVE_OWNED_SCRIPT)
            .key(key.as_bytes())
            .arg(token)
            .invoke_async(&mut conn)
            .await?;
        Ok(removed == 1)
    }

    async fn remove(&self, key: &LockKey) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::cmd("DEL")
            .arg(key.as_bytes())
            .query_async(&mut conn)
            .await?;
        Ok(removed > 0)
    }
}
