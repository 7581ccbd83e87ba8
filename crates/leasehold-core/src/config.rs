//! Lock manager configuration

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{LockError, LockResult};

/// Default maximum time a blocking `lock` keeps retrying acquisition
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5000;

/// Default TTL granted to a remote entry on acquire and on every renewal
pub const DEFAULT_EXPIRE_TIMEOUT_MS: u64 = 5000;

/// Configuration for a `LockManager`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LockManagerConfig {
    /// Maximum number of renewal calls running at once
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Maximum time a blocking `lock` keeps retrying, in milliseconds
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    /// TTL granted to the remote entry, in milliseconds; renewal runs at a
    /// fifth of this window
    #[serde(default = "default_expire_timeout_ms")]
    pub expire_timeout_ms: u64,
}

fn default_pool_size() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1) * 4
}

fn default_acquire_timeout_ms() -> u64 {
    DEFAULT_ACQUIRE_TIMEOUT_MS
}

fn default_expire_timeout_ms() -> u64 {
    DEFAULT_EXPIRE_TIMEOUT_MS
}

impl Default for LockManagerConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT_MS,
            expire_timeout_ms: DEFAULT_EXPIRE_TIMEOUT_MS,
        }
    }
}

impl LockManagerConfig {
    /// Set the renewal pool size
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Set the default acquisition timeout
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the default expiry timeout
    pub fn with_expire_timeout(mut self, timeout: Duration) -> Self {
        self.expire_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn expire_timeout(&self) -> Duration {
        Duration::from_millis(self.expire_timeout_ms)
    }

    pub(crate) fn validate(&self) -> LockResult<()> {
        if self.pool_size == 0 {
            return Err(LockError::Config(
                "pool_size must be greater than zero".to_string(),
            ));
        }
        if self.acquire_timeout_ms == 0 {
            return Err(LockError::Config(
                "acquire_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.expire_timeout_ms == 0 {
            return Err(LockError::Config(
                "expire_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
