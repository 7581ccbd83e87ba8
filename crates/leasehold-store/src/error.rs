//! Error types for store client operations

/// Error type for store client operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("connection error: {0}")]
    Connection(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(feature = "redis-backend")]
impl From<::redis::RedisError> for StoreError {
    fn from(err: ::redis::RedisError) -> Self {
        StoreError::Backend(format!("redis error: {}", err))
    }
}
