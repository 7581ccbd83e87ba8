//! Error types for lock manager operations

use leasehold_store::StoreError;

/// Error type for lock manager operations.
///
/// "Could not lock" is not an error: acquisition outcomes are reported as
/// `Ok(false)`. Errors cover misconfiguration and store/transport failures.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type LockResult<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LockError::Config("pool_size must be greater than zero".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: pool_size must be greater than zero"
        );

        let err = LockError::from(StoreError::Backend("write failed".to_string()));
        assert_eq!(err.to_string(), "store error: backend error: write failed");
    }
}
