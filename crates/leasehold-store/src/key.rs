//! Lock identity keyed by raw bytes
//!
//! A `LockKey` compares by byte content, so a key built from a `&str` and a
//! key built from the same UTF-8 bytes are interchangeable as map keys.

use std::fmt::{Display, Formatter};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::OnceLock;

use bytes::Bytes;

/// Identity of a lock: an immutable byte sequence with a cached hash.
///
/// The hash is computed on first use and memoized; all instances hash the
/// same byte content to the same value.
#[derive(Clone, Debug)]
pub struct LockKey {
    bytes: Bytes,
    hash: OnceLock<u64>,
}

impl LockKey {
    /// Create a key from raw bytes
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            hash: OnceLock::new(),
        }
    }

    /// Create a key from text, encoded as UTF-8 bytes
    pub fn from_text(text: &str) -> Self {
        Self::new(Bytes::copy_from_slice(text.as_bytes()))
    }

    /// The raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    // DefaultHasher instances created through new() all hash identically
    // within one process, so the memoized value is stable across clones.
    fn cached_hash(&self) -> u64 {
        *self.hash.get_or_init(|| {
            let mut hasher = DefaultHasher::new();
            hasher.write(&self.bytes);
            hasher.finish()
        })
    }
}

impl PartialEq for LockKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for LockKey {}

impl Hash for LockKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.cached_hash());
    }
}

impl From<&str> for LockKey {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for LockKey {
    fn from(text: String) -> Self {
        Self::new(Bytes::from(text.into_bytes()))
    }
}

impl From<&[u8]> for LockKey {
    fn from(bytes: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(bytes))
    }
}

impl From<Vec<u8>> for LockKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(Bytes::from(bytes))
    }
}

impl From<Bytes> for LockKey {
    fn from(bytes: Bytes) -> Self {
        Self::new(bytes)
    }
}

impl Display for LockKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}
