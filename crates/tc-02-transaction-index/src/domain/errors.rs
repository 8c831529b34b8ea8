//! Error types for the transaction index.

use shared_types::CodecError;
use tc_01_typed_transactions::{EntityError, RegistryError};
use thiserror::Error;

use crate::adapters::lock::LockError;

/// Key-value store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

/// Errors raised while opening, updating or querying the index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// An expected entry is missing or malformed. Never repaired silently.
    #[error("corrupt transaction index: {message}")]
    Corruption { message: String },

    #[error(transparent)]
    Storage(#[from] KVStoreError),

    #[error("undecodable stored value: {0}")]
    Codec(#[from] CodecError),

    #[error("bot record update failed: {0}")]
    Entity(#[from] EntityError),

    #[error("stored genesis mint condition differs from the configured one")]
    GenesisMismatch,

    #[error("unsupported transaction index version {version}")]
    UnsupportedVersion { version: String },

    /// Shutdown has begun; no new work is accepted.
    #[error("transaction index is stopped")]
    Stopped,

    #[error("bot id counter exceeds 32 bits")]
    IdOverflow,

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("consensus subscription failed: {0}")]
    Subscription(String),
}

impl IndexError {
    pub fn corruption(message: impl Into<String>) -> Self {
        IndexError::Corruption {
            message: message.into(),
        }
    }
}

/// Failure of a free-form bot lookup by id, name or public key.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("not a bot id, name or public key: {0}")]
    Invalid(#[from] EntityError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<IndexError> for RegistryError {
    fn from(err: IndexError) -> Self {
        RegistryError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_is_transparent() {
        let err: IndexError = KVStoreError::IOError {
            message: "disk full".into(),
        }
        .into();
        assert_eq!(err.to_string(), "KV store I/O error: disk full");
    }

    #[test]
    fn test_registry_conversion() {
        let err: RegistryError = IndexError::Stopped.into();
        assert_eq!(err, RegistryError::Internal("transaction index is stopped".into()));
    }
}
