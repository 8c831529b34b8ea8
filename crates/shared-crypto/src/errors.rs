//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Invalid public key length
    #[error("invalid public key length: expected {expected}, got {actual}")]
    InvalidPublicKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Invalid signature length
    #[error("invalid signature length: expected {expected}, got {actual}")]
    InvalidSignatureLength {
        /// Expected signature length in bytes
        expected: usize,
        /// Actual signature length in bytes
        actual: usize,
    },

    /// The key bytes do not describe a point on the curve
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Signature verification failed
    #[error("signature verification failed")]
    SignatureVerificationFailed,
}
