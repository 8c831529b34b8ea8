//! # Shared Crypto
//!
//! Cryptographic primitives used by the transaction protocol and the index.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | BLAKE3 | Object ids, unlock hashes, signature digests |
//! | `signatures` | Ed25519 | Fulfillments, 3bot identification, ERC20 registration |
//!
//! Signature digests are always computed over the canonical binary encoding
//! of an object, never over its text form.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{hash_bytes, short_checksum, Digest, ObjectHasher};
pub use signatures::{
    verify_ed25519, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, ED25519_PUBLIC_KEY_SIZE,
    ED25519_SIGNATURE_SIZE,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
