//! # BLAKE3 Object Hashing
//!
//! All identifiers (transaction ids, coin output ids, unlock hashes) and all
//! signature digests are BLAKE3 over canonical binary encodings.

use blake3::Hasher;

/// 256-bit digest.
pub type Digest = [u8; 32];

/// Streaming hasher fed with encoded objects.
pub struct ObjectHasher {
    inner: Hasher,
}

impl ObjectHasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self {
            inner: Hasher::new(),
        }
    }

    /// Feed raw bytes.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return the digest.
    pub fn finalize(&self) -> Digest {
        *self.inner.finalize().as_bytes()
    }
}

impl Default for ObjectHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot hash.
pub fn hash_bytes(data: &[u8]) -> Digest {
    *blake3::hash(data).as_bytes()
}

/// Six byte checksum appended to the text form of unlock hashes.
pub fn short_checksum(data: &[u8]) -> [u8; 6] {
    let digest = hash_bytes(data);
    let mut out = [0u8; 6];
    out.copy_from_slice(&digest[..6]);
    out
}
