//! # Public Keys and Unlock Hashes
//!
//! A public key is an algorithm tag plus raw key bytes. An unlock hash is the
//! address form of a condition: a type byte plus a 32 byte digest.

use std::fmt;
use std::str::FromStr;

use shared_crypto::{hash_bytes, short_checksum, verify_ed25519, Ed25519PublicKey, ED25519_PUBLIC_KEY_SIZE};

use crate::codec::{Decode, Decoder, Encode, Encoder};
use crate::errors::{CodecError, ConditionError};
use crate::primitives::parse_hex_array;

// =============================================================================
// PUBLIC KEY
// =============================================================================

/// Signature algorithm of a [`PublicKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SignatureAlgorithm {
    Nil = 0,
    Ed25519 = 1,
}

impl SignatureAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Nil => "nil",
            SignatureAlgorithm::Ed25519 => "ed25519",
        }
    }

    fn key_size(&self) -> usize {
        match self {
            SignatureAlgorithm::Nil => 0,
            SignatureAlgorithm::Ed25519 => ED25519_PUBLIC_KEY_SIZE,
        }
    }

    fn from_u8(b: u8) -> Result<Self, CodecError> {
        match b {
            0 => Ok(SignatureAlgorithm::Nil),
            1 => Ok(SignatureAlgorithm::Ed25519),
            other => Err(CodecError::invalid(
                "signature algorithm",
                format!("unknown algorithm {}", other),
            )),
        }
    }
}

/// Algorithm-tagged public key.
///
/// Binary: algorithm byte, then the key as a length-prefixed slice.
/// Text: `"<algorithm>:<hex key>"`, e.g. `"ed25519:0123..."`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey {
    algorithm: SignatureAlgorithm,
    key: Vec<u8>,
}

impl PublicKey {
    pub fn ed25519(key: Ed25519PublicKey) -> Self {
        Self {
            algorithm: SignatureAlgorithm::Ed25519,
            key: key.as_bytes().to_vec(),
        }
    }

    /// Build from raw parts, checking the key length against the algorithm.
    pub fn new(algorithm: SignatureAlgorithm, key: Vec<u8>) -> Result<Self, CodecError> {
        if key.len() != algorithm.key_size() {
            return Err(CodecError::InvalidLength {
                what: "public key",
                length: key.len(),
            });
        }
        Ok(Self { algorithm, key })
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Verify `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), ConditionError> {
        match self.algorithm {
            SignatureAlgorithm::Ed25519 => verify_ed25519(&self.key, message, signature).map_err(|e| {
                ConditionError::InvalidSignature {
                    reason: e.to_string(),
                }
            }),
            SignatureAlgorithm::Nil => Err(ConditionError::InvalidSignature {
                reason: "nil public key cannot verify signatures".into(),
            }),
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.name(), hex::encode(&self.key))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algo, key) = s
            .split_once(':')
            .ok_or_else(|| CodecError::invalid("public key", "missing algorithm prefix"))?;
        let algorithm = match algo {
            "ed25519" => SignatureAlgorithm::Ed25519,
            "nil" => SignatureAlgorithm::Nil,
            other => {
                return Err(CodecError::invalid(
                    "public key",
                    format!("unknown algorithm {:?}", other),
                ))
            }
        };
        let key = hex::decode(key).map_err(|e| CodecError::invalid("public key", e.to_string()))?;
        Self::new(algorithm, key)
    }
}

impl Encode for PublicKey {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u8(self.algorithm as u8).put_prefixed(&self.key);
    }
}

impl Decode for PublicKey {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let algorithm = SignatureAlgorithm::from_u8(dec.get_u8()?)?;
        let key = dec.get_prefixed()?;
        Self::new(algorithm, key)
    }
}

crate::impl_serde_via_str!(PublicKey);

// =============================================================================
// UNLOCK HASH
// =============================================================================

/// Type byte of an [`UnlockHash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum UnlockType {
    Nil = 0,
    PubKey = 1,
    MultiSig = 3,
}

impl UnlockType {
    fn from_u8(b: u8) -> Result<Self, CodecError> {
        match b {
            0 => Ok(UnlockType::Nil),
            1 => Ok(UnlockType::PubKey),
            3 => Ok(UnlockType::MultiSig),
            other => Err(CodecError::invalid(
                "unlock type",
                format!("unknown unlock type {}", other),
            )),
        }
    }
}

/// Address derived from an unlock condition.
///
/// Text form: hex of the type byte, the 32 byte hash and a 6 byte checksum
/// (78 hex characters).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnlockHash {
    pub unlock_type: UnlockType,
    pub hash: [u8; 32],
}

impl UnlockHash {
    pub const NIL: Self = Self {
        unlock_type: UnlockType::Nil,
        hash: [0u8; 32],
    };

    pub fn new(unlock_type: UnlockType, hash: [u8; 32]) -> Self {
        Self { unlock_type, hash }
    }

    /// Address of a single public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self {
            unlock_type: UnlockType::PubKey,
            hash: hash_bytes(&public_key.to_bytes()),
        }
    }

    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }

    fn checksum(&self) -> [u8; 6] {
        let mut buf = [0u8; 33];
        buf[0] = self.unlock_type as u8;
        buf[1..].copy_from_slice(&self.hash);
        short_checksum(&buf)
    }
}

impl Default for UnlockHash {
    fn default() -> Self {
        Self::NIL
    }
}

impl fmt::Display for UnlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}{}{}",
            self.unlock_type as u8,
            hex::encode(self.hash),
            hex::encode(self.checksum())
        )
    }
}

impl fmt::Debug for UnlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnlockHash({})", self)
    }
}

impl FromStr for UnlockHash {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: [u8; 39] = parse_hex_array("unlock hash", s)?;
        let unlock_type = UnlockType::from_u8(raw[0])?;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&raw[1..33]);
        let uh = Self { unlock_type, hash };
        if uh.checksum()[..] != raw[33..] {
            return Err(CodecError::invalid("unlock hash", "checksum mismatch"));
        }
        Ok(uh)
    }
}

impl Encode for UnlockHash {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u8(self.unlock_type as u8).put_raw(&self.hash);
    }
}

impl Decode for UnlockHash {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let unlock_type = UnlockType::from_u8(dec.get_u8()?)?;
        Ok(Self {
            unlock_type,
            hash: dec.get_array()?,
        })
    }
}

crate::impl_serde_via_str!(UnlockHash);
