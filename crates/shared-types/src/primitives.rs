//! # Primitives
//!
//! Identifiers, currency and specifiers. Every type here has one binary form
//! (see [`crate::codec`]) and one text form (`Display`/`FromStr`), and its
//! serde representation is the text form.

use std::fmt;
use std::ops::{Add, Mul};
use std::str::FromStr;

pub use primitive_types::U256;

use crate::codec::{Decode, Decoder, Encode, Encoder};
use crate::errors::CodecError;

/// Block height.
pub type BlockHeight = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Implement `Serialize`/`Deserialize` through `Display`/`FromStr`.
#[macro_export]
macro_rules! impl_serde_via_str {
    ($ty:ty) => {
        impl ::serde::Serialize for $ty {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(::serde::de::Error::custom)
            }
        }
    };
}

/// Serde helper for byte vectors carried as hex strings.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

/// Decode a hex string into a fixed-size array.
pub fn parse_hex_array<const N: usize>(what: &'static str, s: &str) -> Result<[u8; N], CodecError> {
    let bytes = hex::decode(s).map_err(|e| CodecError::invalid(what, e.to_string()))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CodecError::InvalidLength {
            what,
            length: bytes.len(),
        })
}

macro_rules! hash_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub const ZERO: Self = Self([0u8; 32]);

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self)
            }
        }

        impl FromStr for $name {
            type Err = CodecError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hex_array(stringify!($name), s).map(Self)
            }
        }

        impl Encode for $name {
            fn encode(&self, enc: &mut Encoder) {
                enc.put_raw(&self.0);
            }
        }

        impl Decode for $name {
            fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
                dec.get_array().map(Self)
            }
        }

        impl_serde_via_str!($name);
    };
}

hash_newtype!(
    /// Identifier of a transaction: hash of its canonical encoding.
    TransactionId
);
hash_newtype!(
    /// Identifier of a coin output: hash of the creating transaction id and output index.
    CoinOutputId
);
hash_newtype!(
    /// Identifier of a block.
    BlockId
);
hash_newtype!(
    /// Cursor into the consensus change feed.
    ConsensusChangeId
);

impl ConsensusChangeId {
    /// Cursor that replays the feed from genesis.
    pub const BEGINNING: Self = Self::ZERO;
}

// =============================================================================
// CURRENCY
// =============================================================================

/// Unsigned coin amount in the smallest unit.
///
/// Binary form: one length byte followed by the minimal big-endian bytes.
/// Text form: decimal string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Currency(U256);

impl Currency {
    pub const fn zero() -> Self {
        Self(U256::zero())
    }

    pub fn new(value: u64) -> Self {
        Self(U256::from(value))
    }

    pub fn from_u256(value: U256) -> Self {
        Self(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// `self * numerator / denominator`, truncated, without intermediate overflow
    /// for any amount that fits in 128 bits.
    pub fn mul_div(self, numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            return Self::zero();
        }
        Self(self.0.saturating_mul(U256::from(numerator)) / U256::from(denominator))
    }
}

/// Saturating; amounts never approach 2^256.
impl Add for Currency {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Mul<u64> for Currency {
    type Output = Self;

    fn mul(self, rhs: u64) -> Self {
        Self(self.0.saturating_mul(U256::from(rhs)))
    }
}

impl std::iter::Sum for Currency {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, c| acc + c)
    }
}

impl From<u64> for Currency {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.0)
    }
}

impl FromStr for Currency {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodecError::invalid("currency", format!("{:?} is not a decimal", s)));
        }
        U256::from_dec_str(s)
            .map(Self)
            .map_err(|e| CodecError::invalid("currency", format!("{:?}", e)))
    }
}

impl Encode for Currency {
    fn encode(&self, enc: &mut Encoder) {
        let mut buf = [0u8; 32];
        self.0.to_big_endian(&mut buf);
        let start = buf.iter().position(|b| *b != 0).unwrap_or(32);
        enc.put_u8((32 - start) as u8).put_raw(&buf[start..]);
    }
}

impl Decode for Currency {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let len = dec.get_u8()? as usize;
        if len > 32 {
            return Err(CodecError::InvalidLength {
                what: "currency",
                length: len,
            });
        }
        let bytes = dec.take(len)?;
        if bytes.first() == Some(&0) {
            return Err(CodecError::invalid("currency", "leading zero byte"));
        }
        Ok(Self(U256::from_big_endian(bytes)))
    }
}

impl_serde_via_str!(Currency);

// =============================================================================
// SPECIFIER
// =============================================================================

/// 16-byte, zero-padded ASCII tag used for domain separation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Specifier(pub [u8; 16]);

impl Specifier {
    /// Build a specifier from at most 16 ASCII bytes; longer input is truncated.
    pub const fn new(tag: &[u8]) -> Self {
        let mut out = [0u8; 16];
        let mut i = 0;
        while i < tag.len() && i < 16 {
            out[i] = tag[i];
            i += 1;
        }
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(16);
        f.write_str(&String::from_utf8_lossy(&self.0[..end]))
    }
}

impl fmt::Debug for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Specifier({:?})", self.to_string())
    }
}

impl Encode for Specifier {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_raw(&self.0);
    }
}

impl Decode for Specifier {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        dec.get_array().map(Self)
    }
}
