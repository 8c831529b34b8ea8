//! Minting transaction nonce.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use shared_types::primitives::parse_hex_array;
use shared_types::{CodecError, Decode, Decoder, Encode, Encoder};

/// 8 random bytes making otherwise identical minting transactions unique.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TransactionNonce(pub [u8; 8]);

impl TransactionNonce {
    /// Fresh random, non-zero nonce.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let mut bytes = [0u8; 8];
            rng.fill_bytes(&mut bytes);
            if bytes != [0u8; 8] {
                return Self(bytes);
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 8]
    }
}

impl fmt::Display for TransactionNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TransactionNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionNonce({})", self)
    }
}

impl FromStr for TransactionNonce {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_array("nonce", s).map(Self)
    }
}

impl Encode for TransactionNonce {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_raw(&self.0);
    }
}

impl Decode for TransactionNonce {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        dec.get_array().map(Self)
    }
}

shared_types::impl_serde_via_str!(TransactionNonce);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_nonce_non_zero() {
        for _ in 0..32 {
            assert!(!TransactionNonce::random().is_zero());
        }
    }

    #[test]
    fn test_text_form() {
        let nonce = TransactionNonce([1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(nonce.to_string(), "0102030405060708");
        assert_eq!("0102030405060708".parse::<TransactionNonce>().unwrap(), nonce);
    }
}
