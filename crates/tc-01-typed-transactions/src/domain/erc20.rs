//! # ERC20 Bridge Values
//!
//! Foreign-chain identifiers carried by the bridge transactions.

use std::fmt;
use std::str::FromStr;

use shared_types::primitives::parse_hex_array;
use shared_types::{hash_object, CodecError, Decode, Decoder, Encode, Encoder, UnlockHash};

/// Length of an ERC20 (Ethereum) address.
pub const ERC20_ADDRESS_LENGTH: usize = 20;

/// 20 byte Ethereum address, text form is 40 hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Erc20Address(pub [u8; ERC20_ADDRESS_LENGTH]);

impl Erc20Address {
    /// Deterministic ERC20 address of a native address: the last 20 bytes
    /// of the hash of its unlock hash.
    pub fn from_unlock_hash(uh: &UnlockHash) -> Self {
        let digest = hash_object(uh);
        let mut out = [0u8; ERC20_ADDRESS_LENGTH];
        out.copy_from_slice(&digest[32 - ERC20_ADDRESS_LENGTH..]);
        Self(out)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ERC20_ADDRESS_LENGTH]
    }
}

/// 32 byte Ethereum block or transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Erc20Hash(pub [u8; 32]);

macro_rules! fixed_hex {
    ($name:ident, $what:literal) => {
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
                parse_hex_array($what, s).map(Self)
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

        shared_types::impl_serde_via_str!($name);
    };
}

fixed_hex!(Erc20Address, "ERC20 address");
fixed_hex!(Erc20Hash, "ERC20 hash");

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::UnlockType;

    #[test]
    fn test_address_text() {
        let addr: Erc20Address = "0102030405060708090a0b0c0d0e0f1011121314".parse().unwrap();
        assert_eq!(addr.0[0], 1);
        assert_eq!(addr.to_string(), "0102030405060708090a0b0c0d0e0f1011121314");
        assert!("0102".parse::<Erc20Address>().is_err());
    }

    #[test]
    fn test_address_from_unlock_hash_is_digest_suffix() {
        let uh = UnlockHash::new(UnlockType::PubKey, [7u8; 32]);
        let addr = Erc20Address::from_unlock_hash(&uh);
        let digest = hash_object(&uh);
        assert_eq!(addr.0[..], digest[12..]);
        assert_ne!(addr, Erc20Address::from_unlock_hash(&UnlockHash::NIL));
    }

    #[test]
    fn test_hash_binary() {
        let h = Erc20Hash([9u8; 32]);
        assert_eq!(Erc20Hash::from_bytes(&h.to_bytes()).unwrap(), h);
    }
}
