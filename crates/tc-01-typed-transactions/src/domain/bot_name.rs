//! # Bot Names
//!
//! DNS-like names a 3bot can be reached by. Names compare case-insensitively,
//! which is enforced by lower-casing on construction and decoding.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{CodecError, Decode, Decoder, Encode, Encoder};

use super::errors::EntityError;

/// Longest name (in bytes) a 3bot may register.
pub const MAX_BOT_NAME_LENGTH: usize = 63;

lazy_static! {
    static ref BOT_NAME_REGEX: Regex = Regex::new(
        r"^[A-Za-z][A-Za-z\-0-9]{3,61}[A-Za-z0-9](\.[A-Za-z][A-Za-z\-0-9]{3,55}[A-Za-z0-9])*$"
    )
    .expect("bot name regex is valid");
}

/// Validated, lower-cased 3bot name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BotName(String);

impl BotName {
    pub fn new(name: &str) -> Result<Self, EntityError> {
        if name.is_empty() {
            return Err(EntityError::NilBotName);
        }
        if name.len() > MAX_BOT_NAME_LENGTH {
            return Err(EntityError::BotNameTooLong { length: name.len() });
        }
        if !BOT_NAME_REGEX.is_match(name) {
            return Err(EntityError::InvalidBotName {
                name: name.to_string(),
            });
        }
        Ok(Self(name.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BotName({})", self.0)
    }
}

impl FromStr for BotName {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Encode for BotName {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_prefixed(self.0.as_bytes());
    }
}

impl Decode for BotName {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let raw = dec.get_prefixed()?;
        let name = std::str::from_utf8(&raw).map_err(|e| CodecError::invalid("bot name", e.to_string()))?;
        Self::new(name).map_err(|e| CodecError::invalid("bot name", e.to_string()))
    }
}

shared_types::impl_serde_via_str!(BotName);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["alice.example", "thisis.mybot", "chatbot.example.foobar", "aaaaa"] {
            assert!(BotName::new(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(BotName::new(""), Err(EntityError::NilBotName));
        for name in ["a", "abc", "1alice", "alice-", "alice..example", "alice.exa"] {
            assert!(BotName::new(name).is_err(), "{} should be invalid", name);
        }
        let long = format!("a{}", "b".repeat(63));
        assert!(matches!(
            BotName::new(&long),
            Err(EntityError::BotNameTooLong { length: 64 })
        ));
    }

    #[test]
    fn test_lower_cased() {
        let name = BotName::new("Alice.Example").unwrap();
        assert_eq!(name.as_str(), "alice.example");
        assert_eq!(name, BotName::new("ALICE.EXAMPLE").unwrap());
    }

    #[test]
    fn test_binary_and_text() {
        let name = BotName::new("alice.example").unwrap();
        assert_eq!(BotName::from_bytes(&name.to_bytes()).unwrap(), name);
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"alice.example\"");
        assert!(serde_json::from_str::<BotName>("\"a.b\"").is_err());
    }
}
