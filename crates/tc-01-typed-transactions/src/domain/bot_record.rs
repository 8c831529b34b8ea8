//! # 3Bot Records
//!
//! One record per registered 3bot. Records are never deleted: once their
//! expiration passes they turn inactive and their names are considered
//! released, while id and public key stay resolvable.
//!
//! Binary form:
//!
//! ```text
//! id (u32) | addrCount | nameCount << 4 | addresses | names | public key | expiration (u24)
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shared_types::{decode_counted, CodecError, Decode, Decoder, Encode, Encoder, PublicKey, Timestamp};

use super::bot_name::BotName;
use super::errors::EntityError;
use super::network_address::NetworkAddress;
use super::timestamp::CompactTimestamp;

/// Maximum names per bot.
pub const MAX_NAMES_PER_BOT: usize = 5;

/// Maximum network addresses per bot.
pub const MAX_ADDRESSES_PER_BOT: usize = 10;

/// 30 days of exactly 24 hours, in seconds.
pub const BOT_MONTH: u64 = 60 * 60 * 24 * 30;

/// Months that may be paid upfront.
pub const MAX_BOT_PREPAID_MONTHS: u8 = 24;

/// Smallest id ever assigned.
pub const MIN_BOT_ID: u32 = 1;

// =============================================================================
// BOT ID
// =============================================================================

/// Dense identifier assigned on registration, starting at 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotId(pub u32);

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BotId({})", self.0)
    }
}

impl FromStr for BotId {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: u32 = s.parse().map_err(|e: std::num::ParseIntError| EntityError::InvalidBotId {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        if id < MIN_BOT_ID {
            return Err(EntityError::InvalidBotId {
                input: s.to_string(),
                reason: format!("has to be at least {}", MIN_BOT_ID),
            });
        }
        Ok(Self(id))
    }
}

impl Encode for BotId {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u32(self.0);
    }
}

impl Decode for BotId {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        dec.get_u32().map(Self)
    }
}

// =============================================================================
// BOT RECORD
// =============================================================================

/// Stored state of one 3bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotRecord {
    pub id: BotId,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub addresses: BTreeSet<NetworkAddress>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub names: BTreeSet<BotName>,
    #[serde(rename = "publickey")]
    pub public_key: PublicKey,
    pub expiration: CompactTimestamp,
}

impl BotRecord {
    /// Empty record; expiration must still be extended before it is active.
    pub fn new(id: BotId, public_key: PublicKey) -> Self {
        Self {
            id,
            addresses: BTreeSet::new(),
            names: BTreeSet::new(),
            public_key,
            expiration: CompactTimestamp::default(),
        }
    }

    /// Add names; fails without partial effect if the limit would be exceeded.
    pub fn add_names<'a>(&mut self, names: impl IntoIterator<Item = &'a BotName>) -> Result<(), EntityError> {
        let names: Vec<&BotName> = names.into_iter().collect();
        if self.names.len() + names.len() > MAX_NAMES_PER_BOT {
            return Err(EntityError::TooManyNames);
        }
        for name in names {
            if !self.names.insert(name.clone()) {
                return Err(EntityError::NameNotUnique { name: name.clone() });
            }
        }
        Ok(())
    }

    pub fn remove_names<'a>(&mut self, names: impl IntoIterator<Item = &'a BotName>) -> Result<(), EntityError> {
        for name in names {
            if !self.names.remove(name) {
                return Err(EntityError::NameNotFound { name: name.clone() });
            }
        }
        Ok(())
    }

    /// Drop all names, returning them.
    pub fn reset_names(&mut self) -> BTreeSet<BotName> {
        std::mem::take(&mut self.names)
    }

    pub fn add_network_addresses<'a>(
        &mut self,
        addresses: impl IntoIterator<Item = &'a NetworkAddress>,
    ) -> Result<(), EntityError> {
        let addresses: Vec<&NetworkAddress> = addresses.into_iter().collect();
        if self.addresses.len() + addresses.len() > MAX_ADDRESSES_PER_BOT {
            return Err(EntityError::TooManyAddresses);
        }
        for address in addresses {
            if !self.addresses.insert(address.clone()) {
                return Err(EntityError::AddressNotUnique {
                    address: address.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn remove_network_addresses<'a>(
        &mut self,
        addresses: impl IntoIterator<Item = &'a NetworkAddress>,
    ) -> Result<(), EntityError> {
        for address in addresses {
            if !self.addresses.remove(address) {
                return Err(EntityError::AddressNotFound {
                    address: address.clone(),
                });
            }
        }
        Ok(())
    }

    /// A bot is expired from the moment its expiration is reached.
    pub fn is_expired(&self, block_time: Timestamp) -> bool {
        self.expiration.timestamp() <= block_time
    }

    /// Extend the expiration by `months`, starting from `block_time` if the
    /// bot already expired. At most [`MAX_BOT_PREPAID_MONTHS`] may be prepaid.
    pub fn extend_expiration(&mut self, block_time: Timestamp, months: u8) -> Result<(), EntityError> {
        if months == 0 {
            return Err(EntityError::ZeroMonths);
        }
        if months > MAX_BOT_PREPAID_MONTHS {
            return Err(EntityError::ExpirationExtendOverflow);
        }
        let now = CompactTimestamp::from_timestamp(block_time);
        let base = if self.is_expired(block_time) {
            now
        } else {
            self.expiration
        };
        let extended = base.saturating_add_secs(BOT_MONTH * u64::from(months));
        if extended.timestamp() - now.timestamp() > BOT_MONTH * u64::from(MAX_BOT_PREPAID_MONTHS) {
            return Err(EntityError::ExpirationExtendOverflow);
        }
        self.expiration = extended;
        Ok(())
    }

    /// Structural inverse of [`BotRecord::extend_expiration`] for a bot that was active.
    pub fn shorten_expiration(&mut self, months: u8) {
        self.expiration = self
            .expiration
            .saturating_sub_secs(BOT_MONTH * u64::from(months));
    }
}

impl Encode for BotRecord {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.id)
            .put_u8(self.addresses.len() as u8 | (self.names.len() as u8) << 4);
        for address in &self.addresses {
            enc.put(address);
        }
        for name in &self.names {
            enc.put(name);
        }
        enc.put(&self.public_key).put(&self.expiration);
    }
}

impl Decode for BotRecord {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let id = dec.get()?;
        let counts = dec.get_u8()?;
        let (address_count, name_count) = ((counts & 15) as usize, (counts >> 4) as usize);
        check_count("bot addresses", address_count, MAX_ADDRESSES_PER_BOT)?;
        check_count("bot names", name_count, MAX_NAMES_PER_BOT)?;
        let addresses = collect_unique("bot addresses", decode_counted(dec, address_count)?)?;
        let names = collect_unique("bot names", decode_counted(dec, name_count)?)?;
        Ok(Self {
            id,
            addresses,
            names,
            public_key: dec.get()?,
            expiration: dec.get()?,
        })
    }
}

/// Reject a bit-packed count above its maximum.
pub(crate) fn check_count(what: &'static str, count: usize, max: usize) -> Result<(), CodecError> {
    if count > max {
        return Err(CodecError::CountOverflow { what, count, max });
    }
    Ok(())
}

fn collect_unique<T: Ord>(what: &'static str, items: Vec<T>) -> Result<BTreeSet<T>, CodecError> {
    let len = items.len();
    let set: BTreeSet<T> = items.into_iter().collect();
    if set.len() != len {
        return Err(CodecError::invalid(what, "duplicate entries"));
    }
    Ok(set)
}

// =============================================================================
// LOOKUP
// =============================================================================

/// Ambiguous user input resolved to one kind of record key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotLookup {
    Id(BotId),
    Name(BotName),
    PublicKey(PublicKey),
}

impl BotLookup {
    /// Try, in order, a bot id, a bot name and a public key.
    pub fn parse(input: &str) -> Result<Self, EntityError> {
        if let Ok(id) = input.parse::<BotId>() {
            return Ok(BotLookup::Id(id));
        }
        if let Ok(name) = BotName::new(input) {
            return Ok(BotLookup::Name(name));
        }
        input
            .parse::<PublicKey>()
            .map(BotLookup::PublicKey)
            .map_err(|_| EntityError::InvalidBotLookup {
                input: input.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::Ed25519KeyPair;

    const NOW: Timestamp = 1_600_000_020;

    fn record() -> BotRecord {
        let pk = PublicKey::ed25519(Ed25519KeyPair::from_seed([5; 32]).public_key());
        BotRecord::new(BotId(1), pk)
    }

    fn name(s: &str) -> BotName {
        BotName::new(s).unwrap()
    }

    fn addr(s: &str) -> NetworkAddress {
        NetworkAddress::new(s).unwrap()
    }

    #[test]
    fn test_name_limit_is_atomic() {
        let mut rec = record();
        let names: Vec<BotName> = ["aaaaa", "bbbbb", "ccccc", "ddddd"].iter().map(|s| name(s)).collect();
        rec.add_names(&names).unwrap();
        let extra = vec![name("eeeee"), name("fffff")];
        assert_eq!(rec.add_names(&extra), Err(EntityError::TooManyNames));
        assert_eq!(rec.names.len(), 4);
    }

    #[test]
    fn test_duplicate_and_missing() {
        let mut rec = record();
        rec.add_names([&name("alice.example")]).unwrap();
        assert!(matches!(
            rec.add_names([&name("alice.example")]),
            Err(EntityError::NameNotUnique { .. })
        ));
        assert!(matches!(
            rec.remove_names([&name("bobby.example")]),
            Err(EntityError::NameNotFound { .. })
        ));
        assert!(matches!(
            rec.remove_network_addresses([&addr("1.2.3.4")]),
            Err(EntityError::AddressNotFound { .. })
        ));
    }

    #[test]
    fn test_address_limit() {
        let mut rec = record();
        let addresses: Vec<NetworkAddress> = (1..=10).map(|i| addr(&format!("10.0.0.{}", i))).collect();
        rec.add_network_addresses(&addresses).unwrap();
        assert_eq!(
            rec.add_network_addresses([&addr("10.0.1.1")]),
            Err(EntityError::TooManyAddresses)
        );
    }

    #[test]
    fn test_extend_from_block_time_when_expired() {
        let mut rec = record();
        assert!(rec.is_expired(NOW));
        rec.extend_expiration(NOW, 1).unwrap();
        let base = CompactTimestamp::from_timestamp(NOW).timestamp();
        assert_eq!(rec.expiration.timestamp(), base + BOT_MONTH);
        assert!(!rec.is_expired(NOW));
        assert!(rec.is_expired(base + BOT_MONTH));
    }

    #[test]
    fn test_extend_accumulates_while_active() {
        let mut rec = record();
        rec.extend_expiration(NOW, 12).unwrap();
        rec.extend_expiration(NOW, 12).unwrap();
        assert_eq!(
            rec.extend_expiration(NOW, 1),
            Err(EntityError::ExpirationExtendOverflow)
        );
        assert_eq!(rec.extend_expiration(NOW, 0), Err(EntityError::ZeroMonths));
        assert_eq!(
            rec.extend_expiration(NOW, 25),
            Err(EntityError::ExpirationExtendOverflow)
        );
    }

    #[test]
    fn test_shorten_undoes_extend() {
        let mut rec = record();
        rec.extend_expiration(NOW, 3).unwrap();
        let before = rec.expiration;
        rec.extend_expiration(NOW, 2).unwrap();
        rec.shorten_expiration(2);
        assert_eq!(rec.expiration, before);
    }

    #[test]
    fn test_binary_layout() {
        let mut rec = record();
        rec.add_names([&name("alice.example")]).unwrap();
        rec.add_network_addresses([&addr("1.2.3.4"), &addr("example.org")]).unwrap();
        rec.extend_expiration(NOW, 3).unwrap();

        let bytes = rec.to_bytes();
        assert_eq!(&bytes[..4], &1u32.to_le_bytes());
        assert_eq!(bytes[4], 2 | 1 << 4);
        assert_eq!(BotRecord::from_bytes(&bytes).unwrap(), rec);
    }

    #[test]
    fn test_decode_rejects_too_many_names() {
        let mut bytes = record().to_bytes();
        bytes[4] = 6 << 4;
        assert!(matches!(
            BotRecord::from_bytes(&bytes),
            Err(CodecError::CountOverflow { max: 5, .. })
        ));
    }

    #[test]
    fn test_json() {
        let mut rec = record();
        rec.add_names([&name("alice.example")]).unwrap();
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["names"][0], "alice.example");
        assert!(json.get("addresses").is_none());
        let back: BotRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_lookup_order() {
        assert_eq!(BotLookup::parse("42").unwrap(), BotLookup::Id(BotId(42)));
        assert_eq!(
            BotLookup::parse("alice.example").unwrap(),
            BotLookup::Name(name("alice.example"))
        );
        let pk = record().public_key;
        assert_eq!(
            BotLookup::parse(&pk.to_string()).unwrap(),
            BotLookup::PublicKey(pk)
        );
        assert!(BotLookup::parse("0").is_err());
        assert!(BotLookup::parse("??").is_err());
    }
}
