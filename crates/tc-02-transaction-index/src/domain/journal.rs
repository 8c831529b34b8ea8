//! Effects of a bot record update that its structural revert cannot undo.

use std::collections::BTreeSet;

use shared_types::{decode_counted, CodecError, Decode, Decoder, Encode, Encoder};
use tc_01_typed_transactions::domain::MAX_NAMES_PER_BOT;
use tc_01_typed_transactions::{BotId, BotName, CompactTimestamp};

/// State an expired bot lost when an update reactivated it.
///
/// Stored under the update's transaction id while the update is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitUpdate {
    pub previous_expiration: CompactTimestamp,
    pub removed_names: BTreeSet<BotName>,
}

impl Encode for ImplicitUpdate {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.previous_expiration)
            .put_len(self.removed_names.len());
        for name in &self.removed_names {
            enc.put(name);
        }
    }
}

impl Decode for ImplicitUpdate {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let previous_expiration = dec.get()?;
        let count = dec.get_len()?;
        if count > MAX_NAMES_PER_BOT {
            return Err(CodecError::CountOverflow {
                what: "implicitly removed bot names",
                count,
                max: MAX_NAMES_PER_BOT,
            });
        }
        let names: Vec<BotName> = decode_counted(dec, count)?;
        Ok(Self {
            previous_expiration,
            removed_names: names.into_iter().collect(),
        })
    }
}

/// Names a transaction mapped to its bot while an expired bot still owned
/// them, with that previous owner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplacedNames {
    pub owners: Vec<(BotName, BotId)>,
}

impl DisplacedNames {
    pub fn previous_owner(&self, name: &BotName) -> Option<BotId> {
        self.owners
            .iter()
            .find(|(displaced, _)| displaced == name)
            .map(|(_, id)| *id)
    }
}

impl Encode for DisplacedNames {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_len(self.owners.len());
        for (name, id) in &self.owners {
            enc.put(name).put(id);
        }
    }
}

impl Decode for DisplacedNames {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let count = dec.get_len()?;
        if count > MAX_NAMES_PER_BOT {
            return Err(CodecError::CountOverflow {
                what: "displaced bot names",
                count,
                max: MAX_NAMES_PER_BOT,
            });
        }
        let mut owners = Vec::with_capacity(count);
        for _ in 0..count {
            owners.push((dec.get()?, dec.get()?));
        }
        Ok(Self { owners })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> BotName {
        BotName::new(s).unwrap()
    }

    #[test]
    fn test_implicit_update_binary_form() {
        let update = ImplicitUpdate {
            previous_expiration: CompactTimestamp::from_ticks(1234),
            removed_names: [name("alice.example"), name("bobby.example")].into_iter().collect(),
        };
        let bytes = update.to_bytes();
        // 3 byte timestamp, 1 byte count, then the names
        assert_eq!(&bytes[..4], &[0xd2, 0x04, 0x00, 0x02]);
        assert_eq!(ImplicitUpdate::from_bytes(&bytes).unwrap(), update);
    }

    #[test]
    fn test_displaced_owner_lookup() {
        let displaced = DisplacedNames {
            owners: vec![(name("alice.example"), BotId(4))],
        };
        assert_eq!(displaced.previous_owner(&name("alice.example")), Some(BotId(4)));
        assert_eq!(displaced.previous_owner(&name("carol.example")), None);
    }

    fn too_many_names() -> Vec<BotName> {
        (0..=MAX_NAMES_PER_BOT)
            .map(|i| name(&format!("botname{}", i)))
            .collect()
    }

    #[test]
    fn test_too_many_displaced_names_rejected() {
        let displaced = DisplacedNames {
            owners: too_many_names()
                .into_iter()
                .zip(1u32..)
                .map(|(name, id)| (name, BotId(id)))
                .collect(),
        };
        assert!(matches!(
            DisplacedNames::from_bytes(&displaced.to_bytes()),
            Err(CodecError::CountOverflow { count: 6, .. })
        ));
    }

    #[test]
    fn test_too_many_removed_names_rejected() {
        let update = ImplicitUpdate {
            previous_expiration: CompactTimestamp::from_ticks(1234),
            removed_names: too_many_names().into_iter().collect(),
        };
        assert!(matches!(
            ImplicitUpdate::from_bytes(&update.to_bytes()),
            Err(CodecError::CountOverflow { count: 6, .. })
        ));
    }
}
