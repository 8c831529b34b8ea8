//! # Bot Record Update (version 145)
//!
//! Extends a bot's expiration and adds or removes network addresses and
//! names. Within one update, removals are applied before additions, so a
//! value can be swapped out and back in and limits are not hit falsely.

use serde::{Deserialize, Serialize};
use shared_types::{
    decode_counted, hex_bytes, CodecError, CoinInput, CoinOutput, Currency, Decode, Decoder, Encode,
    Encoder, KeyStore, SignatureHasher, Specifier, Timestamp, Transaction,
    TransactionValidationConstants, ValidationContext,
};

use super::common::{
    check_miner_fee, check_names_available, decode_extension, finish_digest, join_fee_paying,
    put_parent_ids, sign_as_bot, split_fee_paying, validate_bot_signature,
    MonthsAndFlags, BOT_SIGNATURE_SPECIFIER_SENDER,
};
use crate::domain::bot_record::check_count;
use crate::domain::fees::compute_update_fee;
use crate::domain::{
    BotId, BotName, BotRecord, EntityError, NetworkAddress, ValidationError, MAX_ADDRESSES_PER_BOT,
    MAX_NAMES_PER_BOT,
};
use crate::ports::BotRecordReadRegistry;

pub const TRANSACTION_VERSION_BOT_RECORD_UPDATE: u8 = 0x91;
pub const SPECIFIER_BOT_RECORD_UPDATE_TRANSACTION: Specifier = Specifier::new(b"bot recupdate tx");

const KIND: &str = "bot record update transaction";

/// Values to add and to remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSet<T> {
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<T>,
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<T>,
}

impl<T> Default for UpdateSet<T> {
    fn default() -> Self {
        Self {
            add: Vec::new(),
            remove: Vec::new(),
        }
    }
}

impl<T> UpdateSet<T> {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

impl<T: Encode> UpdateSet<T> {
    /// `addCount | removeCount << 4`, then both lists.
    fn encode_packed(&self, enc: &mut Encoder) {
        enc.put_u8(self.add.len() as u8 & 15 | (self.remove.len() as u8 & 15) << 4);
        for item in self.add.iter().chain(&self.remove) {
            enc.put(item);
        }
    }
}

impl<T: Decode> UpdateSet<T> {
    fn decode_packed(dec: &mut Decoder<'_>, what: &'static str, max: usize) -> Result<Self, CodecError> {
        let counts = dec.get_u8()?;
        let (add, remove) = ((counts & 15) as usize, (counts >> 4) as usize);
        check_count(what, add, max)?;
        check_count(what, remove, max)?;
        Ok(Self {
            add: decode_counted(dec, add)?,
            remove: decode_counted(dec, remove)?,
        })
    }
}

impl<T: Encode> Encode for UpdateSet<T> {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.add).put(&self.remove);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotRecordUpdateTransaction {
    pub id: BotId,
    #[serde(default, skip_serializing_if = "UpdateSet::is_empty")]
    pub addresses: UpdateSet<NetworkAddress>,
    #[serde(default, skip_serializing_if = "UpdateSet::is_empty")]
    pub names: UpdateSet<BotName>,
    #[serde(rename = "nrofmonths")]
    pub months: u8,
    #[serde(rename = "txfee")]
    pub transaction_fee: Currency,
    #[serde(rename = "coininputs")]
    pub coin_inputs: Vec<CoinInput>,
    #[serde(rename = "refundcoinoutput", default, skip_serializing_if = "Option::is_none")]
    pub refund: Option<CoinOutput>,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

impl BotRecordUpdateTransaction {
    pub fn from_transaction(tx: &Transaction) -> Result<Self, CodecError> {
        if tx.version != TRANSACTION_VERSION_BOT_RECORD_UPDATE {
            return Err(CodecError::invalid(KIND, format!("unexpected version {}", tx.version)));
        }
        let parts = split_fee_paying(tx, KIND)?;
        decode_extension(&tx.extension, |dec| {
            let id = dec.get()?;
            let (maf, addresses, names) = decode_changes(dec)?;
            Ok(Self {
                id,
                addresses,
                names,
                months: maf.months,
                transaction_fee: parts.transaction_fee,
                coin_inputs: parts.coin_inputs,
                refund: parts.refund,
                signature: dec.get_prefixed()?,
            })
        })
    }

    pub fn to_transaction(&self) -> Transaction {
        let mut ext = Encoder::new();
        ext.put(&self.id);
        self.encode_changes(&mut ext);
        ext.put_prefixed(&self.signature);
        join_fee_paying(
            TRANSACTION_VERSION_BOT_RECORD_UPDATE,
            &self.coin_inputs,
            self.transaction_fee,
            &self.refund,
            ext.into_bytes(),
        )
    }

    fn encode_changes(&self, enc: &mut Encoder) {
        enc.put(&MonthsAndFlags {
            months: self.months,
            has_addresses: !self.addresses.is_empty(),
            has_names: !self.names.is_empty(),
            has_refund: self.refund.is_some(),
        });
        if !self.addresses.is_empty() {
            self.addresses.encode_packed(enc);
        }
        if !self.names.is_empty() {
            self.names.encode_packed(enc);
        }
    }

    pub fn required_bot_fee(&self, one_coin: Currency) -> Currency {
        compute_update_fee(
            self.months,
            !self.addresses.is_empty(),
            self.names.add.len(),
            one_coin,
        )
    }

    /// Apply this update to `record`, as of `block_time`.
    ///
    /// An expired bot must be reactivated by paying months, and loses all
    /// its names before the update's own name changes are applied.
    pub fn update_record(&self, block_time: Timestamp, record: &mut BotRecord) -> Result<(), EntityError> {
        if record.is_expired(block_time) {
            if self.months == 0 {
                return Err(EntityError::ExpiredWithoutReactivation { id: record.id });
            }
            record.reset_names();
        }
        if self.months != 0 {
            record.extend_expiration(block_time, self.months)?;
        }
        record.remove_network_addresses(&self.addresses.remove)?;
        record.add_network_addresses(&self.addresses.add)?;
        record.remove_names(&self.names.remove)?;
        record.add_names(&self.names.add)
    }

    /// Structural inverse of [`Self::update_record`].
    ///
    /// Implicit effects of a reactivation (cleared names, an expiration that
    /// jumped to the block time) are not restored here; the caller must
    /// restore them from its own journal.
    pub fn revert_record_update(&self, record: &mut BotRecord) -> Result<(), EntityError> {
        record.shorten_expiration(self.months);
        record.remove_network_addresses(&self.addresses.add)?;
        record.add_network_addresses(&self.addresses.remove)?;
        record.remove_names(&self.names.add)?;
        record.add_names(&self.names.remove)
    }

    /// Sign with the key of the bot's record.
    pub fn sign_extension(
        &mut self,
        keys: &dyn KeyStore,
        registry: &dyn BotRecordReadRegistry,
    ) -> Result<bool, ValidationError> {
        let record = registry.record_for_id(self.id)?;
        match sign_as_bot(&*self, keys, &record.public_key, BOT_SIGNATURE_SPECIFIER_SENDER)? {
            Some(signature) => {
                self.signature = signature;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn validate(
        &self,
        ctx: &ValidationContext,
        constants: &TransactionValidationConstants,
        registry: &dyn BotRecordReadRegistry,
    ) -> Result<(), ValidationError> {
        check_miner_fee(self.transaction_fee, constants.minimum_miner_fee)?;

        let mut record = registry.record_for_id(self.id)?;
        validate_bot_signature(
            self,
            &record.public_key,
            &self.signature,
            ctx,
            BOT_SIGNATURE_SPECIFIER_SENDER,
        )?;

        if self.months == 0 && self.addresses.is_empty() && self.names.is_empty() {
            return Err(ValidationError::NoOpUpdate);
        }

        check_names_available(registry, &self.names.add)?;

        // dry run against a copy
        self.update_record(ctx.block_time, &mut record)?;
        Ok(())
    }
}

type Changes = (MonthsAndFlags, UpdateSet<NetworkAddress>, UpdateSet<BotName>);

fn decode_changes(dec: &mut Decoder<'_>) -> Result<Changes, CodecError> {
    let maf: MonthsAndFlags = dec.get()?;
    let addresses = if maf.has_addresses {
        UpdateSet::decode_packed(dec, "bot addresses", MAX_ADDRESSES_PER_BOT)?
    } else {
        UpdateSet::default()
    };
    let names = if maf.has_names {
        UpdateSet::decode_packed(dec, "bot names", MAX_NAMES_PER_BOT)?
    } else {
        UpdateSet::default()
    };
    Ok((maf, addresses, names))
}

impl SignatureHasher for BotRecordUpdateTransaction {
    fn signature_hash(&self, extra_objects: &[u8]) -> [u8; 32] {
        let mut enc = Encoder::new();
        enc.put_u8(TRANSACTION_VERSION_BOT_RECORD_UPDATE)
            .put(&SPECIFIER_BOT_RECORD_UPDATE_TRANSACTION)
            .put(&self.id)
            .put_raw(extra_objects);
        enc.put(&self.addresses).put(&self.names).put_u8(self.months);
        put_parent_ids(&mut enc, &self.coin_inputs);
        enc.put(&self.transaction_fee).put(&self.refund);
        finish_digest(enc)
    }
}

impl Encode for BotRecordUpdateTransaction {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.id);
        self.encode_changes(enc);
        enc.put(&self.transaction_fee).put(&self.coin_inputs);
        if let Some(refund) = &self.refund {
            enc.put(refund);
        }
        enc.put_prefixed(&self.signature);
    }
}

impl Decode for BotRecordUpdateTransaction {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let id = dec.get()?;
        let (maf, addresses, names) = decode_changes(dec)?;
        let transaction_fee = dec.get()?;
        let coin_inputs = dec.get()?;
        let refund = if maf.has_refund { Some(dec.get()?) } else { None };
        Ok(Self {
            id,
            addresses,
            names,
            months: maf.months,
            transaction_fee,
            coin_inputs,
            refund,
            signature: dec.get_prefixed()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BOT_MONTH;
    use crate::ports::InMemoryRegistry;
    use shared_crypto::Ed25519KeyPair;
    use shared_types::{CoinOutputId, InMemoryKeyStore, PublicKey, UnlockFulfillment};

    const TIME: u64 = 1_600_000_020;

    fn name(s: &str) -> BotName {
        BotName::new(s).unwrap()
    }

    fn addr(s: &str) -> NetworkAddress {
        NetworkAddress::new(s).unwrap()
    }

    fn setup() -> (InMemoryKeyStore, InMemoryRegistry, BotRecord) {
        let mut keys = InMemoryKeyStore::new();
        let pk: PublicKey = keys.insert(Ed25519KeyPair::from_seed([1; 32]));
        let mut record = BotRecord::new(BotId(1), pk);
        record.add_names([&name("alice.example")]).unwrap();
        record.add_network_addresses([&addr("1.2.3.4")]).unwrap();
        record.extend_expiration(TIME, 2).unwrap();
        let mut registry = InMemoryRegistry::default();
        registry.chain_time = TIME;
        registry.insert_record(record.clone());
        (keys, registry, record)
    }

    fn update() -> BotRecordUpdateTransaction {
        BotRecordUpdateTransaction {
            id: BotId(1),
            addresses: UpdateSet::default(),
            names: UpdateSet::default(),
            months: 0,
            transaction_fee: Currency::new(100),
            coin_inputs: vec![CoinInput {
                parent_id: CoinOutputId([1; 32]),
                fulfillment: UnlockFulfillment::Nil,
            }],
            refund: None,
            signature: Vec::new(),
        }
    }

    fn constants() -> TransactionValidationConstants {
        TransactionValidationConstants {
            block_size_limit: 2_000_000,
            arbitrary_data_size_limit: 83,
            minimum_miner_fee: Currency::new(100),
        }
    }

    #[test]
    fn test_swap_address_in_one_update() {
        let (_, _, mut record) = setup();
        let mut tx = update();
        tx.addresses.remove = vec![addr("1.2.3.4")];
        tx.addresses.add = vec![addr("1.2.3.4"), addr("example.org")];
        tx.update_record(TIME, &mut record).unwrap();
        assert_eq!(record.addresses.len(), 2);
    }

    #[test]
    fn test_remove_before_add_avoids_false_overflow() {
        let (_, _, mut record) = setup();
        let extra: Vec<BotName> = ["bbbbb", "ccccc", "ddddd", "eeeee"].iter().map(|s| name(s)).collect();
        record.add_names(&extra).unwrap();
        let mut tx = update();
        tx.names.remove = vec![name("alice.example")];
        tx.names.add = vec![name("fffff")];
        tx.update_record(TIME, &mut record).unwrap();
        assert_eq!(record.names.len(), 5);
    }

    #[test]
    fn test_expired_bot_requires_months_and_loses_names() {
        let (_, _, mut record) = setup();
        let later = TIME + 3 * BOT_MONTH;
        let tx = update();
        assert_eq!(
            tx.update_record(later, &mut record),
            Err(EntityError::ExpiredWithoutReactivation { id: BotId(1) })
        );

        let mut tx = update();
        tx.months = 1;
        tx.update_record(later, &mut record).unwrap();
        assert!(record.names.is_empty());
        assert!(!record.is_expired(later));
    }

    #[test]
    fn test_removing_names_of_expired_bot_fails() {
        let (_, _, mut record) = setup();
        let mut tx = update();
        tx.months = 1;
        tx.names.remove = vec![name("alice.example")];
        assert!(matches!(
            tx.update_record(TIME + 3 * BOT_MONTH, &mut record),
            Err(EntityError::NameNotFound { .. })
        ));
    }

    #[test]
    fn test_revert_is_structural_inverse() {
        let (_, _, mut record) = setup();
        let before = record.clone();
        let mut tx = update();
        tx.months = 2;
        tx.addresses.remove = vec![addr("1.2.3.4")];
        tx.addresses.add = vec![addr("example.org")];
        tx.names.add = vec![name("bobby.example")];
        tx.update_record(TIME, &mut record).unwrap();
        tx.revert_record_update(&mut record).unwrap();
        assert_eq!(record, before);
    }

    #[test]
    fn test_validate_requires_signature_and_changes() {
        let (keys, registry, _) = setup();
        let mut tx = update();
        tx.sign_extension(&keys, &registry).unwrap();
        assert_eq!(
            tx.validate(&ValidationContext::new(10, TIME), &constants(), &registry),
            Err(ValidationError::NoOpUpdate)
        );

        tx.months = 1;
        assert!(matches!(
            tx.validate(&ValidationContext::new(10, TIME), &constants(), &registry),
            Err(ValidationError::Condition(_))
        ));

        tx.sign_extension(&keys, &registry).unwrap();
        tx.validate(&ValidationContext::new(10, TIME), &constants(), &registry)
            .unwrap();
    }

    #[test]
    fn test_validate_unknown_bot() {
        let (_, registry, _) = setup();
        let mut tx = update();
        tx.id = BotId(7);
        tx.months = 1;
        assert!(matches!(
            tx.validate(&ValidationContext::new(10, TIME), &constants(), &registry),
            Err(ValidationError::Registry(_))
        ));
    }

    #[test]
    fn test_fee() {
        let mut tx = update();
        tx.months = 1;
        tx.addresses.add = vec![addr("example.org")];
        tx.names.add = vec![name("bobby.example")];
        // 10 + 20 + 50
        assert_eq!(tx.required_bot_fee(Currency::new(1)), Currency::new(80));
    }

    #[test]
    fn test_compact_and_generic_forms() {
        let mut tx = update();
        tx.months = 5;
        tx.names.add = vec![name("bobby.example")];
        tx.signature = vec![7; 64];
        let bytes = tx.to_bytes();
        assert_eq!(&bytes[..4], &1u32.to_le_bytes());
        assert_eq!(bytes[4], 5 | 64);
        assert_eq!(bytes[5], 1);
        assert_eq!(BotRecordUpdateTransaction::from_bytes(&bytes).unwrap(), tx);
        assert_eq!(
            BotRecordUpdateTransaction::from_transaction(&tx.to_transaction()).unwrap(),
            tx
        );
    }

    #[test]
    fn test_json() {
        let mut tx = update();
        tx.names.add = vec![name("bobby.example")];
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["names"]["add"][0], "bobby.example");
        assert!(json.get("addresses").is_none());
        let back: BotRecordUpdateTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }
}
