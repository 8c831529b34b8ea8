//! # Bot Name Transfer (version 146)
//!
//! Moves names from one active bot to another. Both bots sign: the sender
//! with the `sender` extra object, the receiver with `receiver`.

use serde::{Deserialize, Serialize};
use shared_types::{
    decode_counted, hex_bytes, CodecError, CoinInput, CoinOutput, Currency, Decode, Decoder, Encode,
    Encoder, KeyStore, SignatureHasher, Specifier, Timestamp, Transaction,
    TransactionValidationConstants, ValidationContext,
};

use super::common::{
    check_miner_fee, decode_extension, finish_digest, join_fee_paying, put_parent_ids, sign_as_bot,
    split_fee_paying, validate_bot_signature, BOT_SIGNATURE_SPECIFIER_RECEIVER,
    BOT_SIGNATURE_SPECIFIER_SENDER,
};
use crate::domain::fees::compute_transfer_fee;
use crate::domain::{BotId, BotName, BotRecord, EntityError, ValidationError, MAX_NAMES_PER_BOT};
use crate::ports::BotRecordReadRegistry;

pub const TRANSACTION_VERSION_BOT_NAME_TRANSFER: u8 = 0x92;
pub const SPECIFIER_BOT_NAME_TRANSFER_TRANSACTION: Specifier = Specifier::new(b"bot nametrans tx");

const KIND: &str = "bot name transfer transaction";

/// A bot and its signature over the transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentifierSignaturePair {
    pub id: BotId,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

impl BotIdentifierSignaturePair {
    pub fn unsigned(id: BotId) -> Self {
        Self {
            id,
            signature: Vec::new(),
        }
    }
}

impl Encode for BotIdentifierSignaturePair {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.id).put_prefixed(&self.signature);
    }
}

impl Decode for BotIdentifierSignaturePair {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            id: dec.get()?,
            signature: dec.get_prefixed()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotNameTransferTransaction {
    pub sender: BotIdentifierSignaturePair,
    pub receiver: BotIdentifierSignaturePair,
    pub names: Vec<BotName>,
    #[serde(rename = "txfee")]
    pub transaction_fee: Currency,
    #[serde(rename = "coininputs")]
    pub coin_inputs: Vec<CoinInput>,
    #[serde(rename = "refundcoinoutput", default, skip_serializing_if = "Option::is_none")]
    pub refund: Option<CoinOutput>,
}

impl BotNameTransferTransaction {
    pub fn from_transaction(tx: &Transaction) -> Result<Self, CodecError> {
        if tx.version != TRANSACTION_VERSION_BOT_NAME_TRANSFER {
            return Err(CodecError::invalid(KIND, format!("unexpected version {}", tx.version)));
        }
        let parts = split_fee_paying(tx, KIND)?;
        decode_extension(&tx.extension, |dec| {
            let sender = dec.get()?;
            let receiver = dec.get()?;
            let (names, _) = decode_names(dec)?;
            Ok(Self {
                sender,
                receiver,
                names,
                transaction_fee: parts.transaction_fee,
                coin_inputs: parts.coin_inputs,
                refund: parts.refund,
            })
        })
    }

    pub fn to_transaction(&self) -> Transaction {
        let mut ext = Encoder::new();
        ext.put(&self.sender).put(&self.receiver);
        self.encode_names(&mut ext);
        join_fee_paying(
            TRANSACTION_VERSION_BOT_NAME_TRANSFER,
            &self.coin_inputs,
            self.transaction_fee,
            &self.refund,
            ext.into_bytes(),
        )
    }

    /// Info byte (`nameCount & 7`, `16` if refunded), then the names.
    fn encode_names(&self, enc: &mut Encoder) {
        let mut info = self.names.len() as u8 & 7;
        if self.refund.is_some() {
            info |= 16;
        }
        enc.put_u8(info);
        for name in &self.names {
            enc.put(name);
        }
    }

    pub fn required_bot_fee(&self, one_coin: Currency) -> Currency {
        compute_transfer_fee(self.names.len(), one_coin)
    }

    /// Take the names from the sender; the sender must be active.
    pub fn update_sender(&self, block_time: Timestamp, record: &mut BotRecord) -> Result<(), EntityError> {
        ensure_active(record, block_time, "sender")?;
        record.remove_names(&self.names)
    }

    /// Give the names to the receiver; the receiver must be active.
    pub fn update_receiver(&self, block_time: Timestamp, record: &mut BotRecord) -> Result<(), EntityError> {
        ensure_active(record, block_time, "receiver")?;
        record.add_names(&self.names)
    }

    pub fn revert_sender(&self, record: &mut BotRecord) -> Result<(), EntityError> {
        record.add_names(&self.names)
    }

    pub fn revert_receiver(&self, record: &mut BotRecord) -> Result<(), EntityError> {
        record.remove_names(&self.names)
    }

    /// Sign as sender and/or receiver, for every bot whose key `keys` holds.
    pub fn sign_extension(
        &mut self,
        keys: &dyn KeyStore,
        registry: &dyn BotRecordReadRegistry,
    ) -> Result<bool, ValidationError> {
        let sender_key = registry.record_for_id(self.sender.id)?.public_key;
        let receiver_key = registry.record_for_id(self.receiver.id)?.public_key;
        // both signatures cover the same digest, so compute them before assigning
        let sender_sig = sign_as_bot(&*self, keys, &sender_key, BOT_SIGNATURE_SPECIFIER_SENDER)?;
        let receiver_sig = sign_as_bot(&*self, keys, &receiver_key, BOT_SIGNATURE_SPECIFIER_RECEIVER)?;
        let signed = sender_sig.is_some() || receiver_sig.is_some();
        if let Some(signature) = sender_sig {
            self.sender.signature = signature;
        }
        if let Some(signature) = receiver_sig {
            self.receiver.signature = signature;
        }
        Ok(signed)
    }

    pub fn validate(
        &self,
        ctx: &ValidationContext,
        constants: &TransactionValidationConstants,
        registry: &dyn BotRecordReadRegistry,
    ) -> Result<(), ValidationError> {
        check_miner_fee(self.transaction_fee, constants.minimum_miner_fee)?;

        if self.sender.id == self.receiver.id {
            return Err(ValidationError::SelfTransfer { id: self.sender.id });
        }

        let mut sender = registry.record_for_id(self.sender.id)?;
        let mut receiver = registry.record_for_id(self.receiver.id)?;

        validate_bot_signature(
            self,
            &sender.public_key,
            &self.sender.signature,
            ctx,
            BOT_SIGNATURE_SPECIFIER_SENDER,
        )?;
        validate_bot_signature(
            self,
            &receiver.public_key,
            &self.receiver.signature,
            ctx,
            BOT_SIGNATURE_SPECIFIER_RECEIVER,
        )?;

        if self.names.is_empty() {
            return Err(ValidationError::NoNamesTransferred);
        }

        self.update_sender(ctx.block_time, &mut sender)?;
        self.update_receiver(ctx.block_time, &mut receiver)?;
        Ok(())
    }
}

fn ensure_active(record: &BotRecord, block_time: Timestamp, role: &'static str) -> Result<(), EntityError> {
    if record.is_expired(block_time) {
        return Err(EntityError::InactiveBot { role, id: record.id });
    }
    Ok(())
}

/// Returns the names and whether the refund flag was set.
fn decode_names(dec: &mut Decoder<'_>) -> Result<(Vec<BotName>, bool), CodecError> {
    let info = dec.get_u8()?;
    let count = (info & 7) as usize;
    if count == 0 || count > MAX_NAMES_PER_BOT {
        return Err(CodecError::invalid(
            KIND,
            format!("invalid name count {} (expected 1 to {})", count, MAX_NAMES_PER_BOT),
        ));
    }
    Ok((decode_counted(dec, count)?, info & 16 != 0))
}

impl SignatureHasher for BotNameTransferTransaction {
    fn signature_hash(&self, extra_objects: &[u8]) -> [u8; 32] {
        let mut enc = Encoder::new();
        enc.put_u8(TRANSACTION_VERSION_BOT_NAME_TRANSFER)
            .put(&SPECIFIER_BOT_NAME_TRANSFER_TRANSACTION)
            .put(&self.sender.id)
            .put(&self.receiver.id)
            .put_raw(extra_objects)
            .put(&self.names);
        put_parent_ids(&mut enc, &self.coin_inputs);
        enc.put(&self.transaction_fee).put(&self.refund);
        finish_digest(enc)
    }
}

impl Encode for BotNameTransferTransaction {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.sender).put(&self.receiver);
        self.encode_names(enc);
        enc.put(&self.transaction_fee).put(&self.coin_inputs);
        if let Some(refund) = &self.refund {
            enc.put(refund);
        }
    }
}

impl Decode for BotNameTransferTransaction {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let sender = dec.get()?;
        let receiver = dec.get()?;
        let (names, has_refund) = decode_names(dec)?;
        let transaction_fee = dec.get()?;
        let coin_inputs = dec.get()?;
        let refund = if has_refund { Some(dec.get()?) } else { None };
        Ok(Self {
            sender,
            receiver,
            names,
            transaction_fee,
            coin_inputs,
            refund,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BOT_MONTH;
    use crate::ports::InMemoryRegistry;
    use shared_crypto::Ed25519KeyPair;
    use shared_types::{CoinOutputId, InMemoryKeyStore, UnlockFulfillment};

    const TIME: u64 = 1_600_000_000;

    fn name(s: &str) -> BotName {
        BotName::new(s).unwrap()
    }

    fn constants() -> TransactionValidationConstants {
        TransactionValidationConstants {
            block_size_limit: 2_000_000,
            arbitrary_data_size_limit: 83,
            minimum_miner_fee: Currency::new(100),
        }
    }

    fn ctx() -> ValidationContext {
        ValidationContext::new(10, TIME)
    }

    /// Bot 1 owns alice.example, bot 2 owns nothing; both keys are known.
    fn setup() -> (InMemoryKeyStore, InMemoryRegistry) {
        let mut keys = InMemoryKeyStore::new();
        let mut registry = InMemoryRegistry::default();
        registry.chain_time = TIME;
        for (id, names) in [(1u32, vec![name("alice.example")]), (2, vec![])] {
            let pk = keys.insert(Ed25519KeyPair::from_seed([id as u8; 32]));
            let mut record = BotRecord::new(BotId(id), pk);
            record.add_names(&names).unwrap();
            record.extend_expiration(TIME, 1).unwrap();
            registry.insert_record(record);
        }
        (keys, registry)
    }

    fn transfer() -> BotNameTransferTransaction {
        BotNameTransferTransaction {
            sender: BotIdentifierSignaturePair::unsigned(BotId(1)),
            receiver: BotIdentifierSignaturePair::unsigned(BotId(2)),
            names: vec![name("alice.example")],
            transaction_fee: Currency::new(100),
            coin_inputs: vec![CoinInput {
                parent_id: CoinOutputId([3; 32]),
                fulfillment: UnlockFulfillment::Nil,
            }],
            refund: None,
        }
    }

    #[test]
    fn test_valid_transfer() {
        let (keys, registry) = setup();
        let mut tx = transfer();
        assert!(tx.sign_extension(&keys, &registry).unwrap());
        tx.validate(&ctx(), &constants(), &registry).unwrap();
    }

    #[test]
    fn test_both_signatures_required() {
        let (keys, registry) = setup();
        let mut tx = transfer();
        tx.sign_extension(&keys, &registry).unwrap();
        tx.receiver.signature.clear();
        assert!(matches!(
            tx.validate(&ctx(), &constants(), &registry),
            Err(ValidationError::Condition(_))
        ));
    }

    #[test]
    fn test_signatures_are_role_bound() {
        let (keys, registry) = setup();
        let mut tx = transfer();
        tx.sign_extension(&keys, &registry).unwrap();
        std::mem::swap(&mut tx.sender.signature, &mut tx.receiver.signature);
        assert!(tx.validate(&ctx(), &constants(), &registry).is_err());
    }

    #[test]
    fn test_self_transfer_rejected() {
        let (_, registry) = setup();
        let mut tx = transfer();
        tx.receiver.id = BotId(1);
        assert_eq!(
            tx.validate(&ctx(), &constants(), &registry),
            Err(ValidationError::SelfTransfer { id: BotId(1) })
        );
    }

    #[test]
    fn test_sender_must_own_names() {
        let (keys, registry) = setup();
        let mut tx = transfer();
        tx.names = vec![name("bobby.example")];
        tx.sign_extension(&keys, &registry).unwrap();
        assert!(matches!(
            tx.validate(&ctx(), &constants(), &registry),
            Err(ValidationError::Entity(EntityError::NameNotFound { .. }))
        ));
    }

    #[test]
    fn test_expired_sender_rejected() {
        let (keys, registry) = setup();
        let mut tx = transfer();
        tx.sign_extension(&keys, &registry).unwrap();
        let later = ValidationContext::new(10, TIME + 2 * BOT_MONTH);
        assert_eq!(
            tx.validate(&later, &constants(), &registry),
            Err(ValidationError::Entity(EntityError::InactiveBot {
                role: "sender",
                id: BotId(1)
            }))
        );
    }

    #[test]
    fn test_apply_and_revert() {
        let (_, registry) = setup();
        let tx = transfer();
        let mut sender = registry.record_for_id(BotId(1)).unwrap();
        let mut receiver = registry.record_for_id(BotId(2)).unwrap();
        tx.update_sender(TIME, &mut sender).unwrap();
        tx.update_receiver(TIME, &mut receiver).unwrap();
        assert!(sender.names.is_empty());
        assert!(receiver.names.contains(&name("alice.example")));

        tx.revert_receiver(&mut receiver).unwrap();
        tx.revert_sender(&mut sender).unwrap();
        assert_eq!(sender, registry.record_for_id(BotId(1)).unwrap());
        assert_eq!(receiver, registry.record_for_id(BotId(2)).unwrap());
    }

    #[test]
    fn test_fee() {
        let mut tx = transfer();
        tx.names.push(name("bobby.example"));
        assert_eq!(tx.required_bot_fee(Currency::new(1)), Currency::new(100));
    }

    #[test]
    fn test_name_count_bounds_in_binary() {
        let tx = transfer();
        let mut bytes = tx.to_bytes();
        let info_at = bytes.len() - tx.names[0].to_bytes().len() - 1
            - tx.transaction_fee.to_bytes().len()
            - tx.coin_inputs.to_bytes().len();
        assert_eq!(bytes[info_at], 1);
        assert_eq!(BotNameTransferTransaction::from_bytes(&bytes).unwrap(), tx);

        bytes[info_at] = 0;
        assert!(BotNameTransferTransaction::from_bytes(&bytes).is_err());
        bytes[info_at] = 6;
        assert!(BotNameTransferTransaction::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_generic_form_and_json() {
        let tx = transfer();
        assert_eq!(
            BotNameTransferTransaction::from_transaction(&tx.to_transaction()).unwrap(),
            tx
        );
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["sender"]["id"], 1);
        assert_eq!(json["receiver"]["id"], 2);
        assert_eq!(json["names"][0], "alice.example");
    }
}
