//! Helpers shared by the typed transaction kinds: the months-and-flags byte,
//! the fee-paying transaction shape, signature digests and bot signatures.

use std::collections::HashSet;

use shared_types::{
    CodecError, CoinInput, CoinOutput, Currency, Decode, Decoder, Encode, Encoder,
    FulfillContext, KeyStore, PublicKey, SignatureHasher, SingleSignatureFulfillment, Specifier,
    Transaction, UnlockCondition, UnlockFulfillment, ValidationContext,
};

use crate::domain::{BotName, RegistryError, ValidationError};
use crate::ports::BotRecordReadRegistry;

/// Extra object mixed into signatures made by the sending (or registering) bot.
pub const BOT_SIGNATURE_SPECIFIER_SENDER: &[u8] = b"sender";
/// Extra object mixed into signatures made by the receiving bot.
pub const BOT_SIGNATURE_SPECIFIER_RECEIVER: &[u8] = b"receiver";

// =============================================================================
// MONTHS AND FLAGS
// =============================================================================

/// Prepaid months (5 bits) and three presence flags packed in one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthsAndFlags {
    pub months: u8,
    pub has_addresses: bool,
    pub has_names: bool,
    pub has_refund: bool,
}

impl Encode for MonthsAndFlags {
    fn encode(&self, enc: &mut Encoder) {
        let mut byte = self.months & 31;
        if self.has_addresses {
            byte |= 32;
        }
        if self.has_names {
            byte |= 64;
        }
        if self.has_refund {
            byte |= 128;
        }
        enc.put_u8(byte);
    }
}

impl Decode for MonthsAndFlags {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let byte = dec.get_u8()?;
        Ok(Self {
            months: byte & 31,
            has_addresses: byte & 32 != 0,
            has_names: byte & 64 != 0,
            has_refund: byte & 128 != 0,
        })
    }
}

// =============================================================================
// GENERIC SHAPE
// =============================================================================

/// Fee-paying shape: coin inputs, one miner fee, at most one refund output,
/// no arbitrary data.
pub(crate) struct FeePayingParts {
    pub coin_inputs: Vec<CoinInput>,
    pub transaction_fee: Currency,
    pub refund: Option<CoinOutput>,
}

pub(crate) fn split_fee_paying(tx: &Transaction, kind: &'static str) -> Result<FeePayingParts, CodecError> {
    if tx.coin_inputs.is_empty() || tx.miner_fees.len() != 1 {
        return Err(CodecError::invalid(
            kind,
            "at least one coin input and exactly one miner fee is required",
        ));
    }
    if !tx.arbitrary_data.is_empty() {
        return Err(CodecError::invalid(kind, "no arbitrary data is allowed"));
    }
    if tx.coin_outputs.len() > 1 {
        return Err(CodecError::invalid(kind, "at most one (refund) coin output is allowed"));
    }
    Ok(FeePayingParts {
        coin_inputs: tx.coin_inputs.clone(),
        transaction_fee: tx.miner_fees[0],
        refund: tx.coin_outputs.first().cloned(),
    })
}

pub(crate) fn join_fee_paying(
    version: u8,
    coin_inputs: &[CoinInput],
    transaction_fee: Currency,
    refund: &Option<CoinOutput>,
    extension: Vec<u8>,
) -> Transaction {
    Transaction {
        version,
        coin_inputs: coin_inputs.to_vec(),
        coin_outputs: refund.iter().cloned().collect(),
        miner_fees: vec![transaction_fee],
        arbitrary_data: Vec::new(),
        extension,
    }
}

/// Decode an extension completely.
pub(crate) fn decode_extension<T, F>(extension: &[u8], f: F) -> Result<T, CodecError>
where
    F: FnOnce(&mut Decoder<'_>) -> Result<T, CodecError>,
{
    let mut dec = Decoder::new(extension);
    let value = f(&mut dec)?;
    dec.finish()?;
    Ok(value)
}

// =============================================================================
// COMMON RULES
// =============================================================================

pub(crate) fn check_miner_fee(fee: Currency, minimum: Currency) -> Result<(), ValidationError> {
    if fee < minimum {
        return Err(ValidationError::TooSmallMinerFee { fee, minimum });
    }
    Ok(())
}

/// Fee-paying kinds fund their fees from at least one coin input.
pub(crate) fn check_fee_inputs(coin_inputs: &[CoinInput]) -> Result<(), ValidationError> {
    if coin_inputs.is_empty() {
        return Err(ValidationError::NoCoinInputs);
    }
    check_no_double_spend(coin_inputs)
}

pub(crate) fn check_no_double_spend(coin_inputs: &[CoinInput]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(coin_inputs.len());
    for ci in coin_inputs {
        if !seen.insert(ci.parent_id) {
            return Err(ValidationError::DoubleSpend {
                parent_id: ci.parent_id,
            });
        }
    }
    Ok(())
}

pub(crate) fn check_refund(refund: &Option<CoinOutput>) -> Result<(), ValidationError> {
    match refund {
        Some(co) if co.value.is_zero() => Err(ValidationError::ZeroRefund),
        _ => Ok(()),
    }
}

// =============================================================================
// SIGNATURES
// =============================================================================

/// Start a signature digest: version, specifier, then the raw extra objects.
pub(crate) fn signature_encoder(version: u8, specifier: &Specifier, extra_objects: &[u8]) -> Encoder {
    let mut enc = Encoder::new();
    enc.put_u8(version).put(specifier).put_raw(extra_objects);
    enc
}

/// Coin inputs by parent id only, so fulfillments can be added after signing.
pub(crate) fn put_parent_ids(enc: &mut Encoder, coin_inputs: &[CoinInput]) {
    enc.put_len(coin_inputs.len());
    for ci in coin_inputs {
        enc.put(&ci.parent_id);
    }
}

pub(crate) fn finish_digest(enc: Encoder) -> [u8; 32] {
    shared_crypto::hash_bytes(enc.as_bytes())
}

/// Extra object of the coin input at `index`.
pub(crate) fn input_index_extra(index: usize) -> [u8; 8] {
    (index as u64).to_le_bytes()
}

/// Check a bot's signature, made with `specifier` as extra object.
pub(crate) fn validate_bot_signature(
    hasher: &dyn SignatureHasher,
    public_key: &PublicKey,
    signature: &[u8],
    ctx: &ValidationContext,
    specifier: &[u8],
) -> Result<(), ValidationError> {
    let condition = UnlockCondition::for_public_key(public_key);
    let fulfillment = UnlockFulfillment::SingleSignature(SingleSignatureFulfillment {
        public_key: public_key.clone(),
        signature: signature.to_vec(),
    });
    condition.fulfill(
        &fulfillment,
        &FulfillContext {
            block_height: ctx.block_height,
            block_time: ctx.block_time,
            extra_objects: specifier,
            hasher,
        },
    )?;
    Ok(())
}

/// Sign as `public_key` if `keys` holds it.
pub(crate) fn sign_as_bot(
    hasher: &dyn SignatureHasher,
    keys: &dyn KeyStore,
    public_key: &PublicKey,
    specifier: &[u8],
) -> Result<Option<Vec<u8>>, ValidationError> {
    let condition = UnlockCondition::for_public_key(public_key);
    let mut fulfillment =
        UnlockFulfillment::SingleSignature(SingleSignatureFulfillment::unsigned(public_key.clone()));
    if !fulfillment.sign(&condition, keys, specifier, hasher)? {
        return Ok(None);
    }
    match fulfillment {
        UnlockFulfillment::SingleSignature(ss) => Ok(Some(ss.signature)),
        _ => Ok(None),
    }
}

/// Reject duplicates within one list.
pub(crate) fn find_duplicate<T: Eq + std::hash::Hash + Clone>(items: &[T]) -> Option<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().find(|item| !seen.insert(*item)).cloned()
}

/// Names are available when unknown or owned by an expired bot.
pub(crate) fn check_names_available(
    registry: &dyn BotRecordReadRegistry,
    names: &[BotName],
) -> Result<(), ValidationError> {
    for name in names {
        match registry.record_for_name(name) {
            Ok(_) => return Err(ValidationError::BotNameAlreadyRegistered { name: name.clone() }),
            Err(RegistryError::BotNameNotFound) | Err(RegistryError::BotNameExpired { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
