//! # Minting Transactions
//!
//! Both kinds are authorised by fulfilling the mint condition active at the
//! validation height, with no extra objects:
//!
//! - **Minter Definition** (version 128) replaces the mint condition.
//! - **Coin Creation** (version 129) creates coins out of nothing.
//!
//! Neither spends coin inputs; a random nonce keeps otherwise identical
//! minting transactions distinct.

use serde::{Deserialize, Serialize};
use shared_types::{
    hex_bytes, CodecError, CoinOutput, Currency, Decode, Decoder, Encode, Encoder, FulfillContext,
    KeyStore, SignatureHasher, Specifier, Transaction, TransactionValidationConstants,
    UnlockCondition, UnlockFulfillment, UnlockType, ValidationContext,
};

use super::common::{check_miner_fee, decode_extension, finish_digest};
use crate::domain::{TransactionNonce, ValidationError};
use crate::ports::MintConditionGetter;

pub const TRANSACTION_VERSION_MINTER_DEFINITION: u8 = 128;
pub const TRANSACTION_VERSION_COIN_CREATION: u8 = 129;

pub const SPECIFIER_MINTER_DEFINITION_TRANSACTION: Specifier = Specifier::new(b"minter defin tx");
pub const SPECIFIER_COIN_MINT_TRANSACTION: Specifier = Specifier::new(b"coin mint tx");

// =============================================================================
// MINTER DEFINITION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinterDefinitionTransaction {
    pub nonce: TransactionNonce,
    #[serde(rename = "mintfulfillment")]
    pub mint_fulfillment: UnlockFulfillment,
    #[serde(rename = "mintcondition")]
    pub mint_condition: UnlockCondition,
    #[serde(rename = "minerfees")]
    pub miner_fees: Vec<Currency>,
    #[serde(rename = "arbitrarydata", with = "hex_bytes", default, skip_serializing_if = "Vec::is_empty")]
    pub arbitrary_data: Vec<u8>,
}

impl MinterDefinitionTransaction {
    const KIND: &'static str = "minter definition transaction";

    pub fn from_transaction(tx: &Transaction) -> Result<Self, CodecError> {
        if tx.version != TRANSACTION_VERSION_MINTER_DEFINITION {
            return Err(CodecError::invalid(Self::KIND, format!("unexpected version {}", tx.version)));
        }
        if !tx.coin_inputs.is_empty() || !tx.coin_outputs.is_empty() {
            return Err(CodecError::invalid(Self::KIND, "coin inputs and outputs are not allowed"));
        }
        decode_extension(&tx.extension, |dec| {
            Ok(Self {
                nonce: dec.get()?,
                mint_fulfillment: dec.get()?,
                mint_condition: dec.get()?,
                miner_fees: tx.miner_fees.clone(),
                arbitrary_data: tx.arbitrary_data.clone(),
            })
        })
    }

    pub fn to_transaction(&self) -> Transaction {
        let mut ext = Encoder::new();
        ext.put(&self.nonce)
            .put(&self.mint_fulfillment)
            .put(&self.mint_condition);
        Transaction {
            version: TRANSACTION_VERSION_MINTER_DEFINITION,
            coin_inputs: Vec::new(),
            coin_outputs: Vec::new(),
            miner_fees: self.miner_fees.clone(),
            arbitrary_data: self.arbitrary_data.clone(),
            extension: ext.into_bytes(),
        }
    }

    /// Sign the mint fulfillment with the keys `keys` holds for the active
    /// mint condition.
    pub fn sign_extension(
        &mut self,
        keys: &dyn KeyStore,
        mint_conditions: &dyn MintConditionGetter,
    ) -> Result<bool, ValidationError> {
        let condition = mint_conditions.active_mint_condition()?;
        let mut fulfillment = self.mint_fulfillment.clone();
        let signed = fulfillment.sign(&condition, keys, &[], &*self)?;
        self.mint_fulfillment = fulfillment;
        Ok(signed)
    }

    pub fn validate(
        &self,
        ctx: &ValidationContext,
        constants: &TransactionValidationConstants,
        mint_conditions: &dyn MintConditionGetter,
    ) -> Result<(), ValidationError> {
        check_miner_fees(&self.miner_fees, constants.minimum_miner_fee)?;
        if self.nonce.is_zero() {
            return Err(ValidationError::ZeroNonce);
        }
        check_mint_condition(&self.mint_condition)?;
        self.mint_condition.is_standard(ctx)?;
        check_mint_fulfillment(self, &self.mint_fulfillment, ctx, mint_conditions)
    }
}

impl SignatureHasher for MinterDefinitionTransaction {
    fn signature_hash(&self, extra_objects: &[u8]) -> [u8; 32] {
        let mut enc = Encoder::new();
        enc.put_u8(TRANSACTION_VERSION_MINTER_DEFINITION)
            .put(&SPECIFIER_MINTER_DEFINITION_TRANSACTION)
            .put(&self.nonce)
            .put_raw(extra_objects)
            .put(&self.mint_condition)
            .put(&self.miner_fees)
            .put_prefixed(&self.arbitrary_data);
        finish_digest(enc)
    }
}

impl Encode for MinterDefinitionTransaction {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.nonce)
            .put(&self.mint_fulfillment)
            .put(&self.mint_condition)
            .put(&self.miner_fees)
            .put_prefixed(&self.arbitrary_data);
    }
}

impl Decode for MinterDefinitionTransaction {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            nonce: dec.get()?,
            mint_fulfillment: dec.get()?,
            mint_condition: dec.get()?,
            miner_fees: dec.get()?,
            arbitrary_data: dec.get_prefixed()?,
        })
    }
}

// =============================================================================
// COIN CREATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinCreationTransaction {
    pub nonce: TransactionNonce,
    #[serde(rename = "mintfulfillment")]
    pub mint_fulfillment: UnlockFulfillment,
    #[serde(rename = "coinoutputs")]
    pub coin_outputs: Vec<CoinOutput>,
    #[serde(rename = "minerfees")]
    pub miner_fees: Vec<Currency>,
    #[serde(rename = "arbitrarydata", with = "hex_bytes", default, skip_serializing_if = "Vec::is_empty")]
    pub arbitrary_data: Vec<u8>,
}

impl CoinCreationTransaction {
    const KIND: &'static str = "coin creation transaction";

    pub fn from_transaction(tx: &Transaction) -> Result<Self, CodecError> {
        if tx.version != TRANSACTION_VERSION_COIN_CREATION {
            return Err(CodecError::invalid(Self::KIND, format!("unexpected version {}", tx.version)));
        }
        if !tx.coin_inputs.is_empty() {
            return Err(CodecError::invalid(Self::KIND, "coin inputs are not allowed"));
        }
        decode_extension(&tx.extension, |dec| {
            Ok(Self {
                nonce: dec.get()?,
                mint_fulfillment: dec.get()?,
                coin_outputs: tx.coin_outputs.clone(),
                miner_fees: tx.miner_fees.clone(),
                arbitrary_data: tx.arbitrary_data.clone(),
            })
        })
    }

    pub fn to_transaction(&self) -> Transaction {
        let mut ext = Encoder::new();
        ext.put(&self.nonce).put(&self.mint_fulfillment);
        Transaction {
            version: TRANSACTION_VERSION_COIN_CREATION,
            coin_inputs: Vec::new(),
            coin_outputs: self.coin_outputs.clone(),
            miner_fees: self.miner_fees.clone(),
            arbitrary_data: self.arbitrary_data.clone(),
            extension: ext.into_bytes(),
        }
    }

    pub fn sign_extension(
        &mut self,
        keys: &dyn KeyStore,
        mint_conditions: &dyn MintConditionGetter,
    ) -> Result<bool, ValidationError> {
        let condition = mint_conditions.active_mint_condition()?;
        let mut fulfillment = self.mint_fulfillment.clone();
        let signed = fulfillment.sign(&condition, keys, &[], &*self)?;
        self.mint_fulfillment = fulfillment;
        Ok(signed)
    }

    pub fn validate(
        &self,
        ctx: &ValidationContext,
        constants: &TransactionValidationConstants,
        mint_conditions: &dyn MintConditionGetter,
    ) -> Result<(), ValidationError> {
        check_miner_fees(&self.miner_fees, constants.minimum_miner_fee)?;
        if self.nonce.is_zero() {
            return Err(ValidationError::ZeroNonce);
        }
        if self.coin_outputs.is_empty() {
            return Err(ValidationError::ZeroValue);
        }
        for co in &self.coin_outputs {
            if co.value.is_zero() {
                return Err(ValidationError::ZeroValue);
            }
            co.condition.is_standard(ctx)?;
        }
        check_mint_fulfillment(self, &self.mint_fulfillment, ctx, mint_conditions)
    }
}

impl SignatureHasher for CoinCreationTransaction {
    fn signature_hash(&self, extra_objects: &[u8]) -> [u8; 32] {
        let mut enc = Encoder::new();
        enc.put_u8(TRANSACTION_VERSION_COIN_CREATION)
            .put(&SPECIFIER_COIN_MINT_TRANSACTION)
            .put(&self.nonce)
            .put_raw(extra_objects)
            .put(&self.coin_outputs)
            .put(&self.miner_fees)
            .put_prefixed(&self.arbitrary_data);
        finish_digest(enc)
    }
}

impl Encode for CoinCreationTransaction {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.nonce)
            .put(&self.mint_fulfillment)
            .put(&self.coin_outputs)
            .put(&self.miner_fees)
            .put_prefixed(&self.arbitrary_data);
    }
}

impl Decode for CoinCreationTransaction {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            nonce: dec.get()?,
            mint_fulfillment: dec.get()?,
            coin_outputs: dec.get()?,
            miner_fees: dec.get()?,
            arbitrary_data: dec.get_prefixed()?,
        })
    }
}

// =============================================================================
// SHARED RULES
// =============================================================================

fn check_miner_fees(fees: &[Currency], minimum: Currency) -> Result<(), ValidationError> {
    if fees.is_empty() {
        return Err(ValidationError::TooSmallMinerFee {
            fee: Currency::zero(),
            minimum,
        });
    }
    fees.iter().try_for_each(|fee| check_miner_fee(*fee, minimum))
}

/// A mint condition must be signable: a public key, a multi-signature
/// condition, or a time lock over either.
fn check_mint_condition(condition: &UnlockCondition) -> Result<(), ValidationError> {
    let invalid = |reason: &str| -> Result<(), ValidationError> {
        Err(ValidationError::InvalidMintCondition {
            reason: reason.to_string(),
        })
    };
    match condition {
        UnlockCondition::UnlockHash(uh) if uh.unlock_type == UnlockType::PubKey => Ok(()),
        UnlockCondition::UnlockHash(_) => invalid("unlock hash condition must be a public key unlock hash"),
        UnlockCondition::MultiSignature(_) => Ok(()),
        UnlockCondition::TimeLock(tl) => match tl.condition.as_ref() {
            UnlockCondition::TimeLock(_) => invalid("nested time lock"),
            inner => check_mint_condition(inner),
        },
        UnlockCondition::Nil => invalid("nil condition cannot be used to mint"),
    }
}

fn check_mint_fulfillment(
    hasher: &dyn SignatureHasher,
    fulfillment: &UnlockFulfillment,
    ctx: &ValidationContext,
    mint_conditions: &dyn MintConditionGetter,
) -> Result<(), ValidationError> {
    fulfillment.is_standard()?;
    let condition = mint_conditions.mint_condition_at(ctx.block_height)?;
    condition.fulfill(
        fulfillment,
        &FulfillContext {
            block_height: ctx.block_height,
            block_time: ctx.block_time,
            extra_objects: &[],
            hasher,
        },
    )?;
    Ok(())
}
