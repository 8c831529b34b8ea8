//! # Typed Transactions
//!
//! The closed set of transaction kinds this protocol understands. The
//! version byte of a generic [`Transaction`] selects the kind; each kind
//! owns its extension layout, signature digest, fees and validation rules.
//!
//! | Version | Kind |
//! |---------|------|
//! | 0, 1 | legacy and standard transactions (passed through) |
//! | 128 | minter definition |
//! | 129 | coin creation |
//! | 144 | bot registration |
//! | 145 | bot record update |
//! | 146 | bot name transfer |
//! | 208 | ERC20 convert |
//! | 209 | ERC20 coin creation |
//! | 210 | ERC20 address registration |

pub mod bot_name_transfer;
pub mod bot_record_update;
pub mod bot_registration;
pub mod common;
pub mod erc20;
pub mod minting;

pub use bot_name_transfer::{
    BotIdentifierSignaturePair, BotNameTransferTransaction, TRANSACTION_VERSION_BOT_NAME_TRANSFER,
};
pub use bot_record_update::{BotRecordUpdateTransaction, UpdateSet, TRANSACTION_VERSION_BOT_RECORD_UPDATE};
pub use bot_registration::{BotRegistrationTransaction, TRANSACTION_VERSION_BOT_REGISTRATION};
pub use common::{BOT_SIGNATURE_SPECIFIER_RECEIVER, BOT_SIGNATURE_SPECIFIER_SENDER};
pub use erc20::{
    erc20_conversion_minimum, erc20_registration_fee, Erc20AddressRegistrationTransaction,
    Erc20CoinCreationTransaction, Erc20ConvertTransaction, TRANSACTION_VERSION_ERC20_ADDRESS_REGISTRATION,
    TRANSACTION_VERSION_ERC20_COIN_CREATION, TRANSACTION_VERSION_ERC20_CONVERSION,
};
pub use minting::{
    CoinCreationTransaction, MinterDefinitionTransaction, TRANSACTION_VERSION_COIN_CREATION,
    TRANSACTION_VERSION_MINTER_DEFINITION,
};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shared_types::{
    CodecError, CoinInput, Currency, Decode, Decoder, Encode, Encoder, FulfillContext, KeyStore,
    SignatureHasher, Transaction, TransactionId, TransactionValidationConstants, UnlockHash,
    ValidationContext,
};

use self::common::{
    check_fee_inputs, check_miner_fee, check_no_double_spend, finish_digest, input_index_extra,
    put_parent_ids,
};
use crate::config::NetworkConfig;
use crate::domain::ValidationError;
use crate::ports::{CoinOutputLookup, Erc20WithdrawValidator, TransactionRegistry};

pub const TRANSACTION_VERSION_LEGACY: u8 = 0;
pub const TRANSACTION_VERSION_STANDARD: u8 = 1;

/// Whether `version` selects one of the known kinds.
pub fn is_known_version(version: u8) -> bool {
    matches!(
        version,
        TRANSACTION_VERSION_LEGACY
            | TRANSACTION_VERSION_STANDARD
            | TRANSACTION_VERSION_MINTER_DEFINITION
            | TRANSACTION_VERSION_COIN_CREATION
            | TRANSACTION_VERSION_BOT_REGISTRATION
            | TRANSACTION_VERSION_BOT_RECORD_UPDATE
            | TRANSACTION_VERSION_BOT_NAME_TRANSFER
            | TRANSACTION_VERSION_ERC20_CONVERSION
            | TRANSACTION_VERSION_ERC20_COIN_CREATION
            | TRANSACTION_VERSION_ERC20_ADDRESS_REGISTRATION
    )
}

/// A transaction of one of the known kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedTransaction {
    Legacy(Transaction),
    Standard(Transaction),
    MinterDefinition(MinterDefinitionTransaction),
    CoinCreation(CoinCreationTransaction),
    BotRegistration(BotRegistrationTransaction),
    BotRecordUpdate(BotRecordUpdateTransaction),
    BotNameTransfer(BotNameTransferTransaction),
    Erc20Convert(Erc20ConvertTransaction),
    Erc20CoinCreation(Erc20CoinCreationTransaction),
    Erc20AddressRegistration(Erc20AddressRegistrationTransaction),
}

/// Value paid to a fixed address on top of the miner fees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerPayout {
    pub unlock_hash: UnlockHash,
    pub value: Currency,
}

macro_rules! impl_from_kind {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for TypedTransaction {
                fn from(tx: $ty) -> Self {
                    TypedTransaction::$variant(tx)
                }
            }
        )*
    };
}

impl_from_kind! {
    MinterDefinition(MinterDefinitionTransaction),
    CoinCreation(CoinCreationTransaction),
    BotRegistration(BotRegistrationTransaction),
    BotRecordUpdate(BotRecordUpdateTransaction),
    BotNameTransfer(BotNameTransferTransaction),
    Erc20Convert(Erc20ConvertTransaction),
    Erc20CoinCreation(Erc20CoinCreationTransaction),
    Erc20AddressRegistration(Erc20AddressRegistrationTransaction),
}

impl TypedTransaction {
    /// Interpret a generic transaction according to its version.
    pub fn from_transaction(tx: &Transaction) -> Result<Self, CodecError> {
        Ok(match tx.version {
            TRANSACTION_VERSION_LEGACY => TypedTransaction::Legacy(tx.clone()),
            TRANSACTION_VERSION_STANDARD => TypedTransaction::Standard(tx.clone()),
            TRANSACTION_VERSION_MINTER_DEFINITION => {
                TypedTransaction::MinterDefinition(MinterDefinitionTransaction::from_transaction(tx)?)
            }
            TRANSACTION_VERSION_COIN_CREATION => {
                TypedTransaction::CoinCreation(CoinCreationTransaction::from_transaction(tx)?)
            }
            TRANSACTION_VERSION_BOT_REGISTRATION => {
                TypedTransaction::BotRegistration(BotRegistrationTransaction::from_transaction(tx)?)
            }
            TRANSACTION_VERSION_BOT_RECORD_UPDATE => {
                TypedTransaction::BotRecordUpdate(BotRecordUpdateTransaction::from_transaction(tx)?)
            }
            TRANSACTION_VERSION_BOT_NAME_TRANSFER => {
                TypedTransaction::BotNameTransfer(BotNameTransferTransaction::from_transaction(tx)?)
            }
            TRANSACTION_VERSION_ERC20_CONVERSION => {
                TypedTransaction::Erc20Convert(Erc20ConvertTransaction::from_transaction(tx)?)
            }
            TRANSACTION_VERSION_ERC20_COIN_CREATION => {
                TypedTransaction::Erc20CoinCreation(Erc20CoinCreationTransaction::from_transaction(tx)?)
            }
            TRANSACTION_VERSION_ERC20_ADDRESS_REGISTRATION => TypedTransaction::Erc20AddressRegistration(
                Erc20AddressRegistrationTransaction::from_transaction(tx)?,
            ),
            other => {
                return Err(CodecError::invalid(
                    "transaction",
                    format!("unknown transaction version {}", other),
                ))
            }
        })
    }

    pub fn to_transaction(&self) -> Transaction {
        match self {
            TypedTransaction::Legacy(tx) | TypedTransaction::Standard(tx) => tx.clone(),
            TypedTransaction::MinterDefinition(tx) => tx.to_transaction(),
            TypedTransaction::CoinCreation(tx) => tx.to_transaction(),
            TypedTransaction::BotRegistration(tx) => tx.to_transaction(),
            TypedTransaction::BotRecordUpdate(tx) => tx.to_transaction(),
            TypedTransaction::BotNameTransfer(tx) => tx.to_transaction(),
            TypedTransaction::Erc20Convert(tx) => tx.to_transaction(),
            TypedTransaction::Erc20CoinCreation(tx) => tx.to_transaction(),
            TypedTransaction::Erc20AddressRegistration(tx) => tx.to_transaction(),
        }
    }

    pub fn version(&self) -> u8 {
        match self {
            TypedTransaction::Legacy(_) => TRANSACTION_VERSION_LEGACY,
            TypedTransaction::Standard(_) => TRANSACTION_VERSION_STANDARD,
            TypedTransaction::MinterDefinition(_) => TRANSACTION_VERSION_MINTER_DEFINITION,
            TypedTransaction::CoinCreation(_) => TRANSACTION_VERSION_COIN_CREATION,
            TypedTransaction::BotRegistration(_) => TRANSACTION_VERSION_BOT_REGISTRATION,
            TypedTransaction::BotRecordUpdate(_) => TRANSACTION_VERSION_BOT_RECORD_UPDATE,
            TypedTransaction::BotNameTransfer(_) => TRANSACTION_VERSION_BOT_NAME_TRANSFER,
            TypedTransaction::Erc20Convert(_) => TRANSACTION_VERSION_ERC20_CONVERSION,
            TypedTransaction::Erc20CoinCreation(_) => TRANSACTION_VERSION_ERC20_COIN_CREATION,
            TypedTransaction::Erc20AddressRegistration(_) => TRANSACTION_VERSION_ERC20_ADDRESS_REGISTRATION,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TypedTransaction::Legacy(_) => "legacy",
            TypedTransaction::Standard(_) => "standard",
            TypedTransaction::MinterDefinition(_) => "minter definition",
            TypedTransaction::CoinCreation(_) => "coin creation",
            TypedTransaction::BotRegistration(_) => "bot registration",
            TypedTransaction::BotRecordUpdate(_) => "bot record update",
            TypedTransaction::BotNameTransfer(_) => "bot name transfer",
            TypedTransaction::Erc20Convert(_) => "erc20 convert",
            TypedTransaction::Erc20CoinCreation(_) => "erc20 coin creation",
            TypedTransaction::Erc20AddressRegistration(_) => "erc20 address registration",
        }
    }

    /// Id of the generic form, which is what blocks commit to.
    pub fn id(&self) -> TransactionId {
        self.to_transaction().id()
    }

    pub fn coin_inputs(&self) -> &[CoinInput] {
        match self {
            TypedTransaction::Legacy(tx) | TypedTransaction::Standard(tx) => &tx.coin_inputs,
            TypedTransaction::BotRegistration(tx) => &tx.coin_inputs,
            TypedTransaction::BotRecordUpdate(tx) => &tx.coin_inputs,
            TypedTransaction::BotNameTransfer(tx) => &tx.coin_inputs,
            TypedTransaction::Erc20Convert(tx) => &tx.coin_inputs,
            TypedTransaction::Erc20AddressRegistration(tx) => &tx.coin_inputs,
            TypedTransaction::MinterDefinition(_)
            | TypedTransaction::CoinCreation(_)
            | TypedTransaction::Erc20CoinCreation(_) => &[],
        }
    }

    fn coin_inputs_mut(&mut self) -> Option<&mut Vec<CoinInput>> {
        match self {
            TypedTransaction::Legacy(tx) | TypedTransaction::Standard(tx) => Some(&mut tx.coin_inputs),
            TypedTransaction::BotRegistration(tx) => Some(&mut tx.coin_inputs),
            TypedTransaction::BotRecordUpdate(tx) => Some(&mut tx.coin_inputs),
            TypedTransaction::BotNameTransfer(tx) => Some(&mut tx.coin_inputs),
            TypedTransaction::Erc20Convert(tx) => Some(&mut tx.coin_inputs),
            TypedTransaction::Erc20AddressRegistration(tx) => Some(&mut tx.coin_inputs),
            TypedTransaction::MinterDefinition(_)
            | TypedTransaction::CoinCreation(_)
            | TypedTransaction::Erc20CoinCreation(_) => None,
        }
    }

    /// Payouts required on top of the miner fees: bot fees go to the bot
    /// registry pool, ERC20 registration fees to the bridge fee pool.
    pub fn custom_miner_payouts(&self, config: &NetworkConfig) -> Vec<MinerPayout> {
        let (unlock_hash, value) = match self {
            TypedTransaction::BotRegistration(tx) => {
                (config.bot_registry_pool, tx.required_bot_fee(config.one_coin))
            }
            TypedTransaction::BotRecordUpdate(tx) => {
                (config.bot_registry_pool, tx.required_bot_fee(config.one_coin))
            }
            TypedTransaction::BotNameTransfer(tx) => {
                (config.bot_registry_pool, tx.required_bot_fee(config.one_coin))
            }
            TypedTransaction::Erc20AddressRegistration(tx) => (config.erc20_fee_pool, tx.registration_fee),
            _ => return Vec::new(),
        };
        vec![MinerPayout { unlock_hash, value }]
    }

    /// Sign everything `keys` can sign: the kind's own signatures first,
    /// then every coin input whose parent output is known.
    pub fn sign<R: TransactionRegistry>(
        &mut self,
        keys: &dyn KeyStore,
        registry: &R,
        coin_outputs: &dyn CoinOutputLookup,
    ) -> Result<bool, ValidationError> {
        let mut signed = match self {
            TypedTransaction::MinterDefinition(tx) => tx.sign_extension(keys, registry)?,
            TypedTransaction::CoinCreation(tx) => tx.sign_extension(keys, registry)?,
            TypedTransaction::BotRegistration(tx) => tx.sign_extension(keys)?,
            TypedTransaction::BotRecordUpdate(tx) => tx.sign_extension(keys, registry)?,
            TypedTransaction::BotNameTransfer(tx) => tx.sign_extension(keys, registry)?,
            TypedTransaction::Erc20AddressRegistration(tx) => tx.sign_extension(keys)?,
            _ => false,
        };

        // fulfillments are not part of the digest, so all of them can be
        // computed against the current state before any is assigned
        let mut fulfillments = Vec::with_capacity(self.coin_inputs().len());
        for (index, ci) in self.coin_inputs().iter().enumerate() {
            let parent = coin_outputs
                .coin_output(&ci.parent_id)
                .ok_or(ValidationError::UnknownCoinOutput {
                    parent_id: ci.parent_id,
                })?;
            let mut fulfillment = ci.fulfillment.clone();
            signed |= fulfillment.sign(&parent.condition, keys, &input_index_extra(index), &*self)?;
            fulfillments.push(fulfillment);
        }
        if let Some(inputs) = self.coin_inputs_mut() {
            for (ci, fulfillment) in inputs.iter_mut().zip(fulfillments) {
                ci.fulfillment = fulfillment;
            }
        }
        Ok(signed)
    }

    /// Check the transaction against the network limits and its kind's rules.
    pub async fn validate<R, W>(
        &self,
        ctx: &ValidationContext,
        config: &NetworkConfig,
        registry: &R,
        withdrawals: &W,
    ) -> Result<(), ValidationError>
    where
        R: TransactionRegistry,
        W: Erc20WithdrawValidator,
    {
        let ctx = ctx.with_multisig_minimum_height(config.multisig_minimum_height);
        let constants = config.validation_constants();

        let generic = self.to_transaction();
        let size = generic.encoded_len();
        if size > constants.block_size_limit {
            return Err(ValidationError::TooLarge {
                size,
                limit: constants.block_size_limit,
            });
        }
        if generic.arbitrary_data.len() > constants.arbitrary_data_size_limit {
            return Err(ValidationError::ArbitraryDataTooLarge {
                size: generic.arbitrary_data.len(),
                limit: constants.arbitrary_data_size_limit,
            });
        }
        for co in &generic.coin_outputs {
            co.condition.is_standard(&ctx)?;
        }

        match self {
            TypedTransaction::Legacy(tx) | TypedTransaction::Standard(tx) => validate_generic(tx, &constants),
            TypedTransaction::MinterDefinition(tx) => tx.validate(&ctx, &constants, registry),
            TypedTransaction::CoinCreation(tx) => tx.validate(&ctx, &constants, registry),
            TypedTransaction::BotRegistration(tx) => {
                check_fee_inputs(&tx.coin_inputs)?;
                tx.validate(&ctx, &constants, registry)
            }
            TypedTransaction::BotRecordUpdate(tx) => {
                check_fee_inputs(&tx.coin_inputs)?;
                tx.validate(&ctx, &constants, registry)
            }
            TypedTransaction::BotNameTransfer(tx) => {
                check_fee_inputs(&tx.coin_inputs)?;
                tx.validate(&ctx, &constants, registry)
            }
            TypedTransaction::Erc20Convert(tx) => tx.validate(&constants, config.one_coin),
            TypedTransaction::Erc20CoinCreation(tx) => tx.validate(&constants, registry, withdrawals).await,
            TypedTransaction::Erc20AddressRegistration(tx) => {
                tx.validate(&ctx, &constants, config.one_coin, registry)
            }
        }
    }

    /// Check every coin input against the output it spends, and that the
    /// inputs pay exactly for the outputs, fees, payouts and burned value.
    pub fn validate_coin_outputs(
        &self,
        ctx: &ValidationContext,
        config: &NetworkConfig,
        coin_outputs: &dyn CoinOutputLookup,
    ) -> Result<(), ValidationError> {
        let inputs = self.coin_inputs();
        if inputs.is_empty() {
            return match self {
                TypedTransaction::BotRegistration(_)
                | TypedTransaction::BotRecordUpdate(_)
                | TypedTransaction::BotNameTransfer(_)
                | TypedTransaction::Erc20Convert(_)
                | TypedTransaction::Erc20AddressRegistration(_) => Err(ValidationError::NoCoinInputs),
                _ => Ok(()),
            };
        }

        let mut input_sum = Currency::zero();
        for (index, ci) in inputs.iter().enumerate() {
            let parent = coin_outputs
                .coin_output(&ci.parent_id)
                .ok_or(ValidationError::UnknownCoinOutput {
                    parent_id: ci.parent_id,
                })?;
            let extra = input_index_extra(index);
            parent.condition.fulfill(
                &ci.fulfillment,
                &FulfillContext {
                    block_height: ctx.block_height,
                    block_time: ctx.block_time,
                    extra_objects: &extra,
                    hasher: self,
                },
            )?;
            input_sum = input_sum + parent.value;
        }

        let generic = self.to_transaction();
        let mut output_sum: Currency = generic.coin_outputs.iter().map(|co| co.value).sum();
        output_sum = output_sum + generic.miner_fees.iter().copied().sum();
        output_sum = output_sum + self.custom_miner_payouts(config).iter().map(|p| p.value).sum();
        if let TypedTransaction::Erc20Convert(tx) = self {
            output_sum = output_sum + tx.value;
        }

        if input_sum != output_sum {
            return Err(ValidationError::UnbalancedFunds {
                inputs: input_sum,
                outputs: output_sum,
            });
        }
        Ok(())
    }
}

fn validate_generic(tx: &Transaction, constants: &TransactionValidationConstants) -> Result<(), ValidationError> {
    for fee in &tx.miner_fees {
        check_miner_fee(*fee, constants.minimum_miner_fee)?;
    }
    check_no_double_spend(&tx.coin_inputs)?;
    if tx.coin_outputs.iter().any(|co| co.value.is_zero()) {
        return Err(ValidationError::ZeroValue);
    }
    Ok(())
}

/// Digest of legacy and standard transactions: everything but the fulfillments.
fn generic_signature_hash(tx: &Transaction, extra_objects: &[u8]) -> [u8; 32] {
    let mut enc = Encoder::new();
    enc.put_u8(tx.version).put_raw(extra_objects);
    put_parent_ids(&mut enc, &tx.coin_inputs);
    enc.put(&tx.coin_outputs)
        .put(&tx.miner_fees)
        .put_prefixed(&tx.arbitrary_data)
        .put_prefixed(&tx.extension);
    finish_digest(enc)
}

impl SignatureHasher for TypedTransaction {
    fn signature_hash(&self, extra_objects: &[u8]) -> [u8; 32] {
        match self {
            TypedTransaction::Legacy(tx) | TypedTransaction::Standard(tx) => {
                generic_signature_hash(tx, extra_objects)
            }
            TypedTransaction::MinterDefinition(tx) => tx.signature_hash(extra_objects),
            TypedTransaction::CoinCreation(tx) => tx.signature_hash(extra_objects),
            TypedTransaction::BotRegistration(tx) => tx.signature_hash(extra_objects),
            TypedTransaction::BotRecordUpdate(tx) => tx.signature_hash(extra_objects),
            TypedTransaction::BotNameTransfer(tx) => tx.signature_hash(extra_objects),
            TypedTransaction::Erc20Convert(tx) => tx.signature_hash(extra_objects),
            TypedTransaction::Erc20CoinCreation(tx) => tx.signature_hash(extra_objects),
            TypedTransaction::Erc20AddressRegistration(tx) => tx.signature_hash(extra_objects),
        }
    }
}

// =============================================================================
// ENCODINGS
// =============================================================================

/// Version byte, then the kind's compact form.
impl Encode for TypedTransaction {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u8(self.version());
        match self {
            TypedTransaction::Legacy(tx) | TypedTransaction::Standard(tx) => {
                enc.put(&tx.coin_inputs)
                    .put(&tx.coin_outputs)
                    .put(&tx.miner_fees)
                    .put_prefixed(&tx.arbitrary_data)
                    .put_prefixed(&tx.extension);
            }
            TypedTransaction::MinterDefinition(tx) => tx.encode(enc),
            TypedTransaction::CoinCreation(tx) => tx.encode(enc),
            TypedTransaction::BotRegistration(tx) => tx.encode(enc),
            TypedTransaction::BotRecordUpdate(tx) => tx.encode(enc),
            TypedTransaction::BotNameTransfer(tx) => tx.encode(enc),
            TypedTransaction::Erc20Convert(tx) => tx.encode(enc),
            TypedTransaction::Erc20CoinCreation(tx) => tx.encode(enc),
            TypedTransaction::Erc20AddressRegistration(tx) => tx.encode(enc),
        }
    }
}

impl Decode for TypedTransaction {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let version = dec.get_u8()?;
        Ok(match version {
            TRANSACTION_VERSION_LEGACY | TRANSACTION_VERSION_STANDARD => {
                let tx = Transaction {
                    version,
                    coin_inputs: dec.get()?,
                    coin_outputs: dec.get()?,
                    miner_fees: dec.get()?,
                    arbitrary_data: dec.get_prefixed()?,
                    extension: dec.get_prefixed()?,
                };
                if version == TRANSACTION_VERSION_LEGACY {
                    TypedTransaction::Legacy(tx)
                } else {
                    TypedTransaction::Standard(tx)
                }
            }
            TRANSACTION_VERSION_MINTER_DEFINITION => TypedTransaction::MinterDefinition(dec.get()?),
            TRANSACTION_VERSION_COIN_CREATION => TypedTransaction::CoinCreation(dec.get()?),
            TRANSACTION_VERSION_BOT_REGISTRATION => TypedTransaction::BotRegistration(dec.get()?),
            TRANSACTION_VERSION_BOT_RECORD_UPDATE => TypedTransaction::BotRecordUpdate(dec.get()?),
            TRANSACTION_VERSION_BOT_NAME_TRANSFER => TypedTransaction::BotNameTransfer(dec.get()?),
            TRANSACTION_VERSION_ERC20_CONVERSION => TypedTransaction::Erc20Convert(dec.get()?),
            TRANSACTION_VERSION_ERC20_COIN_CREATION => TypedTransaction::Erc20CoinCreation(dec.get()?),
            TRANSACTION_VERSION_ERC20_ADDRESS_REGISTRATION => {
                TypedTransaction::Erc20AddressRegistration(dec.get()?)
            }
            other => {
                return Err(CodecError::invalid(
                    "transaction",
                    format!("unknown transaction version {}", other),
                ))
            }
        })
    }
}

#[derive(Serialize)]
struct VersionedJson<'a, T: Serialize> {
    version: u8,
    data: &'a T,
}

#[derive(Deserialize)]
struct RawVersionedJson {
    version: u8,
    #[serde(default)]
    data: serde_json::Value,
}

/// `{"version": n, "data": {...}}`
impl Serialize for TypedTransaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let version = self.version();
        match self {
            TypedTransaction::Legacy(data) | TypedTransaction::Standard(data) => {
                VersionedJson { version, data }.serialize(serializer)
            }
            TypedTransaction::MinterDefinition(data) => VersionedJson { version, data }.serialize(serializer),
            TypedTransaction::CoinCreation(data) => VersionedJson { version, data }.serialize(serializer),
            TypedTransaction::BotRegistration(data) => VersionedJson { version, data }.serialize(serializer),
            TypedTransaction::BotRecordUpdate(data) => VersionedJson { version, data }.serialize(serializer),
            TypedTransaction::BotNameTransfer(data) => VersionedJson { version, data }.serialize(serializer),
            TypedTransaction::Erc20Convert(data) => VersionedJson { version, data }.serialize(serializer),
            TypedTransaction::Erc20CoinCreation(data) => VersionedJson { version, data }.serialize(serializer),
            TypedTransaction::Erc20AddressRegistration(data) => {
                VersionedJson { version, data }.serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for TypedTransaction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let RawVersionedJson { version, data } = RawVersionedJson::deserialize(deserializer)?;
        let typed = match version {
            TRANSACTION_VERSION_LEGACY | TRANSACTION_VERSION_STANDARD => {
                serde_json::from_value::<Transaction>(data).map(|mut tx| {
                    tx.version = version;
                    if version == TRANSACTION_VERSION_LEGACY {
                        TypedTransaction::Legacy(tx)
                    } else {
                        TypedTransaction::Standard(tx)
                    }
                })
            }
            TRANSACTION_VERSION_MINTER_DEFINITION => {
                serde_json::from_value(data).map(TypedTransaction::MinterDefinition)
            }
            TRANSACTION_VERSION_COIN_CREATION => serde_json::from_value(data).map(TypedTransaction::CoinCreation),
            TRANSACTION_VERSION_BOT_REGISTRATION => {
                serde_json::from_value(data).map(TypedTransaction::BotRegistration)
            }
            TRANSACTION_VERSION_BOT_RECORD_UPDATE => {
                serde_json::from_value(data).map(TypedTransaction::BotRecordUpdate)
            }
            TRANSACTION_VERSION_BOT_NAME_TRANSFER => {
                serde_json::from_value(data).map(TypedTransaction::BotNameTransfer)
            }
            TRANSACTION_VERSION_ERC20_CONVERSION => serde_json::from_value(data).map(TypedTransaction::Erc20Convert),
            TRANSACTION_VERSION_ERC20_COIN_CREATION => {
                serde_json::from_value(data).map(TypedTransaction::Erc20CoinCreation)
            }
            TRANSACTION_VERSION_ERC20_ADDRESS_REGISTRATION => {
                serde_json::from_value(data).map(TypedTransaction::Erc20AddressRegistration)
            }
            other => return Err(D::Error::custom(format!("unknown transaction version {}", other))),
        };
        typed.map_err(D::Error::custom)
    }
}
