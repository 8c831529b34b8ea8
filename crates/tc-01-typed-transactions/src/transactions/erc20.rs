//! # ERC20 Bridge Transactions
//!
//! - **Convert** (version 208) burns native coins to be minted as ERC20
//!   tokens on the other side.
//! - **Coin Creation** (version 209) mints native coins for an observed
//!   ERC20 withdrawal; each ERC20 transaction can be used only once.
//! - **Address Registration** (version 210) binds the address of a public
//!   key to its derived ERC20 address, for a fixed fee.

use serde::{Deserialize, Serialize};
use shared_types::{
    hex_bytes, CodecError, CoinInput, CoinOutput, Currency, Decode, Decoder, Encode, Encoder,
    KeyStore, PublicKey, SignatureHasher, Specifier, Transaction, TransactionValidationConstants,
    UnlockCondition, UnlockHash, ValidationContext,
};
use tracing::debug;

use super::common::{
    check_fee_inputs, check_miner_fee, check_refund, decode_extension, finish_digest,
    join_fee_paying, put_parent_ids, sign_as_bot, split_fee_paying, validate_bot_signature,
};
use crate::domain::fees::{ERC20_ADDRESS_REGISTRATION_FEE_MULTIPLIER, ERC20_CONVERSION_MINIMUM_MULTIPLIER};
use crate::domain::{Erc20Address, Erc20Hash, ValidationError};
use crate::ports::{Erc20Registry, Erc20WithdrawValidator};

pub const TRANSACTION_VERSION_ERC20_CONVERSION: u8 = 208;
pub const TRANSACTION_VERSION_ERC20_COIN_CREATION: u8 = 209;
pub const TRANSACTION_VERSION_ERC20_ADDRESS_REGISTRATION: u8 = 210;

pub const SPECIFIER_ERC20_CONVERT_TRANSACTION: Specifier = Specifier::new(b"erc20 convert tx");
pub const SPECIFIER_ERC20_COIN_CREATION_TRANSACTION: Specifier = Specifier::new(b"erc20 coingen tx");
pub const SPECIFIER_ERC20_ADDRESS_REGISTRATION_TRANSACTION: Specifier = Specifier::new(b"erc20 addrreg tx");

/// Extra object of the address registration signature.
pub const ERC20_REGISTRATION_SIGNATURE_SPECIFIER: &[u8] = b"registration";

/// Fee for registering an ERC20 withdrawal address.
pub fn erc20_registration_fee(one_coin: Currency) -> Currency {
    one_coin.mul_div(ERC20_ADDRESS_REGISTRATION_FEE_MULTIPLIER, 1)
}

/// Smallest value that can be converted.
pub fn erc20_conversion_minimum(one_coin: Currency) -> Currency {
    one_coin.mul_div(ERC20_CONVERSION_MINIMUM_MULTIPLIER, 1)
}

// =============================================================================
// CONVERT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20ConvertTransaction {
    pub address: Erc20Address,
    pub value: Currency,
    #[serde(rename = "txfee")]
    pub transaction_fee: Currency,
    #[serde(rename = "coininputs")]
    pub coin_inputs: Vec<CoinInput>,
    #[serde(rename = "refundcoinoutput", default, skip_serializing_if = "Option::is_none")]
    pub refund: Option<CoinOutput>,
}

impl Erc20ConvertTransaction {
    const KIND: &'static str = "ERC20 convert transaction";

    pub fn from_transaction(tx: &Transaction) -> Result<Self, CodecError> {
        if tx.version != TRANSACTION_VERSION_ERC20_CONVERSION {
            return Err(CodecError::invalid(Self::KIND, format!("unexpected version {}", tx.version)));
        }
        let parts = split_fee_paying(tx, Self::KIND)?;
        decode_extension(&tx.extension, |dec| {
            Ok(Self {
                address: dec.get()?,
                value: dec.get()?,
                transaction_fee: parts.transaction_fee,
                coin_inputs: parts.coin_inputs,
                refund: parts.refund,
            })
        })
    }

    pub fn to_transaction(&self) -> Transaction {
        let mut ext = Encoder::new();
        ext.put(&self.address).put(&self.value);
        join_fee_paying(
            TRANSACTION_VERSION_ERC20_CONVERSION,
            &self.coin_inputs,
            self.transaction_fee,
            &self.refund,
            ext.into_bytes(),
        )
    }

    pub fn validate(
        &self,
        constants: &TransactionValidationConstants,
        one_coin: Currency,
    ) -> Result<(), ValidationError> {
        let minimum = erc20_conversion_minimum(one_coin);
        if self.value < minimum {
            return Err(ValidationError::ConversionBelowMinimum {
                value: self.value,
                minimum,
            });
        }
        check_miner_fee(self.transaction_fee, constants.minimum_miner_fee)?;
        check_fee_inputs(&self.coin_inputs)?;
        check_refund(&self.refund)
    }
}

impl SignatureHasher for Erc20ConvertTransaction {
    fn signature_hash(&self, extra_objects: &[u8]) -> [u8; 32] {
        let mut enc = Encoder::new();
        enc.put_u8(TRANSACTION_VERSION_ERC20_CONVERSION)
            .put(&SPECIFIER_ERC20_CONVERT_TRANSACTION)
            .put(&self.address)
            .put(&self.value)
            .put_raw(extra_objects);
        put_parent_ids(&mut enc, &self.coin_inputs);
        enc.put(&self.transaction_fee).put(&self.refund);
        finish_digest(enc)
    }
}

impl Encode for Erc20ConvertTransaction {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.address)
            .put(&self.value)
            .put(&self.transaction_fee)
            .put(&self.coin_inputs)
            .put(&self.refund);
    }
}

impl Decode for Erc20ConvertTransaction {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            address: dec.get()?,
            value: dec.get()?,
            transaction_fee: dec.get()?,
            coin_inputs: dec.get()?,
            refund: dec.get()?,
        })
    }
}

// =============================================================================
// COIN CREATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20CoinCreationTransaction {
    pub address: UnlockHash,
    pub value: Currency,
    #[serde(rename = "txfee")]
    pub transaction_fee: Currency,
    #[serde(rename = "blockid")]
    pub block_id: Erc20Hash,
    #[serde(rename = "txid")]
    pub transaction_id: Erc20Hash,
}

impl Erc20CoinCreationTransaction {
    const KIND: &'static str = "ERC20 coin creation transaction";

    pub fn from_transaction(tx: &Transaction) -> Result<Self, CodecError> {
        if tx.version != TRANSACTION_VERSION_ERC20_COIN_CREATION {
            return Err(CodecError::invalid(Self::KIND, format!("unexpected version {}", tx.version)));
        }
        if !tx.coin_inputs.is_empty() || tx.coin_outputs.len() != 1 || tx.miner_fees.len() != 1 {
            return Err(CodecError::invalid(
                Self::KIND,
                "no coin inputs, exactly one coin output and exactly one miner fee are required",
            ));
        }
        if !tx.arbitrary_data.is_empty() {
            return Err(CodecError::invalid(Self::KIND, "no arbitrary data is allowed"));
        }
        let output = &tx.coin_outputs[0];
        let UnlockCondition::UnlockHash(address) = output.condition else {
            return Err(CodecError::invalid(Self::KIND, "coin output must be locked to an address"));
        };
        decode_extension(&tx.extension, |dec| {
            Ok(Self {
                address,
                value: output.value,
                transaction_fee: tx.miner_fees[0],
                block_id: dec.get()?,
                transaction_id: dec.get()?,
            })
        })
    }

    pub fn to_transaction(&self) -> Transaction {
        let mut ext = Encoder::new();
        ext.put(&self.block_id).put(&self.transaction_id);
        Transaction {
            version: TRANSACTION_VERSION_ERC20_COIN_CREATION,
            coin_inputs: Vec::new(),
            coin_outputs: vec![CoinOutput {
                value: self.value,
                condition: UnlockCondition::UnlockHash(self.address),
            }],
            miner_fees: vec![self.transaction_fee],
            arbitrary_data: Vec::new(),
            extension: ext.into_bytes(),
        }
    }

    /// Local checks first; the withdrawal itself is confirmed last, by the bridge.
    pub async fn validate(
        &self,
        constants: &TransactionValidationConstants,
        registry: &dyn Erc20Registry,
        withdrawals: &dyn Erc20WithdrawValidator,
    ) -> Result<(), ValidationError> {
        check_miner_fee(self.transaction_fee, constants.minimum_miner_fee)?;
        if self.address.is_nil() {
            return Err(ValidationError::NilAddress);
        }
        if self.value.is_zero() {
            return Err(ValidationError::ZeroValue);
        }

        if let Some(txid) = registry.tft_transaction_id_for_erc20_transaction_id(&self.transaction_id)? {
            return Err(ValidationError::Erc20TransactionAlreadyMapped {
                erc20_txid: self.transaction_id,
                txid,
            });
        }

        if registry.erc20_address_for_tft_address(&self.address)?.is_none() {
            return Err(ValidationError::AddressNotRegistered { address: self.address });
        }

        debug!(
            erc20_txid = %self.transaction_id,
            address = %self.address,
            "[tc-01] Validating ERC20 withdrawal"
        );
        withdrawals
            .validate_withdraw_tx(
                self.block_id,
                self.transaction_id,
                Erc20Address::from_unlock_hash(&self.address),
                self.value,
            )
            .await
    }
}

impl SignatureHasher for Erc20CoinCreationTransaction {
    fn signature_hash(&self, extra_objects: &[u8]) -> [u8; 32] {
        let mut enc = Encoder::new();
        enc.put_u8(TRANSACTION_VERSION_ERC20_COIN_CREATION)
            .put(&SPECIFIER_ERC20_COIN_CREATION_TRANSACTION)
            .put_raw(extra_objects)
            .put(&self.address)
            .put(&self.value)
            .put(&self.transaction_fee)
            .put(&self.block_id)
            .put(&self.transaction_id);
        finish_digest(enc)
    }
}

impl Encode for Erc20CoinCreationTransaction {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.address)
            .put(&self.value)
            .put(&self.transaction_fee)
            .put(&self.block_id)
            .put(&self.transaction_id);
    }
}

impl Decode for Erc20CoinCreationTransaction {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            address: dec.get()?,
            value: dec.get()?,
            transaction_fee: dec.get()?,
            block_id: dec.get()?,
            transaction_id: dec.get()?,
        })
    }
}

// =============================================================================
// ADDRESS REGISTRATION
// =============================================================================

/// Text form also carries both derived addresses; when present on input
/// they must match the public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "Erc20AddressRegistrationJson",
    into = "Erc20AddressRegistrationJson"
)]
pub struct Erc20AddressRegistrationTransaction {
    pub public_key: PublicKey,
    pub signature: Vec<u8>,
    pub registration_fee: Currency,
    pub transaction_fee: Currency,
    pub coin_inputs: Vec<CoinInput>,
    pub refund: Option<CoinOutput>,
}

#[derive(Serialize, Deserialize)]
struct Erc20AddressRegistrationJson {
    pubkey: PublicKey,
    #[serde(rename = "tftaddress", default, skip_serializing_if = "Option::is_none")]
    tft_address: Option<UnlockHash>,
    #[serde(rename = "erc20address", default, skip_serializing_if = "Option::is_none")]
    erc20_address: Option<Erc20Address>,
    #[serde(with = "hex_bytes")]
    signature: Vec<u8>,
    #[serde(rename = "regfee")]
    registration_fee: Currency,
    #[serde(rename = "txfee")]
    transaction_fee: Currency,
    #[serde(rename = "coininputs")]
    coin_inputs: Vec<CoinInput>,
    #[serde(rename = "refundcoinoutput", default, skip_serializing_if = "Option::is_none")]
    refund: Option<CoinOutput>,
}

impl TryFrom<Erc20AddressRegistrationJson> for Erc20AddressRegistrationTransaction {
    type Error = String;

    fn try_from(json: Erc20AddressRegistrationJson) -> Result<Self, Self::Error> {
        let tft_address = UnlockHash::from_public_key(&json.pubkey);
        if let Some(given) = json.tft_address {
            if given != tft_address {
                return Err(format!("tftaddress {} does not match public key ({})", given, tft_address));
            }
        }
        let erc20_address = Erc20Address::from_unlock_hash(&tft_address);
        if let Some(given) = json.erc20_address {
            if given != erc20_address {
                return Err(format!(
                    "erc20address {} does not match public key ({})",
                    given, erc20_address
                ));
            }
        }
        Ok(Self {
            public_key: json.pubkey,
            signature: json.signature,
            registration_fee: json.registration_fee,
            transaction_fee: json.transaction_fee,
            coin_inputs: json.coin_inputs,
            refund: json.refund,
        })
    }
}

impl From<Erc20AddressRegistrationTransaction> for Erc20AddressRegistrationJson {
    fn from(tx: Erc20AddressRegistrationTransaction) -> Self {
        let tft_address = tx.tft_address();
        Self {
            tft_address: Some(tft_address),
            erc20_address: Some(Erc20Address::from_unlock_hash(&tft_address)),
            pubkey: tx.public_key,
            signature: tx.signature,
            registration_fee: tx.registration_fee,
            transaction_fee: tx.transaction_fee,
            coin_inputs: tx.coin_inputs,
            refund: tx.refund,
        }
    }
}

impl Erc20AddressRegistrationTransaction {
    const KIND: &'static str = "ERC20 address registration transaction";

    /// Native address being registered.
    pub fn tft_address(&self) -> UnlockHash {
        UnlockHash::from_public_key(&self.public_key)
    }

    pub fn erc20_address(&self) -> Erc20Address {
        Erc20Address::from_unlock_hash(&self.tft_address())
    }

    pub fn from_transaction(tx: &Transaction) -> Result<Self, CodecError> {
        if tx.version != TRANSACTION_VERSION_ERC20_ADDRESS_REGISTRATION {
            return Err(CodecError::invalid(Self::KIND, format!("unexpected version {}", tx.version)));
        }
        let parts = split_fee_paying(tx, Self::KIND)?;
        decode_extension(&tx.extension, |dec| {
            Ok(Self {
                public_key: dec.get()?,
                signature: dec.get_prefixed()?,
                registration_fee: dec.get()?,
                transaction_fee: parts.transaction_fee,
                coin_inputs: parts.coin_inputs,
                refund: parts.refund,
            })
        })
    }

    pub fn to_transaction(&self) -> Transaction {
        let mut ext = Encoder::new();
        ext.put(&self.public_key)
            .put_prefixed(&self.signature)
            .put(&self.registration_fee);
        join_fee_paying(
            TRANSACTION_VERSION_ERC20_ADDRESS_REGISTRATION,
            &self.coin_inputs,
            self.transaction_fee,
            &self.refund,
            ext.into_bytes(),
        )
    }

    pub fn sign_extension(&mut self, keys: &dyn KeyStore) -> Result<bool, ValidationError> {
        let public_key = self.public_key.clone();
        match sign_as_bot(&*self, keys, &public_key, ERC20_REGISTRATION_SIGNATURE_SPECIFIER)? {
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
        one_coin: Currency,
        registry: &dyn Erc20Registry,
    ) -> Result<(), ValidationError> {
        validate_bot_signature(
            self,
            &self.public_key,
            &self.signature,
            ctx,
            ERC20_REGISTRATION_SIGNATURE_SPECIFIER,
        )?;

        if registry.erc20_address_for_tft_address(&self.tft_address())?.is_some() {
            return Err(ValidationError::Erc20AddressAlreadyRegistered);
        }

        let expected = erc20_registration_fee(one_coin);
        if self.registration_fee != expected {
            return Err(ValidationError::InvalidRegistrationFee {
                fee: self.registration_fee,
                expected,
            });
        }

        check_miner_fee(self.transaction_fee, constants.minimum_miner_fee)?;
        check_fee_inputs(&self.coin_inputs)?;
        check_refund(&self.refund)
    }
}

impl SignatureHasher for Erc20AddressRegistrationTransaction {
    fn signature_hash(&self, extra_objects: &[u8]) -> [u8; 32] {
        let mut enc = Encoder::new();
        enc.put_u8(TRANSACTION_VERSION_ERC20_ADDRESS_REGISTRATION)
            .put(&SPECIFIER_ERC20_ADDRESS_REGISTRATION_TRANSACTION)
            .put(&self.public_key)
            .put_raw(extra_objects);
        put_parent_ids(&mut enc, &self.coin_inputs);
        enc.put(&self.registration_fee)
            .put(&self.transaction_fee)
            .put(&self.refund);
        finish_digest(enc)
    }
}

impl Encode for Erc20AddressRegistrationTransaction {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.public_key)
            .put_prefixed(&self.signature)
            .put(&self.registration_fee)
            .put(&self.transaction_fee)
            .put(&self.coin_inputs)
            .put(&self.refund);
    }
}

impl Decode for Erc20AddressRegistrationTransaction {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            public_key: dec.get()?,
            signature: dec.get_prefixed()?,
            registration_fee: dec.get()?,
            transaction_fee: dec.get()?,
            coin_inputs: dec.get()?,
            refund: dec.get()?,
        })
    }
}
