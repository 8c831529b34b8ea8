//! # Bot Registration (version 144)
//!
//! Registers a new 3bot for a public key that is not registered yet.
//!
//! Compact binary form:
//!
//! ```text
//! monthsAndFlags | addrCount | nameCount << 4 | addresses | names
//!     | txfee | coin inputs | [refund] | identification
//! ```

use serde::{Deserialize, Serialize};
use shared_types::{
    decode_counted, CodecError, CoinInput, CoinOutput, Currency, Decode, Decoder, Encode, Encoder,
    KeyStore, PublicKeySignaturePair, SignatureHasher, Specifier, Transaction,
    TransactionValidationConstants, ValidationContext,
};

use super::common::{
    check_miner_fee, check_names_available, decode_extension, find_duplicate, finish_digest,
    join_fee_paying, put_parent_ids, sign_as_bot, signature_encoder, split_fee_paying,
    validate_bot_signature, MonthsAndFlags, BOT_SIGNATURE_SPECIFIER_SENDER,
};
use crate::domain::bot_record::check_count;
use crate::domain::fees::compute_registration_fee;
use crate::domain::{
    BotName, NetworkAddress, RegistryError, ValidationError, MAX_ADDRESSES_PER_BOT,
    MAX_BOT_PREPAID_MONTHS, MAX_NAMES_PER_BOT,
};
use crate::ports::BotRecordReadRegistry;

pub const TRANSACTION_VERSION_BOT_REGISTRATION: u8 = 0x90;
pub const SPECIFIER_BOT_REGISTRATION_TRANSACTION: Specifier = Specifier::new(b"bot register tx");

const KIND: &str = "bot registration transaction";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotRegistrationTransaction {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<NetworkAddress>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<BotName>,
    #[serde(rename = "nrofmonths")]
    pub months: u8,
    #[serde(rename = "txfee")]
    pub transaction_fee: Currency,
    #[serde(rename = "coininputs")]
    pub coin_inputs: Vec<CoinInput>,
    #[serde(rename = "refundcoinoutput", default, skip_serializing_if = "Option::is_none")]
    pub refund: Option<CoinOutput>,
    pub identification: PublicKeySignaturePair,
}

impl BotRegistrationTransaction {
    pub fn from_transaction(tx: &Transaction) -> Result<Self, CodecError> {
        if tx.version != TRANSACTION_VERSION_BOT_REGISTRATION {
            return Err(CodecError::invalid(KIND, format!("unexpected version {}", tx.version)));
        }
        let parts = split_fee_paying(tx, KIND)?;
        decode_extension(&tx.extension, |dec| {
            let maf: MonthsAndFlags = dec.get()?;
            let (addresses, names) = decode_addresses_and_names(dec)?;
            Ok(Self {
                addresses,
                names,
                months: maf.months,
                transaction_fee: parts.transaction_fee,
                coin_inputs: parts.coin_inputs,
                refund: parts.refund,
                identification: dec.get()?,
            })
        })
    }

    pub fn to_transaction(&self) -> Transaction {
        let mut ext = Encoder::new();
        ext.put(&self.months_and_flags());
        encode_addresses_and_names(&mut ext, &self.addresses, &self.names);
        ext.put(&self.identification);
        join_fee_paying(
            TRANSACTION_VERSION_BOT_REGISTRATION,
            &self.coin_inputs,
            self.transaction_fee,
            &self.refund,
            ext.into_bytes(),
        )
    }

    fn months_and_flags(&self) -> MonthsAndFlags {
        MonthsAndFlags {
            months: self.months,
            has_addresses: !self.addresses.is_empty(),
            has_names: !self.names.is_empty(),
            has_refund: self.refund.is_some(),
        }
    }

    /// Fee paid to the bot registry pool on top of the transaction fee.
    pub fn required_bot_fee(&self, one_coin: Currency) -> Currency {
        compute_registration_fee(self.months, self.names.len(), one_coin)
    }

    /// Sign the identification if `keys` holds the bot's key.
    pub fn sign_extension(&mut self, keys: &dyn KeyStore) -> Result<bool, ValidationError> {
        let public_key = self.identification.public_key.clone();
        match sign_as_bot(&*self, keys, &public_key, BOT_SIGNATURE_SPECIFIER_SENDER)? {
            Some(signature) => {
                self.identification.signature = signature;
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
        match registry.record_for_key(&self.identification.public_key) {
            Ok(_) => return Err(ValidationError::BotKeyAlreadyRegistered),
            Err(RegistryError::BotKeyNotFound) => {}
            Err(e) => return Err(e.into()),
        }

        validate_bot_signature(
            self,
            &self.identification.public_key,
            &self.identification.signature,
            ctx,
            BOT_SIGNATURE_SPECIFIER_SENDER,
        )?;

        if self.months == 0 || self.months > MAX_BOT_PREPAID_MONTHS {
            return Err(ValidationError::InvalidMonths { months: self.months });
        }

        if self.addresses.len() > MAX_ADDRESSES_PER_BOT {
            return Err(crate::domain::EntityError::TooManyAddresses.into());
        }
        if self.names.len() > MAX_NAMES_PER_BOT {
            return Err(crate::domain::EntityError::TooManyNames.into());
        }
        if self.addresses.is_empty() && self.names.is_empty() {
            return Err(ValidationError::EmptyRegistration);
        }
        if let Some(address) = find_duplicate(&self.addresses) {
            return Err(ValidationError::DuplicateAddress { address });
        }
        if let Some(name) = find_duplicate(&self.names) {
            return Err(ValidationError::DuplicateName { name });
        }

        check_names_available(registry, &self.names)?;
        check_miner_fee(self.transaction_fee, constants.minimum_miner_fee)
    }
}

impl SignatureHasher for BotRegistrationTransaction {
    fn signature_hash(&self, extra_objects: &[u8]) -> [u8; 32] {
        let mut enc = signature_encoder(
            TRANSACTION_VERSION_BOT_REGISTRATION,
            &SPECIFIER_BOT_REGISTRATION_TRANSACTION,
            extra_objects,
        );
        enc.put(&self.addresses).put(&self.names).put_u8(self.months);
        put_parent_ids(&mut enc, &self.coin_inputs);
        enc.put(&self.transaction_fee)
            .put(&self.refund)
            .put(&self.identification.public_key);
        finish_digest(enc)
    }
}

/// `addrCount | nameCount << 4`, then the addresses and the names.
pub(crate) fn encode_addresses_and_names(enc: &mut Encoder, addresses: &[NetworkAddress], names: &[BotName]) {
    enc.put_u8(addresses.len() as u8 & 15 | (names.len() as u8 & 15) << 4);
    for address in addresses {
        enc.put(address);
    }
    for name in names {
        enc.put(name);
    }
}

pub(crate) fn decode_addresses_and_names(
    dec: &mut Decoder<'_>,
) -> Result<(Vec<NetworkAddress>, Vec<BotName>), CodecError> {
    let counts = dec.get_u8()?;
    let (address_count, name_count) = ((counts & 15) as usize, (counts >> 4) as usize);
    check_count("bot addresses", address_count, MAX_ADDRESSES_PER_BOT)?;
    check_count("bot names", name_count, MAX_NAMES_PER_BOT)?;
    Ok((decode_counted(dec, address_count)?, decode_counted(dec, name_count)?))
}

impl Encode for BotRegistrationTransaction {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.months_and_flags());
        encode_addresses_and_names(enc, &self.addresses, &self.names);
        enc.put(&self.transaction_fee).put(&self.coin_inputs);
        if let Some(refund) = &self.refund {
            enc.put(refund);
        }
        enc.put(&self.identification);
    }
}

impl Decode for BotRegistrationTransaction {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let maf: MonthsAndFlags = dec.get()?;
        let (addresses, names) = decode_addresses_and_names(dec)?;
        let transaction_fee = dec.get()?;
        let coin_inputs = dec.get()?;
        let refund = if maf.has_refund { Some(dec.get()?) } else { None };
        Ok(Self {
            addresses,
            names,
            months: maf.months,
            transaction_fee,
            coin_inputs,
            refund,
            identification: dec.get()?,
        })
    }
}
