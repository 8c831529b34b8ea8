//! # Generic Transaction
//!
//! The shape every transaction has on the wire, regardless of its version:
//! coin inputs, coin outputs, miner fees, arbitrary data and an opaque
//! extension owned by the version's controller.

use serde::{Deserialize, Serialize};

use crate::codec::{hash_object, Decode, Decoder, Encode, Encoder};
use crate::conditions::{UnlockCondition, UnlockFulfillment};
use crate::errors::CodecError;
use crate::primitives::{hex_bytes, BlockHeight, CoinOutputId, Currency, Specifier, Timestamp, TransactionId};

const COIN_OUTPUT_ID_SPECIFIER: Specifier = Specifier::new(b"coin output");

/// Spends a previously created coin output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinInput {
    #[serde(rename = "parentid")]
    pub parent_id: CoinOutputId,
    pub fulfillment: UnlockFulfillment,
}

/// Value locked behind a condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinOutput {
    pub value: Currency,
    pub condition: UnlockCondition,
}

/// Version-agnostic transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u8,
    #[serde(rename = "coininputs", default)]
    pub coin_inputs: Vec<CoinInput>,
    #[serde(rename = "coinoutputs", default)]
    pub coin_outputs: Vec<CoinOutput>,
    #[serde(rename = "minerfees", default)]
    pub miner_fees: Vec<Currency>,
    #[serde(rename = "arbitrarydata", with = "hex_bytes", default)]
    pub arbitrary_data: Vec<u8>,
    #[serde(with = "hex_bytes", default)]
    pub extension: Vec<u8>,
}

impl Transaction {
    pub fn id(&self) -> TransactionId {
        TransactionId(hash_object(self))
    }

    /// Id of the coin output at `index`.
    pub fn coin_output_id(&self, index: u64) -> CoinOutputId {
        let mut enc = Encoder::new();
        enc.put(&COIN_OUTPUT_ID_SPECIFIER)
            .put(&self.id())
            .put_u64(index);
        CoinOutputId(shared_crypto::hash_bytes(enc.as_bytes()))
    }

    /// Encoded size, checked against the block size limit.
    pub fn encoded_len(&self) -> usize {
        self.to_bytes().len()
    }
}

impl Encode for CoinInput {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.parent_id).put(&self.fulfillment);
    }
}

impl Decode for CoinInput {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            parent_id: dec.get()?,
            fulfillment: dec.get()?,
        })
    }
}

impl Encode for CoinOutput {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.value).put(&self.condition);
    }
}

impl Decode for CoinOutput {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            value: dec.get()?,
            condition: dec.get()?,
        })
    }
}

impl Encode for Transaction {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u8(self.version)
            .put(&self.coin_inputs)
            .put(&self.coin_outputs)
            .put(&self.miner_fees)
            .put_prefixed(&self.arbitrary_data)
            .put_prefixed(&self.extension);
    }
}

impl Decode for Transaction {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            version: dec.get_u8()?,
            coin_inputs: dec.get()?,
            coin_outputs: dec.get()?,
            miner_fees: dec.get()?,
            arbitrary_data: dec.get_prefixed()?,
            extension: dec.get_prefixed()?,
        })
    }
}

// =============================================================================
// VALIDATION INPUTS
// =============================================================================

/// Chain position a transaction is validated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    pub block_height: BlockHeight,
    pub block_time: Timestamp,
    /// Height from which multi-signature conditions are standard.
    pub multisig_minimum_height: BlockHeight,
}

impl ValidationContext {
    pub fn new(block_height: BlockHeight, block_time: Timestamp) -> Self {
        Self {
            block_height,
            block_time,
            multisig_minimum_height: 0,
        }
    }

    pub fn with_multisig_minimum_height(mut self, height: BlockHeight) -> Self {
        self.multisig_minimum_height = height;
        self
    }
}

/// Network-wide limits every transaction is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionValidationConstants {
    pub block_size_limit: usize,
    pub arbitrary_data_size_limit: usize,
    pub minimum_miner_fee: Currency,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction {
            version: 1,
            coin_inputs: vec![CoinInput {
                parent_id: CoinOutputId([1; 32]),
                fulfillment: UnlockFulfillment::Nil,
            }],
            coin_outputs: vec![CoinOutput {
                value: Currency::new(10),
                condition: UnlockCondition::Nil,
            }],
            miner_fees: vec![Currency::new(1)],
            arbitrary_data: b"hello".to_vec(),
            extension: vec![],
        }
    }

    #[test]
    fn test_id_changes_with_content() {
        let a = sample();
        let mut b = sample();
        b.arbitrary_data = b"world".to_vec();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), sample().id());
    }

    #[test]
    fn test_coin_output_ids_distinct() {
        let tx = sample();
        assert_ne!(tx.coin_output_id(0), tx.coin_output_id(1));
    }

    #[test]
    fn test_binary_and_json() {
        let tx = sample();
        assert_eq!(Transaction::from_bytes(&tx.to_bytes()).unwrap(), tx);
        let json = serde_json::to_string(&tx).unwrap();
        assert!(json.contains("\"arbitrarydata\":\"68656c6c6f\""));
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }
}
