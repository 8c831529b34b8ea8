//! # Shared Types Crate
//!
//! Types shared by the typed transaction protocol (`tc-01`) and the
//! transaction index (`tc-02`).
//!
//! ## Design Principles
//!
//! - **One canonical binary form**: everything that is hashed, signed or
//!   stored goes through [`codec::Encode`]; decoding rejects trailing bytes.
//! - **One text form**: `Display`/`FromStr`, mirrored by serde, so JSON
//!   interchange validates exactly like construction does.
//! - **Generic transactions**: version-specific data travels in the opaque
//!   `extension` field and is interpreted by the version's controller.

pub mod chain;
pub mod codec;
pub mod conditions;
pub mod errors;
pub mod keys;
pub mod primitives;
pub mod transaction;

pub use chain::{Block, ConsensusChange};
pub use codec::{decode_counted, hash_object, Decode, Decoder, Encode, Encoder};
pub use conditions::{
    FulfillContext, InMemoryKeyStore, KeyStore, MultiSignatureCondition,
    MultiSignatureFulfillment, PublicKeySignaturePair, SignatureHasher,
    SingleSignatureFulfillment, TimeLockCondition, UnlockCondition, UnlockFulfillment,
};
pub use errors::{CodecError, ConditionError};
pub use keys::{PublicKey, SignatureAlgorithm, UnlockHash, UnlockType};
pub use primitives::{
    hex_bytes, BlockHeight, BlockId, CoinOutputId, ConsensusChangeId, Currency, Specifier, Timestamp,
    TransactionId, U256,
};
pub use transaction::{
    CoinInput, CoinOutput, Transaction, TransactionValidationConstants, ValidationContext,
};
