//! # Unlock Conditions and Fulfillments
//!
//! A condition locks value (or minting authority); a fulfillment proves the
//! right to spend it. Fulfilling always verifies signatures over the digest
//! returned by the transaction's [`SignatureHasher`].
//!
//! | Condition | Fulfilled by |
//! |-----------|--------------|
//! | Nil | any single signature |
//! | UnlockHash (public key) | single signature from the key hashing to it |
//! | MultiSignature | `min_signatures` distinct keys from its list |
//! | TimeLock | the wrapped condition, once height/time passes `lock_time` |
//!
//! Binary form of both families: type byte, then the type's payload as a
//! length-prefixed slice, so unknown payloads can be skipped as a whole.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shared_crypto::Ed25519KeyPair;

use crate::codec::{hash_object, Decode, Decoder, Encode, Encoder};
use crate::errors::{CodecError, ConditionError};
use crate::keys::{PublicKey, UnlockHash, UnlockType};
use crate::primitives::{hex_bytes, BlockHeight, Timestamp};
use crate::transaction::ValidationContext;

pub const CONDITION_TYPE_NIL: u8 = 0;
pub const CONDITION_TYPE_UNLOCK_HASH: u8 = 1;
pub const CONDITION_TYPE_TIME_LOCK: u8 = 3;
pub const CONDITION_TYPE_MULTI_SIGNATURE: u8 = 4;

pub const FULFILLMENT_TYPE_NIL: u8 = 0;
pub const FULFILLMENT_TYPE_SINGLE_SIGNATURE: u8 = 1;
pub const FULFILLMENT_TYPE_MULTI_SIGNATURE: u8 = 3;

/// Lock times below this value are block heights, above it unix timestamps.
pub const LOCKTIME_TIMESTAMP_THRESHOLD: u64 = 500_000_000;

// =============================================================================
// SIGNING SEAMS
// =============================================================================

/// Produces the digest a fulfillment signs.
///
/// Implemented by every transaction kind; `extra_objects` are already
/// encoded and are mixed in right after the kind's specifier.
pub trait SignatureHasher {
    fn signature_hash(&self, extra_objects: &[u8]) -> [u8; 32];
}

/// Everything a fulfillment needs to be checked.
pub struct FulfillContext<'a> {
    pub block_height: BlockHeight,
    pub block_time: Timestamp,
    pub extra_objects: &'a [u8],
    pub hasher: &'a dyn SignatureHasher,
}

impl FulfillContext<'_> {
    fn digest(&self) -> [u8; 32] {
        self.hasher.signature_hash(self.extra_objects)
    }
}

/// Source of signing keys, addressed by the unlock hash they unlock.
pub trait KeyStore {
    fn key_pair_for(&self, unlock_hash: &UnlockHash) -> Option<&Ed25519KeyPair>;
}

/// Keys held in memory, indexed by their public key unlock hash.
#[derive(Default)]
pub struct InMemoryKeyStore {
    keys: HashMap<UnlockHash, Ed25519KeyPair>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key pair, returning its public key.
    pub fn insert(&mut self, key_pair: Ed25519KeyPair) -> PublicKey {
        let public_key = PublicKey::ed25519(key_pair.public_key());
        self.keys
            .insert(UnlockHash::from_public_key(&public_key), key_pair);
        public_key
    }
}

impl KeyStore for InMemoryKeyStore {
    fn key_pair_for(&self, unlock_hash: &UnlockHash) -> Option<&Ed25519KeyPair> {
        self.keys.get(unlock_hash)
    }
}

// =============================================================================
// CONDITIONS
// =============================================================================

/// Spending condition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UnlockCondition {
    #[default]
    Nil,
    UnlockHash(UnlockHash),
    MultiSignature(MultiSignatureCondition),
    TimeLock(TimeLockCondition),
}

/// `min_signatures` of the listed public key unlock hashes must sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSignatureCondition {
    #[serde(rename = "unlockhashes")]
    pub unlock_hashes: Vec<UnlockHash>,
    #[serde(rename = "minimumsignaturecount")]
    pub min_signatures: u64,
}

/// Wraps a condition that only becomes fulfillable after `lock_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLockCondition {
    #[serde(rename = "locktime")]
    pub lock_time: u64,
    pub condition: Box<UnlockCondition>,
}

impl UnlockCondition {
    /// Condition locked to a single public key.
    pub fn for_public_key(public_key: &PublicKey) -> Self {
        UnlockCondition::UnlockHash(UnlockHash::from_public_key(public_key))
    }

    pub fn condition_type(&self) -> u8 {
        match self {
            UnlockCondition::Nil => CONDITION_TYPE_NIL,
            UnlockCondition::UnlockHash(_) => CONDITION_TYPE_UNLOCK_HASH,
            UnlockCondition::MultiSignature(_) => CONDITION_TYPE_MULTI_SIGNATURE,
            UnlockCondition::TimeLock(_) => CONDITION_TYPE_TIME_LOCK,
        }
    }

    /// Address of this condition. Time locks share the address of what they wrap.
    pub fn unlock_hash(&self) -> UnlockHash {
        match self {
            UnlockCondition::Nil => UnlockHash::NIL,
            UnlockCondition::UnlockHash(uh) => *uh,
            UnlockCondition::MultiSignature(ms) => {
                UnlockHash::new(UnlockType::MultiSig, hash_object(ms))
            }
            UnlockCondition::TimeLock(tl) => tl.condition.unlock_hash(),
        }
    }

    /// Check that this condition may appear in a transaction at `ctx`.
    pub fn is_standard(&self, ctx: &ValidationContext) -> Result<(), ConditionError> {
        match self {
            UnlockCondition::Nil => Ok(()),
            UnlockCondition::UnlockHash(uh) => match uh.unlock_type {
                UnlockType::PubKey | UnlockType::MultiSig => Ok(()),
                UnlockType::Nil => Err(not_standard("unlock hash condition", "nil unlock hash")),
            },
            UnlockCondition::MultiSignature(ms) => {
                if ctx.block_height < ctx.multisig_minimum_height {
                    return Err(not_standard(
                        "multi-signature condition",
                        format!(
                            "not allowed before block height {}",
                            ctx.multisig_minimum_height
                        ),
                    ));
                }
                if ms.unlock_hashes.is_empty() || ms.min_signatures == 0 {
                    return Err(not_standard(
                        "multi-signature condition",
                        "requires at least one unlock hash and one signature",
                    ));
                }
                if ms.min_signatures > ms.unlock_hashes.len() as u64 {
                    return Err(not_standard(
                        "multi-signature condition",
                        "requires more signatures than it lists unlock hashes",
                    ));
                }
                if ms
                    .unlock_hashes
                    .iter()
                    .any(|uh| uh.unlock_type != UnlockType::PubKey)
                {
                    return Err(not_standard(
                        "multi-signature condition",
                        "only public key unlock hashes may sign",
                    ));
                }
                Ok(())
            }
            UnlockCondition::TimeLock(tl) => {
                if tl.lock_time == 0 {
                    return Err(not_standard("time lock condition", "lock time is zero"));
                }
                if let UnlockCondition::TimeLock(_) = *tl.condition {
                    return Err(not_standard("time lock condition", "nested time lock"));
                }
                tl.condition.is_standard(ctx)
            }
        }
    }

    /// Check `fulfillment` against this condition.
    pub fn fulfill(
        &self,
        fulfillment: &UnlockFulfillment,
        ctx: &FulfillContext<'_>,
    ) -> Result<(), ConditionError> {
        match (self, fulfillment) {
            (UnlockCondition::Nil, UnlockFulfillment::SingleSignature(ss)) => ss.verify(ctx),
            (UnlockCondition::UnlockHash(uh), UnlockFulfillment::SingleSignature(ss)) => {
                if uh.unlock_type != UnlockType::PubKey
                    || UnlockHash::from_public_key(&ss.public_key) != *uh
                {
                    return Err(ConditionError::UnlockHashMismatch {
                        expected: uh.to_string(),
                    });
                }
                ss.verify(ctx)
            }
            (UnlockCondition::MultiSignature(ms), UnlockFulfillment::MultiSignature(mf)) => {
                ms.fulfill(mf, ctx)
            }
            (UnlockCondition::TimeLock(tl), _) => {
                let reached = if tl.lock_time < LOCKTIME_TIMESTAMP_THRESHOLD {
                    ctx.block_height >= tl.lock_time
                } else {
                    ctx.block_time >= tl.lock_time
                };
                if !reached {
                    return Err(ConditionError::TimeLocked {
                        lock_time: tl.lock_time,
                    });
                }
                tl.condition.fulfill(fulfillment, ctx)
            }
            _ => Err(ConditionError::FulfillmentMismatch {
                condition: self.condition_type(),
                fulfillment: fulfillment.fulfillment_type(),
            }),
        }
    }
}

impl MultiSignatureCondition {
    fn fulfill(
        &self,
        fulfillment: &MultiSignatureFulfillment,
        ctx: &FulfillContext<'_>,
    ) -> Result<(), ConditionError> {
        let digest = ctx.digest();
        let mut used: Vec<UnlockHash> = Vec::with_capacity(fulfillment.pairs.len());
        for pair in &fulfillment.pairs {
            let uh = UnlockHash::from_public_key(&pair.public_key);
            if !self.unlock_hashes.contains(&uh) || used.contains(&uh) {
                return Err(ConditionError::UnlockHashMismatch {
                    expected: format!("one unused key of {}", self_address(self)),
                });
            }
            pair.public_key.verify(&digest, &pair.signature)?;
            used.push(uh);
        }
        let provided = used.len() as u64;
        if provided < self.min_signatures {
            return Err(ConditionError::NotEnoughSignatures {
                required: self.min_signatures,
                provided,
            });
        }
        Ok(())
    }
}

fn self_address(ms: &MultiSignatureCondition) -> UnlockHash {
    UnlockHash::new(UnlockType::MultiSig, hash_object(ms))
}

fn not_standard(what: &'static str, reason: impl Into<String>) -> ConditionError {
    ConditionError::NotStandard {
        what,
        reason: reason.into(),
    }
}

impl Encode for MultiSignatureCondition {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u64(self.min_signatures).put(&self.unlock_hashes);
    }
}

impl Decode for MultiSignatureCondition {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let min_signatures = dec.get_u64()?;
        let unlock_hashes = dec.get()?;
        Ok(Self {
            unlock_hashes,
            min_signatures,
        })
    }
}

impl Encode for UnlockCondition {
    fn encode(&self, enc: &mut Encoder) {
        let mut payload = Encoder::new();
        match self {
            UnlockCondition::Nil => {}
            UnlockCondition::UnlockHash(uh) => {
                payload.put(uh);
            }
            UnlockCondition::MultiSignature(ms) => {
                payload.put(ms);
            }
            UnlockCondition::TimeLock(tl) => {
                payload.put_u64(tl.lock_time).put(tl.condition.as_ref());
            }
        }
        enc.put_u8(self.condition_type())
            .put_prefixed(payload.as_bytes());
    }
}

impl Decode for UnlockCondition {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let kind = dec.get_u8()?;
        let payload = dec.get_prefixed()?;
        let mut inner = Decoder::new(&payload);
        let condition = match kind {
            CONDITION_TYPE_NIL => UnlockCondition::Nil,
            CONDITION_TYPE_UNLOCK_HASH => UnlockCondition::UnlockHash(inner.get()?),
            CONDITION_TYPE_MULTI_SIGNATURE => UnlockCondition::MultiSignature(inner.get()?),
            CONDITION_TYPE_TIME_LOCK => {
                let lock_time = inner.get_u64()?;
                let condition = Box::new(inner.get()?);
                UnlockCondition::TimeLock(TimeLockCondition {
                    lock_time,
                    condition,
                })
            }
            other => {
                return Err(CodecError::invalid(
                    "unlock condition",
                    format!("unknown condition type {}", other),
                ))
            }
        };
        inner.finish()?;
        Ok(condition)
    }
}

// =============================================================================
// FULFILLMENTS
// =============================================================================

/// Proof that satisfies an [`UnlockCondition`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UnlockFulfillment {
    #[default]
    Nil,
    SingleSignature(SingleSignatureFulfillment),
    MultiSignature(MultiSignatureFulfillment),
}

/// One key and its signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleSignatureFulfillment {
    #[serde(rename = "publickey")]
    pub public_key: PublicKey,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

/// A key/signature pair, also used for 3bot identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeySignaturePair {
    #[serde(rename = "publickey")]
    pub public_key: PublicKey,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

/// Signatures from several keys of a multi-signature condition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MultiSignatureFulfillment {
    pub pairs: Vec<PublicKeySignaturePair>,
}

impl SingleSignatureFulfillment {
    /// Unsigned fulfillment for `public_key`.
    pub fn unsigned(public_key: PublicKey) -> Self {
        Self {
            public_key,
            signature: Vec::new(),
        }
    }

    fn verify(&self, ctx: &FulfillContext<'_>) -> Result<(), ConditionError> {
        self.public_key.verify(&ctx.digest(), &self.signature)
    }
}

impl UnlockFulfillment {
    pub fn fulfillment_type(&self) -> u8 {
        match self {
            UnlockFulfillment::Nil => FULFILLMENT_TYPE_NIL,
            UnlockFulfillment::SingleSignature(_) => FULFILLMENT_TYPE_SINGLE_SIGNATURE,
            UnlockFulfillment::MultiSignature(_) => FULFILLMENT_TYPE_MULTI_SIGNATURE,
        }
    }

    pub fn is_standard(&self) -> Result<(), ConditionError> {
        match self {
            UnlockFulfillment::Nil => Err(not_standard("fulfillment", "nil fulfillment")),
            UnlockFulfillment::SingleSignature(ss) => {
                if ss.signature.is_empty() {
                    return Err(not_standard("single signature fulfillment", "unsigned"));
                }
                Ok(())
            }
            UnlockFulfillment::MultiSignature(mf) => {
                if mf.pairs.is_empty() {
                    return Err(not_standard("multi-signature fulfillment", "no signatures"));
                }
                Ok(())
            }
        }
    }

    /// Sign for `condition` with whatever keys `keys` holds.
    ///
    /// Returns whether at least one signature was added. Multi-signature
    /// fulfillments accumulate pairs across calls.
    pub fn sign(
        &mut self,
        condition: &UnlockCondition,
        keys: &dyn KeyStore,
        extra_objects: &[u8],
        hasher: &dyn SignatureHasher,
    ) -> Result<bool, ConditionError> {
        match condition {
            UnlockCondition::TimeLock(tl) => self.sign(&tl.condition, keys, extra_objects, hasher),
            UnlockCondition::UnlockHash(uh) => {
                let Some(kp) = keys.key_pair_for(uh) else {
                    return Ok(false);
                };
                let digest = hasher.signature_hash(extra_objects);
                *self = UnlockFulfillment::SingleSignature(SingleSignatureFulfillment {
                    public_key: PublicKey::ed25519(kp.public_key()),
                    signature: kp.sign(&digest).to_vec(),
                });
                Ok(true)
            }
            UnlockCondition::Nil => {
                let UnlockFulfillment::SingleSignature(ss) = self else {
                    return Err(ConditionError::FulfillmentMismatch {
                        condition: CONDITION_TYPE_NIL,
                        fulfillment: self.fulfillment_type(),
                    });
                };
                let Some(kp) = keys.key_pair_for(&UnlockHash::from_public_key(&ss.public_key))
                else {
                    return Ok(false);
                };
                ss.signature = kp.sign(&hasher.signature_hash(extra_objects)).to_vec();
                Ok(true)
            }
            UnlockCondition::MultiSignature(ms) => {
                let mut pairs = match std::mem::take(self) {
                    UnlockFulfillment::MultiSignature(mf) => mf.pairs,
                    _ => Vec::new(),
                };
                let digest = hasher.signature_hash(extra_objects);
                let mut signed = false;
                for uh in &ms.unlock_hashes {
                    let Some(kp) = keys.key_pair_for(uh) else {
                        continue;
                    };
                    let public_key = PublicKey::ed25519(kp.public_key());
                    if pairs.iter().any(|p| p.public_key == public_key) {
                        continue;
                    }
                    pairs.push(PublicKeySignaturePair {
                        public_key,
                        signature: kp.sign(&digest).to_vec(),
                    });
                    signed = true;
                }
                *self = UnlockFulfillment::MultiSignature(MultiSignatureFulfillment { pairs });
                Ok(signed)
            }
        }
    }
}

impl Encode for PublicKeySignaturePair {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.public_key).put_prefixed(&self.signature);
    }
}

impl Decode for PublicKeySignaturePair {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            public_key: dec.get()?,
            signature: dec.get_prefixed()?,
        })
    }
}

impl Encode for UnlockFulfillment {
    fn encode(&self, enc: &mut Encoder) {
        let mut payload = Encoder::new();
        match self {
            UnlockFulfillment::Nil => {}
            UnlockFulfillment::SingleSignature(ss) => {
                payload
                    .put(&ss.public_key)
                    .put_prefixed(&ss.signature);
            }
            UnlockFulfillment::MultiSignature(mf) => {
                payload.put(&mf.pairs);
            }
        }
        enc.put_u8(self.fulfillment_type())
            .put_prefixed(payload.as_bytes());
    }
}

impl Decode for UnlockFulfillment {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let kind = dec.get_u8()?;
        let payload = dec.get_prefixed()?;
        let mut inner = Decoder::new(&payload);
        let fulfillment = match kind {
            FULFILLMENT_TYPE_NIL => UnlockFulfillment::Nil,
            FULFILLMENT_TYPE_SINGLE_SIGNATURE => {
                UnlockFulfillment::SingleSignature(SingleSignatureFulfillment {
                    public_key: inner.get()?,
                    signature: inner.get_prefixed()?,
                })
            }
            FULFILLMENT_TYPE_MULTI_SIGNATURE => {
                UnlockFulfillment::MultiSignature(MultiSignatureFulfillment {
                    pairs: inner.get()?,
                })
            }
            other => {
                return Err(CodecError::invalid(
                    "unlock fulfillment",
                    format!("unknown fulfillment type {}", other),
                ))
            }
        };
        inner.finish()?;
        Ok(fulfillment)
    }
}

// =============================================================================
// TEXT FORM
// =============================================================================

/// `{"type": n, "data": {...}}`, shared by conditions and fulfillments.
#[derive(Serialize, Deserialize)]
struct TypedJson {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize)]
struct UnlockHashJson {
    unlockhash: UnlockHash,
}

fn to_data<T: Serialize>(value: &T) -> Result<Option<serde_json::Value>, serde_json::Error> {
    serde_json::to_value(value).map(Some)
}

fn from_data<T: serde::de::DeserializeOwned>(data: Option<serde_json::Value>) -> Result<T, String> {
    let data = data.ok_or_else(|| "missing data field".to_string())?;
    serde_json::from_value(data).map_err(|e| e.to_string())
}

impl Serialize for UnlockCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data = match self {
            UnlockCondition::Nil => Ok(None),
            UnlockCondition::UnlockHash(uh) => to_data(&UnlockHashJson { unlockhash: *uh }),
            UnlockCondition::MultiSignature(ms) => to_data(ms),
            UnlockCondition::TimeLock(tl) => to_data(tl),
        }
        .map_err(serde::ser::Error::custom)?;
        TypedJson {
            kind: self.condition_type(),
            data,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UnlockCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = TypedJson::deserialize(deserializer)?;
        let condition = match raw.kind {
            CONDITION_TYPE_NIL => Ok(UnlockCondition::Nil),
            CONDITION_TYPE_UNLOCK_HASH => from_data::<UnlockHashJson>(raw.data)
                .map(|data| UnlockCondition::UnlockHash(data.unlockhash)),
            CONDITION_TYPE_MULTI_SIGNATURE => {
                from_data(raw.data).map(UnlockCondition::MultiSignature)
            }
            CONDITION_TYPE_TIME_LOCK => from_data(raw.data).map(UnlockCondition::TimeLock),
            other => Err(format!("unknown condition type {}", other)),
        };
        condition.map_err(serde::de::Error::custom)
    }
}

impl Serialize for UnlockFulfillment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data = match self {
            UnlockFulfillment::Nil => Ok(None),
            UnlockFulfillment::SingleSignature(ss) => to_data(ss),
            UnlockFulfillment::MultiSignature(mf) => to_data(mf),
        }
        .map_err(serde::ser::Error::custom)?;
        TypedJson {
            kind: self.fulfillment_type(),
            data,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UnlockFulfillment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = TypedJson::deserialize(deserializer)?;
        let fulfillment = match raw.kind {
            FULFILLMENT_TYPE_NIL => Ok(UnlockFulfillment::Nil),
            FULFILLMENT_TYPE_SINGLE_SIGNATURE => {
                from_data(raw.data).map(UnlockFulfillment::SingleSignature)
            }
            FULFILLMENT_TYPE_MULTI_SIGNATURE => {
                from_data(raw.data).map(UnlockFulfillment::MultiSignature)
            }
            other => Err(format!("unknown fulfillment type {}", other)),
        };
        fulfillment.map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDigest([u8; 32]);

    impl SignatureHasher for FixedDigest {
        fn signature_hash(&self, extra_objects: &[u8]) -> [u8; 32] {
            let mut hasher = shared_crypto::ObjectHasher::new();
            hasher.update(&self.0).update(extra_objects);
            hasher.finalize()
        }
    }

    fn ctx<'a>(hasher: &'a FixedDigest, height: u64) -> FulfillContext<'a> {
        FulfillContext {
            block_height: height,
            block_time: 1_600_000_000,
            extra_objects: &[],
            hasher,
        }
    }

    fn keys(n: u8) -> (InMemoryKeyStore, Vec<PublicKey>) {
        let mut store = InMemoryKeyStore::new();
        let pks = (1..=n)
            .map(|i| store.insert(Ed25519KeyPair::from_seed([i; 32])))
            .collect();
        (store, pks)
    }

    #[test]
    fn test_single_signature_sign_and_fulfill() {
        let (store, pks) = keys(1);
        let condition = UnlockCondition::for_public_key(&pks[0]);
        let hasher = FixedDigest([9; 32]);

        let mut fulfillment = UnlockFulfillment::Nil;
        assert!(fulfillment.sign(&condition, &store, &[], &hasher).unwrap());
        assert!(condition.fulfill(&fulfillment, &ctx(&hasher, 1)).is_ok());

        let other = FixedDigest([8; 32]);
        assert!(matches!(
            condition.fulfill(&fulfillment, &ctx(&other, 1)),
            Err(ConditionError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_extra_objects_change_digest() {
        let (store, pks) = keys(1);
        let condition = UnlockCondition::for_public_key(&pks[0]);
        let hasher = FixedDigest([9; 32]);

        let mut fulfillment = UnlockFulfillment::Nil;
        fulfillment.sign(&condition, &store, b"sender", &hasher).unwrap();
        let mut receiver_ctx = ctx(&hasher, 1);
        receiver_ctx.extra_objects = b"receiver";
        assert!(condition.fulfill(&fulfillment, &receiver_ctx).is_err());
    }

    #[test]
    fn test_wrong_key_is_unlock_hash_mismatch() {
        let (store, pks) = keys(2);
        let hasher = FixedDigest([1; 32]);
        let mut fulfillment = UnlockFulfillment::Nil;
        fulfillment
            .sign(&UnlockCondition::for_public_key(&pks[0]), &store, &[], &hasher)
            .unwrap();
        let result = UnlockCondition::for_public_key(&pks[1]).fulfill(&fulfillment, &ctx(&hasher, 1));
        assert!(matches!(result, Err(ConditionError::UnlockHashMismatch { .. })));
    }

    #[test]
    fn test_multisig_threshold() {
        let (store, pks) = keys(3);
        let condition = UnlockCondition::MultiSignature(MultiSignatureCondition {
            unlock_hashes: pks.iter().map(UnlockHash::from_public_key).collect(),
            min_signatures: 2,
        });
        let hasher = FixedDigest([2; 32]);

        let mut partial = InMemoryKeyStore::new();
        partial.insert(Ed25519KeyPair::from_seed([1; 32]));
        let mut fulfillment = UnlockFulfillment::Nil;
        fulfillment.sign(&condition, &partial, &[], &hasher).unwrap();
        assert_eq!(
            condition.fulfill(&fulfillment, &ctx(&hasher, 1)),
            Err(ConditionError::NotEnoughSignatures {
                required: 2,
                provided: 1
            })
        );

        fulfillment.sign(&condition, &store, &[], &hasher).unwrap();
        assert!(condition.fulfill(&fulfillment, &ctx(&hasher, 1)).is_ok());
    }

    #[test]
    fn test_time_lock_by_height() {
        let (store, pks) = keys(1);
        let condition = UnlockCondition::TimeLock(TimeLockCondition {
            lock_time: 100,
            condition: Box::new(UnlockCondition::for_public_key(&pks[0])),
        });
        let hasher = FixedDigest([3; 32]);
        let mut fulfillment = UnlockFulfillment::Nil;
        fulfillment.sign(&condition, &store, &[], &hasher).unwrap();

        assert_eq!(
            condition.fulfill(&fulfillment, &ctx(&hasher, 99)),
            Err(ConditionError::TimeLocked { lock_time: 100 })
        );
        assert!(condition.fulfill(&fulfillment, &ctx(&hasher, 100)).is_ok());
    }

    #[test]
    fn test_multisig_height_gate() {
        let (_, pks) = keys(2);
        let condition = UnlockCondition::MultiSignature(MultiSignatureCondition {
            unlock_hashes: pks.iter().map(UnlockHash::from_public_key).collect(),
            min_signatures: 1,
        });
        let early = ValidationContext::new(41_999, 0).with_multisig_minimum_height(42_000);
        let late = ValidationContext::new(42_000, 0).with_multisig_minimum_height(42_000);
        assert!(condition.is_standard(&early).is_err());
        assert!(condition.is_standard(&late).is_ok());
    }

    #[test]
    fn test_condition_binary_and_json() {
        let (_, pks) = keys(2);
        let condition = UnlockCondition::TimeLock(TimeLockCondition {
            lock_time: 5,
            condition: Box::new(UnlockCondition::MultiSignature(MultiSignatureCondition {
                unlock_hashes: pks.iter().map(UnlockHash::from_public_key).collect(),
                min_signatures: 2,
            })),
        });
        assert_eq!(
            UnlockCondition::from_bytes(&condition.to_bytes()).unwrap(),
            condition
        );

        let json = serde_json::to_string(&condition).unwrap();
        assert!(json.contains("\"locktime\":5"));
        assert!(json.contains("\"minimumsignaturecount\":2"));
        let back: UnlockCondition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, condition);
    }

    #[test]
    fn test_unknown_condition_type_rejected() {
        assert!(UnlockCondition::from_bytes(&[9, 0]).is_err());
        assert!(serde_json::from_str::<UnlockCondition>(r#"{"type":9}"#).is_err());
    }

    #[test]
    fn test_time_lock_shares_inner_address() {
        let (_, pks) = keys(1);
        let inner = UnlockCondition::for_public_key(&pks[0]);
        let locked = UnlockCondition::TimeLock(TimeLockCondition {
            lock_time: 10,
            condition: Box::new(inner.clone()),
        });
        assert_eq!(locked.unlock_hash(), inner.unlock_hash());
    }
}
