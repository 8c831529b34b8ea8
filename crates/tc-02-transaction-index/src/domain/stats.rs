//! Persisted progress of the index.

use shared_types::{
    BlockHeight, CodecError, ConsensusChangeId, Decode, Decoder, Encode, Encoder, Timestamp,
};

/// Where the index stands in the consensus change stream.
///
/// Written in the same batch as every consensus change, so a restart
/// resumes from `cursor` without reprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStats {
    /// Id of the last processed consensus change.
    pub cursor: ConsensusChangeId,
    /// Height of the last applied block.
    pub height: BlockHeight,
    /// Timestamp of the last applied block; name expiry is judged against it.
    pub chain_time: Timestamp,
    pub synced: bool,
}

impl IndexStats {
    /// Decode stats written before chain time was tracked.
    pub fn decode_without_chain_time(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut dec = Decoder::new(bytes);
        let stats = Self {
            cursor: dec.get()?,
            height: dec.get_u64()?,
            chain_time: 0,
            synced: dec.get_bool()?,
        };
        dec.finish()?;
        Ok(stats)
    }
}

impl Encode for IndexStats {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.cursor)
            .put_u64(self.height)
            .put_u64(self.chain_time)
            .put_bool(self.synced);
    }
}

impl Decode for IndexStats {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            cursor: dec.get()?,
            height: dec.get_u64()?,
            chain_time: dec.get_u64()?,
            synced: dec.get_bool()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_layout() {
        let mut enc = Encoder::new();
        enc.put(&ConsensusChangeId([9; 32])).put_u64(77).put_bool(true);
        let stats = IndexStats::decode_without_chain_time(enc.as_bytes()).unwrap();
        assert_eq!(stats.height, 77);
        assert_eq!(stats.chain_time, 0);
        assert!(stats.synced);

        // the current layout is not mistaken for the legacy one
        let current = IndexStats {
            chain_time: 1_600_000_000,
            ..stats
        };
        assert!(IndexStats::decode_without_chain_time(&current.to_bytes()).is_err());
    }
}
