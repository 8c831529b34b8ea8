//! # Compact Timestamp
//!
//! Unix seconds truncated to the minute and stored as a 24-bit tick count
//! since [`COMPACT_TIMESTAMP_NULLPOINT`]. Three bytes cover roughly 31 years.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shared_types::{CodecError, Decode, Decoder, Encode, Encoder, Timestamp};

/// Time at which tick zero starts (~January 2018).
pub const COMPACT_TIMESTAMP_NULLPOINT: u64 = 1_515_000_000;

/// Resolution of a compact timestamp in seconds.
pub const COMPACT_TIMESTAMP_ACCURACY: u64 = 60;

const MAX_TICKS: u64 = (1 << 24) - 1;

/// Latest moment three bytes of ticks can hold.
pub const COMPACT_TIMESTAMP_MAX: u64 =
    COMPACT_TIMESTAMP_NULLPOINT + MAX_TICKS * COMPACT_TIMESTAMP_ACCURACY;

/// Minute-precision timestamp with a 3 byte binary form.
///
/// Always on a tick boundary within `[NULLPOINT, MAX]`, so every value
/// survives its binary form unchanged.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompactTimestamp(u64);

impl CompactTimestamp {
    /// Truncate a full-precision timestamp toward the previous tick boundary,
    /// clamped to the representable range.
    pub fn from_timestamp(ts: Timestamp) -> Self {
        let ts = ts.clamp(COMPACT_TIMESTAMP_NULLPOINT, COMPACT_TIMESTAMP_MAX);
        Self(ts - (ts - COMPACT_TIMESTAMP_NULLPOINT) % COMPACT_TIMESTAMP_ACCURACY)
    }

    pub fn from_ticks(ticks: u32) -> Self {
        let ticks = u64::from(ticks).min(MAX_TICKS);
        Self(ticks * COMPACT_TIMESTAMP_ACCURACY + COMPACT_TIMESTAMP_NULLPOINT)
    }

    pub fn ticks(&self) -> u32 {
        ((self.0 - COMPACT_TIMESTAMP_NULLPOINT) / COMPACT_TIMESTAMP_ACCURACY) as u32
    }

    pub fn timestamp(&self) -> Timestamp {
        self.0
    }

    pub fn saturating_add_secs(self, secs: u64) -> Self {
        Self::from_timestamp(self.0.saturating_add(secs))
    }

    pub fn saturating_sub_secs(self, secs: u64) -> Self {
        Self::from_timestamp(self.0.saturating_sub(secs))
    }
}

/// The nullpoint, tick zero.
impl Default for CompactTimestamp {
    fn default() -> Self {
        Self(COMPACT_TIMESTAMP_NULLPOINT)
    }
}

impl fmt::Display for CompactTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CompactTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactTimestamp({})", self.0)
    }
}

impl Encode for CompactTimestamp {
    fn encode(&self, enc: &mut Encoder) {
        let ticks = self.ticks().to_le_bytes();
        enc.put_raw(&ticks[..3]);
    }
}

impl Decode for CompactTimestamp {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let raw: [u8; 3] = dec.get_array()?;
        Ok(Self::from_ticks(u32::from_le_bytes([raw[0], raw[1], raw[2], 0])))
    }
}

/// JSON form is the unix timestamp in seconds.
impl Serialize for CompactTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for CompactTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self::from_timestamp)
    }
}
