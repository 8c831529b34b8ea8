//! # Error Types
//!
//! Errors shared by every crate that encodes objects or checks fulfillments.

use thiserror::Error;

/// Errors raised by the canonical binary codec and the text parsers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The input ended before the value was complete.
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// Bytes were left over after decoding a complete value.
    #[error("{count} trailing bytes after decoded value")]
    TrailingBytes { count: usize },

    /// A length prefix or fixed-size field has the wrong size.
    #[error("invalid length for {what}: {length}")]
    InvalidLength { what: &'static str, length: usize },

    /// A field decoded to a value outside its domain.
    #[error("invalid {what}: {reason}")]
    InvalidValue { what: &'static str, reason: String },

    /// A bounded collection declares more elements than allowed.
    #[error("too many {what}: {count} exceeds the maximum of {max}")]
    CountOverflow {
        what: &'static str,
        count: usize,
        max: usize,
    },
}

impl CodecError {
    /// Shorthand for [`CodecError::InvalidValue`].
    pub fn invalid(what: &'static str, reason: impl Into<String>) -> Self {
        CodecError::InvalidValue {
            what,
            reason: reason.into(),
        }
    }
}

/// Errors raised while checking unlock conditions against fulfillments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    /// The condition or fulfillment is not accepted by this network.
    #[error("non-standard {what}: {reason}")]
    NotStandard { what: &'static str, reason: String },

    /// The public key of a fulfillment does not hash to the condition's unlock hash.
    #[error("unlock hash mismatch: fulfillment key does not match {expected}")]
    UnlockHashMismatch { expected: String },

    /// A signature did not verify against the signature hash.
    #[error("invalid signature: {reason}")]
    InvalidSignature { reason: String },

    /// A multi-signature fulfillment carries fewer valid signatures than required.
    #[error("not enough signatures: {required} required, {provided} provided")]
    NotEnoughSignatures { required: u64, provided: u64 },

    /// The fulfillment type cannot fulfill the condition type.
    #[error("fulfillment type {fulfillment} cannot fulfill condition type {condition}")]
    FulfillmentMismatch { condition: u8, fulfillment: u8 },

    /// The time lock has not been reached yet.
    #[error("condition is time locked until {lock_time}")]
    TimeLocked { lock_time: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_error_messages() {
        let err = CodecError::CountOverflow {
            what: "bot names",
            count: 6,
            max: 5,
        };
        assert!(err.to_string().contains("exceeds the maximum of 5"));

        let err = CodecError::invalid("bool", "byte 2");
        assert_eq!(err.to_string(), "invalid bool: byte 2");
    }

    #[test]
    fn test_condition_error_messages() {
        let err = ConditionError::NotEnoughSignatures {
            required: 2,
            provided: 1,
        };
        assert!(err.to_string().contains("2 required"));
    }
}
