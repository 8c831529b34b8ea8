//! # Canonical Binary Codec
//!
//! The compact encoding every object is hashed, signed and stored with.
//!
//! | Value | Encoding |
//! |-------|----------|
//! | `u8`, `bool` | one byte (`bool` must be 0 or 1) |
//! | `u16`, `u32`, `u64` | fixed width, little endian |
//! | `[u8; N]` | raw bytes |
//! | `Vec<T>` | LEB128 length, then each element |
//! | `Option<T>` | presence byte, then the value |
//!
//! Types with tighter layouts (bit-packed counts, 24-bit timestamps) write
//! their own fields with the primitive `put_*`/`get_*` calls.

use crate::errors::CodecError;

/// Upper bound for any single length prefix.
pub const MAX_SLICE_LEN: usize = 1 << 24;

// =============================================================================
// ENCODER
// =============================================================================

/// Append-only byte sink.
#[derive(Debug, Default, Clone)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn put_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn put_bool(&mut self, v: bool) -> &mut Self {
        self.put_u8(u8::from(v))
    }

    pub fn put_u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Append bytes without any length information.
    pub fn put_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Append a LEB128 length.
    pub fn put_len(&mut self, len: usize) -> &mut Self {
        let mut v = len as u64;
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                self.buf.push(byte);
                return self;
            }
            self.buf.push(byte | 0x80);
        }
    }

    /// Append a length-prefixed byte slice.
    pub fn put_prefixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.put_len(bytes.len()).put_raw(bytes)
    }

    /// Append any encodable value.
    pub fn put<T: Encode + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.encode(self);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

// =============================================================================
// DECODER
// =============================================================================

/// Cursor over an encoded byte slice.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Borrow the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if n > self.remaining() {
            return Err(CodecError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn get_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn get_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_bool(&mut self) -> Result<bool, CodecError> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::invalid("bool", format!("byte {}", other))),
        }
    }

    pub fn get_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.get_array()?))
    }

    pub fn get_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.get_array()?))
    }

    pub fn get_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.get_array()?))
    }

    /// Read a LEB128 length, rejecting values larger than the bytes left.
    ///
    /// Every element of a slice takes at least one byte, so a length above
    /// the remaining input can only come from corrupt data.
    pub fn get_len(&mut self) -> Result<usize, CodecError> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.get_u8()?;
            if shift >= 63 && byte > 1 {
                return Err(CodecError::invalid("length prefix", "varint overflow"));
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        let len = usize::try_from(value).map_err(|_| CodecError::InvalidLength {
            what: "length prefix",
            length: usize::MAX,
        })?;
        if len > MAX_SLICE_LEN || len > self.remaining() {
            return Err(CodecError::InvalidLength {
                what: "length prefix",
                length: len,
            });
        }
        Ok(len)
    }

    /// Read a length-prefixed byte slice.
    pub fn get_prefixed(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.get_len()?;
        Ok(self.take(len)?.to_vec())
    }

    /// Decode any decodable value.
    pub fn get<T: Decode>(&mut self) -> Result<T, CodecError> {
        T::decode(self)
    }

    /// Fail unless every byte was consumed.
    pub fn finish(self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(CodecError::TrailingBytes { count }),
        }
    }
}

// =============================================================================
// TRAITS
// =============================================================================

/// A value with a canonical binary form.
pub trait Encode {
    fn encode(&self, enc: &mut Encoder);

    fn to_bytes(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        self.encode(&mut enc);
        enc.into_bytes()
    }
}

/// Inverse of [`Encode`].
pub trait Decode: Sized {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError>;

    /// Decode a complete value, rejecting trailing bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut dec = Decoder::new(bytes);
        let value = Self::decode(&mut dec)?;
        dec.finish()?;
        Ok(value)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, enc: &mut Encoder) {
        (**self).encode(enc)
    }
}

macro_rules! impl_codec_int {
    ($($ty:ty => $put:ident, $get:ident);* $(;)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self, enc: &mut Encoder) {
                    enc.$put(*self);
                }
            }

            impl Decode for $ty {
                fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
                    dec.$get()
                }
            }
        )*
    };
}

impl_codec_int! {
    u8 => put_u8, get_u8;
    u16 => put_u16, get_u16;
    u32 => put_u32, get_u32;
    u64 => put_u64, get_u64;
    bool => put_bool, get_bool;
}

impl<const N: usize> Encode for [u8; N] {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_raw(self);
    }
}

impl<const N: usize> Decode for [u8; N] {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        dec.get_array()
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_len(self.len());
        for item in self {
            item.encode(enc);
        }
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, enc: &mut Encoder) {
        self.as_slice().encode(enc)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let len = dec.get_len()?;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(T::decode(dec)?);
        }
        Ok(out)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, enc: &mut Encoder) {
        match self {
            Some(value) => {
                enc.put_bool(true).put(value);
            }
            None => {
                enc.put_bool(false);
            }
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        if dec.get_bool()? {
            Ok(Some(T::decode(dec)?))
        } else {
            Ok(None)
        }
    }
}

/// Decode exactly `count` elements, used by the bit-packed layouts where
/// the count lives in a shared flag byte instead of a length prefix.
pub fn decode_counted<T: Decode>(dec: &mut Decoder<'_>, count: usize) -> Result<Vec<T>, CodecError> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(T::decode(dec)?);
    }
    Ok(out)
}

/// BLAKE3 over the canonical encoding of `value`.
pub fn hash_object<T: Encode + ?Sized>(value: &T) -> [u8; 32] {
    let mut enc = Encoder::new();
    value.encode(&mut enc);
    shared_crypto::hash_bytes(enc.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_little_endian() {
        let mut enc = Encoder::new();
        enc.put_u16(0x0102).put_u32(0x0304_0506).put_u64(7);
        assert_eq!(
            enc.as_bytes(),
            &[0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 7, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_varint_length_boundaries() {
        let mut enc = Encoder::new();
        enc.put_len(127).put_len(128).put_len(300);
        assert_eq!(enc.as_bytes(), &[0x7f, 0x80, 0x01, 0xac, 0x02]);
    }

    #[test]
    fn test_length_longer_than_input_rejected() {
        let mut dec = Decoder::new(&[5, 1, 2]);
        assert!(matches!(
            dec.get_len(),
            Err(CodecError::InvalidLength { length: 5, .. })
        ));
    }

    #[test]
    fn test_truncated_input() {
        let mut dec = Decoder::new(&[1, 2, 3]);
        assert_eq!(
            dec.get_u32(),
            Err(CodecError::UnexpectedEof {
                needed: 4,
                remaining: 3
            })
        );
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        assert_eq!(
            u8::from_bytes(&[1, 2]),
            Err(CodecError::TrailingBytes { count: 1 })
        );
    }

    #[test]
    fn test_bool_must_be_zero_or_one() {
        assert!(bool::from_bytes(&[2]).is_err());
        assert_eq!(bool::from_bytes(&[1]), Ok(true));
    }

    #[test]
    fn test_vec_and_option() {
        let value: (Vec<u32>, Option<u8>) = (vec![1, 2], Some(9));
        let mut enc = Encoder::new();
        enc.put(&value.0).put(&value.1);
        let bytes = enc.into_bytes();
        assert_eq!(bytes, vec![2, 1, 0, 0, 0, 2, 0, 0, 0, 1, 9]);

        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.get::<Vec<u32>>().unwrap(), vec![1, 2]);
        assert_eq!(dec.get::<Option<u8>>().unwrap(), Some(9));
        dec.finish().unwrap();
    }
}
