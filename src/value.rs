// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primitive values stored in chunks.
//!
//! Integers and floats are 32 bits wide and little-endian. Strings are
//! ASCII with a single NUL terminator. Raw byte blobs are written as-is.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Write;

use crate::{Error, Result, ToU64};

/// One member of a [`Chunk`](crate::Chunk).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    /// ASCII text, written with a trailing NUL.
    Str(String),
    /// Opaque bytes, written verbatim.
    Bytes(Vec<u8>),
}

impl Value {
    /// Number of bytes this value occupies once encoded.
    pub fn encoded_len(&self) -> u64 {
        match self {
            Self::Int(_) | Self::Float(_) => 4,
            Self::Str(s) => s.len().to_u64() + 1,
            Self::Bytes(b) => b.len().to_u64(),
        }
    }

    pub fn write_to<W: Write>(&self, dst: &mut W) -> Result<()> {
        match self {
            Self::Int(v) => dst.write_i32::<LittleEndian>(*v)?,
            Self::Float(v) => dst.write_f32::<LittleEndian>(*v)?,
            Self::Str(s) => {
                dst.write_all(s.as_bytes())?;
                dst.write_u8(0)?;
            },
            Self::Bytes(b) => dst.write_all(b)?,
        }
        Ok(())
    }
}

/// Conversion into a chunk member.
///
/// Only the four member kinds are accepted. Integers must fit in 32 signed
/// bits and strings must be plain ASCII without interior NULs; anything else
/// fails with [`Error::TypeKind`]. Integers never turn into floats.
pub trait IntoValue {
    fn into_value(self) -> Result<Value>;
}

impl IntoValue for Value {
    fn into_value(self) -> Result<Value> {
        match self {
            Self::Str(s) => ascii_string(s).map(Value::Str),
            v => Ok(v),
        }
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Result<Value> {
        Ok(Value::Int(self))
    }
}

impl IntoValue for u32 {
    fn into_value(self) -> Result<Value> {
        i32::try_from(self)
            .map(Value::Int)
            .map_err(|_| Error::TypeKind("integer does not fit in 32 signed bits"))
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Result<Value> {
        i32::try_from(self)
            .map(Value::Int)
            .map_err(|_| Error::TypeKind("integer does not fit in 32 signed bits"))
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Result<Value> {
        Ok(Value::Float(self))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Result<Value> {
        let narrowed = self as f32;
        if self.is_finite() && !narrowed.is_finite() {
            return Err(Error::TypeKind("float does not fit in 32 bits"));
        }
        Ok(Value::Float(narrowed))
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Result<Value> {
        ascii_string(self.to_owned()).map(Value::Str)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Result<Value> {
        ascii_string(self).map(Value::Str)
    }
}

impl IntoValue for &[u8] {
    fn into_value(self) -> Result<Value> {
        Ok(Value::Bytes(self.to_vec()))
    }
}

impl IntoValue for Vec<u8> {
    fn into_value(self) -> Result<Value> {
        Ok(Value::Bytes(self))
    }
}

fn ascii_string(s: String) -> Result<String> {
    if !s.is_ascii() {
        return Err(Error::TypeKind("string is not ASCII"));
    }
    if s.contains('\0') {
        return Err(Error::TypeKind("string contains a NUL byte"));
    }
    Ok(s)
}

pub fn encode_int32(v: i32) -> [u8; 4] {
    v.to_le_bytes()
}

pub fn encode_float32(v: f32) -> [u8; 4] {
    v.to_le_bytes()
}

/// ASCII bytes of `s` followed by exactly one NUL.
pub fn encode_cstring(s: &str) -> Result<Vec<u8>> {
    let s = ascii_string(s.to_owned())?;
    let mut out = s.into_bytes();
    out.push(0);
    Ok(out)
}

pub fn decode_int32(src: &[u8]) -> Result<i32> {
    ValueReader::new(src).read_i32()
}

pub fn decode_float32(src: &[u8]) -> Result<f32> {
    ValueReader::new(src).read_f32()
}

pub fn decode_cstring(src: &[u8]) -> Result<String> {
    ValueReader::new(src).read_cstring()
}

/// Sequential decoder over a chunk payload.
///
/// The reader has no idea what layout the payload has; callers read the
/// members in the order their schema defines. Truncation errors carry the
/// absolute file offset when one was supplied with [`ValueReader::at`].
#[derive(Debug, Clone)]
pub struct ValueReader<'a> {
    rest: &'a [u8],
    consumed: u64,
    base: u64,
}

impl<'a> ValueReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::at(data, 0)
    }

    /// Decoder over `data`, which starts at absolute offset `base`.
    pub fn at(data: &'a [u8], base: u64) -> Self {
        Self { rest: data, consumed: 0, base }
    }

    pub fn offset(&self) -> u64 {
        self.base + self.consumed
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.rest
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    fn truncated(&self) -> Error {
        Error::TruncatedInput { offset: self.offset() }
    }

    fn advance<V>(&mut self, width: u64, value: std::io::Result<V>) -> Result<V> {
        let v = value.map_err(|_| self.truncated())?;
        self.consumed += width;
        Ok(v)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let mut src = self.rest;
        let v = src.read_i32::<LittleEndian>();
        let v = self.advance(4, v)?;
        self.rest = src;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut src = self.rest;
        let v = src.read_u32::<LittleEndian>();
        let v = self.advance(4, v)?;
        self.rest = src;
        Ok(v)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let mut src = self.rest;
        let v = src.read_f32::<LittleEndian>();
        let v = self.advance(4, v)?;
        self.rest = src;
        Ok(v)
    }

    /// Read up to and including the next NUL.
    pub fn read_cstring(&mut self) -> Result<String> {
        let end = self.rest.iter().position(|&b| b == 0).ok_or_else(|| self.truncated())?;
        let (text, rest) = self.rest.split_at(end);
        if !text.is_ascii() {
            return Err(Error::InvalidData("string member is not ASCII"));
        }
        let s = text.iter().map(|&b| b as char).collect();
        self.rest = &rest[1..];
        self.consumed += end.to_u64() + 1;
        Ok(s)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.rest.len() < len {
            return Err(self.truncated());
        }
        let (head, rest) = self.rest.split_at(len);
        self.rest = rest;
        self.consumed += len.to_u64();
        Ok(head)
    }
}

#[test]
fn primitive_encodings() {
    assert_eq!(encode_int32(42), *b"*\x00\x00\x00");
    assert_eq!(encode_int32(-1), [0xff; 4]);
    assert_eq!(encode_float32(12.345), *b"\x1f\x85EA");
    assert_eq!(encode_cstring("I am poncho man!").unwrap(), b"I am poncho man!\x00");
    assert_eq!(encode_cstring("").unwrap(), b"\x00");
}

#[test]
fn non_ascii_and_out_of_range_values_are_rejected() {
    assert!(matches!("héllo".into_value(), Err(Error::TypeKind(_))));
    assert!(matches!("a\0b".into_value(), Err(Error::TypeKind(_))));
    assert!(matches!(u32::MAX.into_value(), Err(Error::TypeKind(_))));
    assert!(matches!(i64::from(i32::MIN).into_value(), Ok(Value::Int(i32::MIN))));
    assert!(matches!(encode_cstring("ñ"), Err(Error::TypeKind(_))));
    assert!(matches!(1e300f64.into_value(), Err(Error::TypeKind(_))));
    assert!(matches!(f64::INFINITY.into_value(), Ok(Value::Float(f)) if f.is_infinite()));
    assert_eq!(0.5f64.into_value().unwrap(), Value::Float(0.5));
}

#[test]
fn ints_are_not_floats() {
    assert_eq!(7i32.into_value().unwrap(), Value::Int(7));
    assert_eq!(7.0f32.into_value().unwrap(), Value::Float(7.0));
    assert_ne!(Value::Int(7).encoded_len(), 0);
}

#[test]
fn value_reader_walks_mixed_payload() {
    let data = b"\x1f\x85EAI am poncho man!\x0090\x00\x00";
    let mut r = ValueReader::at(data, 100);
    assert_eq!(r.read_f32().unwrap(), 12.345);
    assert_eq!(r.read_cstring().unwrap(), "I am poncho man!");
    assert_eq!(r.read_i32().unwrap(), 12345);
    assert!(r.is_empty());
    assert_eq!(r.offset(), 125);
    match r.read_i32() {
        Err(Error::TruncatedInput { offset }) => assert_eq!(offset, 125),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn unterminated_string_is_truncated() {
    assert!(matches!(decode_cstring(b"abc"), Err(Error::TruncatedInput { offset: 0 })));
    assert!(matches!(decode_int32(b"\x01\x02"), Err(Error::TruncatedInput { .. })));
}
