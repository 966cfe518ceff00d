//! Low-level wire format primitives.
//!
//! ## Wire Format Overview
//!
//! Each field is encoded as a record:
//! - A varint key containing the field number and wire type (`tag << 3 | wire_type`)
//! - The payload (format depends on wire type)
//!
//! Wire types:
//! - 0: VARINT (int32, int64, uint32, uint64, sint32, sint64, bool, enum)
//! - 1: I64 (fixed64, sfixed64, double)
//! - 2: LEN (string, bytes, embedded messages)
//! - 5: I32 (fixed32, sfixed32, float)
//!
//! Group wire types (3 and 4) are not supported and are rejected.

use crate::error::{Error, Result};
use crate::MAX_FIELD_NUMBER;
use bytes::BufMut;

/// Wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// 64-bit fixed-width
    I64 = 1,
    /// Length-delimited (strings, bytes, embedded messages)
    Len = 2,
    /// 32-bit fixed-width
    I32 = 5,
}

impl WireType {
    /// Returns the numeric wire type as it appears in a record key
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WireType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            5 => Ok(WireType::I32),
            3 | 4 => Err(Error::invalid_wire_format(
                0,
                format!("group wire type {} is not supported", value),
            )),
            _ => Err(Error::invalid_wire_format(
                0,
                format!("unknown wire type: {}", value),
            )),
        }
    }
}

/// Maximum number of bytes in a varint-encoded 64-bit value
pub const MAX_VARINT_LEN: usize = 10;

/// Encode `value` as a base-128 varint.
pub fn encode_varint(mut value: u64, buf: &mut impl BufMut) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Number of bytes [`encode_varint`] writes for `value`.
pub fn encoded_len_varint(value: u64) -> usize {
    // Every 7 significant bits cost one byte; zero still takes one.
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Decode a varint from the given bytes.
///
/// Returns the decoded value and the number of bytes consumed.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in data.iter().enumerate() {
        // The last byte may only carry bit 63 and no continuation
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(Error::varint_decode(i));
        }

        result |= ((byte & 0x7F) as u64) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(Error::varint_decode(data.len()))
}

/// Zig-zag remap of a signed 32-bit value: `0, -1, 1, -2` become `0, 1, 2, 3`.
pub fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode32`].
pub fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Zig-zag remap of a signed 64-bit value.
pub fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode64`].
pub fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Encode a record key for `tag` and `wire_type`.
pub fn encode_key(tag: u32, wire_type: WireType, buf: &mut impl BufMut) {
    encode_varint(((tag as u64) << 3) | wire_type.as_u8() as u64, buf);
}

/// Number of bytes a record key for `tag` occupies.
pub fn key_len(tag: u32) -> usize {
    encoded_len_varint((tag as u64) << 3)
}

/// Cursor over an encoded message.
///
/// Offsets reported in errors are absolute positions in the outermost
/// buffer, including for readers over nested payloads.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader over the whole buffer
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Absolute offset of the next unread byte
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true once every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Read a varint
    pub fn read_varint(&mut self) -> Result<u64> {
        let (value, len) = decode_varint(&self.data[self.pos..])
            .map_err(|_| Error::varint_decode(self.offset()))?;
        self.pos += len;
        Ok(value)
    }

    /// Read a record key and split it into tag and wire type
    pub fn read_key(&mut self) -> Result<(u32, WireType)> {
        let offset = self.offset();
        let key = self.read_varint()?;

        let wire_type = WireType::try_from((key & 0x07) as u8).map_err(|e| match e {
            Error::InvalidWireFormat { details, .. } => Error::invalid_wire_format(offset, details),
            other => other,
        })?;

        let tag = key >> 3;
        if tag == 0 || tag > MAX_FIELD_NUMBER as u64 {
            return Err(Error::invalid_wire_format(
                offset,
                format!("invalid field number {}", tag),
            ));
        }

        Ok((tag as u32, wire_type))
    }

    /// Read a little-endian 32-bit fixed-width payload
    pub fn read_fixed32(&mut self) -> Result<u32> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4, "I32")?);
        Ok(u32::from_le_bytes(raw))
    }

    /// Read a little-endian 64-bit fixed-width payload
    pub fn read_fixed64(&mut self) -> Result<u64> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8, "I64")?);
        Ok(u64::from_le_bytes(raw))
    }

    /// Read a length-delimited payload, returning the raw bytes
    pub fn read_len_delimited(&mut self) -> Result<&'a [u8]> {
        let offset = self.offset();
        let length = self.read_varint()?;

        if length > self.remaining() as u64 {
            return Err(Error::invalid_wire_format(
                offset,
                format!(
                    "length-delimited payload of {} bytes exceeds remaining {} bytes",
                    length,
                    self.remaining()
                ),
            ));
        }

        self.take(length as usize, "LEN")
    }

    /// Read a length-delimited payload as a reader positioned at its start
    pub fn read_nested(&mut self) -> Result<WireReader<'a>> {
        let payload = self.read_len_delimited()?;
        Ok(WireReader {
            data: payload,
            pos: 0,
            base: self.offset() - payload.len(),
        })
    }

    /// Skip one payload of the given wire type
    pub fn skip(&mut self, wire_type: WireType) -> Result<()> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::I64 => {
                self.take(8, "I64")?;
            }
            WireType::Len => {
                self.read_len_delimited()?;
            }
            WireType::I32 => {
                self.take(4, "I32")?;
            }
        }
        Ok(())
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::invalid_wire_format(
                self.offset(),
                format!(
                    "not enough bytes for {} (need {}, have {})",
                    what,
                    len,
                    self.remaining()
                ),
            ));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}
