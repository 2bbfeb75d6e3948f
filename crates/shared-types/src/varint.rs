//! # IxiVarInt Codec
//!
//! Variable-length unsigned integers and length-prefixed byte strings used
//! by inventory payloads, id lists and canonical checksum encodings.
//!
//! ```text
//! value < 0xF9            → [value]
//! value ≤ 0xFFFF          → [0xF9, u16 LE]
//! value ≤ 0xFFFF_FFFF     → [0xFA, u32 LE]
//! otherwise               → [0xFB, u64 LE]
//! ```
//!
//! Decoding rejects non-minimal forms so every value has exactly one
//! encoding (checksums depend on it).

use crate::errors::CodecError;

/// Upper bound for any length-prefixed byte string.
pub const MAX_BYTES_LEN: u64 = 64 * 1024 * 1024;

const TAG_U16: u8 = 0xF9;
const TAG_U32: u8 = 0xFA;
const TAG_U64: u8 = 0xFB;

/// Encodes `value` as an IxiVarInt.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(9);
    write_varint_into(&mut out, value);
    out
}

/// Number of bytes `value` occupies when encoded.
pub fn varint_len(value: u64) -> usize {
    if value < u64::from(TAG_U16) {
        1
    } else if value <= 0xFFFF {
        3
    } else if value <= 0xFFFF_FFFF {
        5
    } else {
        9
    }
}

fn write_varint_into(out: &mut Vec<u8>, value: u64) {
    if value < u64::from(TAG_U16) {
        out.push(value as u8);
    } else if value <= 0xFFFF {
        out.push(TAG_U16);
        out.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xFFFF_FFFF {
        out.push(TAG_U32);
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.push(TAG_U64);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Append-only binary writer.
#[derive(Debug, Default, Clone)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_varint(&mut self, value: u64) -> &mut Self {
        write_varint_into(&mut self.buf, value);
        self
    }

    /// Writes a varint length followed by the raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.write_u8(u8::from(value))
    }

    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_str(&mut self, value: &str) -> &mut Self {
        self.write_bytes(value.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

/// Cursor-based binary reader over a borrowed buffer.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return Err(CodecError::UnexpectedEof {
                needed: len - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(i64::from_le_bytes(bytes))
    }

    pub fn read_varint(&mut self) -> Result<u64, CodecError> {
        let tag = self.read_u8()?;
        let value = match tag {
            TAG_U16 => {
                let mut b = [0u8; 2];
                b.copy_from_slice(self.take(2)?);
                u64::from(u16::from_le_bytes(b))
            }
            TAG_U32 => {
                let mut b = [0u8; 4];
                b.copy_from_slice(self.take(4)?);
                u64::from(u32::from_le_bytes(b))
            }
            TAG_U64 => {
                let mut b = [0u8; 8];
                b.copy_from_slice(self.take(8)?);
                u64::from_le_bytes(b)
            }
            small if small < TAG_U16 => return Ok(u64::from(small)),
            other => {
                return Err(CodecError::UnknownTag {
                    kind: "varint",
                    tag: u64::from(other),
                })
            }
        };
        if varint_len(value) != match tag {
            TAG_U16 => 3,
            TAG_U32 => 5,
            _ => 9,
        } {
            return Err(CodecError::NonCanonicalVarInt);
        }
        Ok(value)
    }

    /// Reads a varint-prefixed byte string bounded by [`MAX_BYTES_LEN`].
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        self.read_bytes_max(MAX_BYTES_LEN)
    }

    pub fn read_bytes_max(&mut self, max: u64) -> Result<Vec<u8>, CodecError> {
        let len = self.read_varint()?;
        if len > max {
            return Err(CodecError::LengthTooLarge { len, max });
        }
        Ok(self.take(len as usize)?.to_vec())
    }

    pub fn read_string(&mut self) -> Result<String, CodecError> {
        String::from_utf8(self.read_bytes()?).map_err(|_| CodecError::InvalidUtf8)
    }
}
