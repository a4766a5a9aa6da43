//! Cursor-based binary codec for the session protocol
//!
//! Every packet is a flat sequence of fixed-size primitives and
//! length-prefixed ASCII strings. Integers and floats are little-endian,
//! pinned through a single `bincode` options value so the encoder and the
//! decoder can never disagree on layout.

use crate::Position;
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Size of a serialized [`Position`]: three `f32` components.
pub const POSITION_WIRE_SIZE: usize = 12;

/// Result type for wire operations.
pub type WireResult<T> = Result<T, CodecError>;

/// Reasons a packet could not be encoded or decoded.
///
/// Any decode error is fatal for the datagram it came from: the packet is
/// dropped as a whole and nothing it carried is applied.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("truncated packet: need {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("negative length prefix: {0}")]
    NegativeLength(i32),

    #[error("string field is not ASCII")]
    NonAscii,

    #[error("string of {0} bytes cannot be length-prefixed")]
    StringTooLong(usize),

    #[error("unknown connection state code: {0}")]
    UnknownConnectionState(u16),

    #[error("unknown request code: {0}")]
    UnknownRequest(u16),

    #[error("unexpected {0} in this packet direction")]
    Unexpected(&'static str),

    #[error("negative roster count: {0}")]
    NegativeCount(i32),

    #[error("{kind} of {len} exceeds limit of {max}")]
    LimitExceeded {
        kind: &'static str,
        len: usize,
        max: usize,
    },

    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),
}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

/// Append-only packet builder.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn put<T: Serialize>(&mut self, value: &T) -> WireResult<()> {
        wire_options().serialize_into(&mut self.buf, value)?;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> WireResult<()> {
        self.put(&value)
    }

    pub fn write_i32(&mut self, value: i32) -> WireResult<()> {
        self.put(&value)
    }

    pub fn write_i64(&mut self, value: i64) -> WireResult<()> {
        self.put(&value)
    }

    pub fn write_f32(&mut self, value: f32) -> WireResult<()> {
        self.put(&value)
    }

    pub fn write_bool(&mut self, value: bool) -> WireResult<()> {
        self.put(&value)
    }

    /// Writes a 4-byte length followed by the raw ASCII bytes, no terminator.
    pub fn write_str(&mut self, value: &str) -> WireResult<()> {
        if !value.is_ascii() {
            return Err(CodecError::NonAscii);
        }
        let len = i32::try_from(value.len()).map_err(|_| CodecError::StringTooLong(value.len()))?;
        self.write_i32(len)?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Like [`write_str`](Self::write_str), refusing strings over `max` bytes.
    pub fn write_bounded_str(&mut self, value: &str, max: usize) -> WireResult<()> {
        if value.len() > max {
            return Err(CodecError::LimitExceeded {
                kind: "string length",
                len: value.len(),
                max,
            });
        }
        self.write_str(value)
    }

    pub fn write_position(&mut self, value: &Position) -> WireResult<()> {
        self.put(value)
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
}

/// Reads primitives from a borrowed buffer, advancing an explicit cursor.
///
/// Reads never go past the end of the buffer: a read that would is reported
/// as [`CodecError::Truncated`] and leaves the cursor where it was.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current cursor offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, needed: usize) -> WireResult<&'a [u8]> {
        let available = self.remaining();
        if needed > available {
            return Err(CodecError::Truncated { needed, available });
        }
        let bytes = &self.buf[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(bytes)
    }

    fn get<T: DeserializeOwned>(&mut self, size: usize) -> WireResult<T> {
        let start = self.pos;
        let mut bytes = self.take(size)?;
        wire_options().deserialize_from(&mut bytes).map_err(|e| {
            self.pos = start;
            CodecError::from(e)
        })
    }

    pub fn read_u16(&mut self) -> WireResult<u16> {
        self.get(2)
    }

    pub fn read_i32(&mut self) -> WireResult<i32> {
        self.get(4)
    }

    pub fn read_i64(&mut self) -> WireResult<i64> {
        self.get(8)
    }

    pub fn read_f32(&mut self) -> WireResult<f32> {
        self.get(4)
    }

    pub fn read_bool(&mut self) -> WireResult<bool> {
        self.get(1)
    }

    pub fn read_str(&mut self) -> WireResult<String> {
        self.read_bounded_str(i32::MAX as usize)
    }

    /// Reads a length-prefixed string, rejecting lengths over `max` before
    /// touching the body.
    pub fn read_bounded_str(&mut self, max: usize) -> WireResult<String> {
        let start = self.pos;
        let len = self.read_i32()?;
        let result = usize::try_from(len)
            .map_err(|_| CodecError::NegativeLength(len))
            .and_then(|len| {
                if len > max {
                    Err(CodecError::LimitExceeded {
                        kind: "string length",
                        len,
                        max,
                    })
                } else {
                    self.take(len)
                }
            })
            .and_then(|bytes| {
                if bytes.is_ascii() {
                    Ok(bytes.iter().map(|&b| b as char).collect())
                } else {
                    Err(CodecError::NonAscii)
                }
            });
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    pub fn read_position(&mut self) -> WireResult<Position> {
        self.get(POSITION_WIRE_SIZE)
    }
}
