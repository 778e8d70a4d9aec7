//! Tick Frame Codec
//!
//! The upstream streamer pushes each price update as a base64-wrapped
//! protobuf-style record. This module walks that record with a plain cursor;
//! no schema or code generation is involved.
//!
//! # Wire Layout
//!
//! A frame is a sequence of `(tag, value)` pairs. The tag is a varint with
//! `field = tag >> 3` and `wire = tag & 7`.
//!
//! | wire | value                               |
//! |------|-------------------------------------|
//! | 0    | varint                              |
//! | 1    | 8 bytes (skipped)                   |
//! | 2    | varint length, then that many bytes |
//! | 5    | 4-byte little-endian `f32`          |
//!
//! | field | meaning        | wire |
//! |-------|----------------|------|
//! | 1     | symbol         | 2    |
//! | 2     | price          | 5    |
//! | 3     | time (seconds) | 0    |
//! | 4     | change         | 5    |
//! | 5     | day high       | 5    |
//! | 6     | day low        | 5    |
//! | 7     | volume         | 0    |
//! | 8     | change percent | 5    |
//!
//! Any other wire type ends the frame; fields read before it are kept.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::domain::market::Tick;
use crate::domain::market::format::round2;

use super::messages::FeedEnvelope;

/// Longest legal varint.
const MAX_VARINT_BYTES: usize = 10;

/// Frame decoding errors. None of them affect the connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A value ran past the end of the buffer.
    #[error("truncated value at offset {offset}")]
    Truncated {
        /// Offset where the value started.
        offset: usize,
    },

    /// A varint used more than ten bytes.
    #[error("varint overflow at offset {offset}")]
    VarintOverflow {
        /// Offset where the varint started.
        offset: usize,
    },

    /// Symbol bytes were not UTF-8.
    #[error("symbol is not valid UTF-8")]
    InvalidUtf8,

    /// Frame carried no symbol.
    #[error("frame has no symbol")]
    MissingSymbol,

    /// Frame carried no price.
    #[error("frame has no price")]
    MissingPrice,

    /// Text was not valid base64.
    #[error("invalid base64: {0}")]
    Base64(String),

    /// JSON envelope could not be parsed.
    #[error("invalid envelope: {0}")]
    Envelope(String),
}

impl DecodeError {
    /// Whether the outer wrapping, rather than the record, was bad.
    #[must_use]
    pub const fn is_malformed_wrapper(&self) -> bool {
        matches!(self, Self::Base64(_) | Self::Envelope(_))
    }
}

// =============================================================================
// Frame Unwrapping
// =============================================================================

/// Unwrap a text frame and decode the tick inside.
///
/// Accepts bare base64 or a JSON envelope whose `message` field holds it.
///
/// # Errors
///
/// Returns a [`DecodeError`] when unwrapping or decoding fails.
pub fn decode_frame(text: &str) -> Result<Tick, DecodeError> {
    let trimmed = text.trim();
    let payload = if trimmed.starts_with('{') {
        let envelope: FeedEnvelope =
            serde_json::from_str(trimmed).map_err(|e| DecodeError::Envelope(e.to_string()))?;
        envelope.message
    } else {
        trimmed.to_string()
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    decode_tick(&bytes)
}

// =============================================================================
// Record Decoding
// =============================================================================

/// Decode one record.
///
/// Missing numeric fields are zero. Non-finite floats count as absent.
///
/// # Errors
///
/// Returns a [`DecodeError`] for truncated or malformed input, or when the
/// record lacks a symbol or price.
pub fn decode_tick(buf: &[u8]) -> Result<Tick, DecodeError> {
    let mut cursor = Cursor::new(buf);
    let mut tick = Tick::default();
    let mut symbol: Option<String> = None;
    let mut price: Option<f64> = None;

    while !cursor.is_empty() {
        let tag = cursor.varint()?;
        let field = tag >> 3;
        match tag & 7 {
            0 => {
                let value = cursor.varint()?;
                match field {
                    3 => {
                        let secs = i64::try_from(value).unwrap_or(i64::MAX);
                        tick.time = secs.saturating_mul(1000);
                    }
                    7 => tick.volume = value,
                    _ => {}
                }
            }
            1 => cursor.skip(8)?,
            2 => {
                let bytes = cursor.length_delimited()?;
                if field == 1 {
                    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
                    symbol = Some(text.to_string());
                }
            }
            5 => {
                let raw = cursor.float()?;
                let Some(value) = finite(raw) else {
                    continue;
                };
                match field {
                    2 => price = Some(value),
                    4 => tick.change = value,
                    5 => tick.day_high = value,
                    6 => tick.day_low = value,
                    8 => tick.change_percent = value,
                    _ => {}
                }
            }
            _ => break,
        }
    }

    tick.symbol = symbol
        .filter(|s| !s.is_empty())
        .ok_or(DecodeError::MissingSymbol)?;
    tick.price = price.ok_or(DecodeError::MissingPrice)?;
    Ok(tick)
}

fn finite(raw: f32) -> Option<f64> {
    raw.is_finite().then(|| round2(f64::from(raw)))
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    const fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn varint(&mut self) -> Result<u64, DecodeError> {
        let start = self.pos;
        let mut value = 0u64;
        for i in 0..MAX_VARINT_BYTES {
            let byte = *self
                .buf
                .get(self.pos)
                .ok_or(DecodeError::Truncated { offset: start })?;
            self.pos += 1;
            value |= u64::from(byte & 0x7f).wrapping_shl(7 * u32::try_from(i).unwrap_or(0));
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::VarintOverflow { offset: start })
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(DecodeError::Truncated { offset: start })?;
        self.pos = end;
        Ok(&self.buf[start..end])
    }

    fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.take(len).map(|_| ())
    }

    fn length_delimited(&mut self) -> Result<&'a [u8], DecodeError> {
        let start = self.pos;
        let len = usize::try_from(self.varint()?)
            .map_err(|_| DecodeError::Truncated { offset: start })?;
        self.take(len)
    }

    fn float(&mut self) -> Result<f32, DecodeError> {
        let bytes = self.take(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        Ok(f32::from_le_bytes(raw))
    }
}

// =============================================================================
// Tests
// =============================================================================
