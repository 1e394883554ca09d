//! Recursive chunk decoding.
//!
//! A chunk is read as tag, length and payload. Collection payloads are decoded by calling
//! back into the chunk reader until the payload is exhausted. Recursion is bounded by
//! [`DecodeConfig::max_depth`], so adversarial nesting fails with
//! [`EncoderError::DepthLimitExceeded`] instead of exhausting the stack.

use crate::core::*;
use crate::*;
use bigdecimal::BigDecimal;
use bytes::Buf;
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use tracing::{debug, trace};

/// Default limit on collection nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// What to do with bytes left after the top-level chunk.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Trailing {
    /// Fail with [`EncoderError::TrailingData`].
    #[default]
    Reject,
    /// Return the first value and discard the rest.
    Ignore,
}

/// Limits applied while decoding untrusted input.
///
/// # Examples
///
/// ```
/// use canonical_chunk::{deserialize_with, DecodeConfig, Trailing};
///
/// let cfg = DecodeConfig::default().with_trailing(Trailing::Ignore);
/// let bytes = [0x01, 0, 0, 0, 1, 0x01, 0xFF];
/// assert_eq!(deserialize_with(&bytes, &cfg).unwrap().as_bool(), Some(true));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecodeConfig {
    /// Maximum number of nested collections. A flat list has depth 1.
    pub max_depth: usize,

    /// Policy for bytes following the top-level chunk.
    pub trailing: Trailing,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            trailing: Trailing::Reject,
        }
    }
}

impl DecodeConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_trailing(mut self, trailing: Trailing) -> Self {
        self.trailing = trailing;
        self
    }
}

/// Decodes one chunk from the front of `reader`, advancing past it.
///
/// Returns `Ok(None)` when `reader` is empty, which marks the end of a run of sibling
/// chunks. Whatever follows the chunk is left in `reader`.
///
/// # Errors
/// * `TruncatedInput` if the header or payload is cut short.
/// * `UnknownTag` if the tag names no variant.
/// * `UnsupportedSize` if the length cannot be addressed on this platform.
/// * `DepthLimitExceeded` if collections nest deeper than `config.max_depth`.
/// * `Decode` if a payload is malformed, including number text that is not in the form
///   the encoder writes.
pub fn decode_chunk(reader: &mut Bytes, config: &DecodeConfig) -> Result<Option<Value>> {
    decode_at_depth(reader, config, 0)
}

/// Decodes a single top-level value and applies the trailing-byte policy.
pub(crate) fn decode_top_level(reader: &mut Bytes, config: &DecodeConfig) -> Result<Value> {
    let remaining = reader.len();
    let value = decode_chunk(reader, config)?.ok_or(EncoderError::TruncatedInput {
        needed: HEADER_LEN,
        remaining,
    })?;
    if reader.has_remaining() {
        match config.trailing {
            Trailing::Reject => {
                debug!(trailing = reader.remaining(), "rejecting trailing bytes");
                return Err(EncoderError::TrailingData(reader.remaining()));
            }
            Trailing::Ignore => {
                debug!(trailing = reader.remaining(), "ignoring trailing bytes");
                reader.advance(reader.remaining());
            }
        }
    }
    Ok(value)
}

/// Reads a chunk header and splits off its payload.
fn read_chunk(reader: &mut Bytes) -> Result<(u8, Bytes)> {
    if reader.remaining() < HEADER_LEN {
        debug!(remaining = reader.remaining(), "truncated chunk header");
        return Err(EncoderError::TruncatedInput {
            needed: HEADER_LEN,
            remaining: reader.remaining(),
        });
    }
    let tag = reader.get_u8();
    let mut size = [0u8; 4];
    reader.copy_to_slice(&mut size);
    let size = decode_size(size);
    let len = usize::try_from(size).map_err(|_| EncoderError::UnsupportedSize(size as u128))?;
    trace!(tag, len, "chunk header");
    if reader.remaining() < len {
        debug!(tag, len, remaining = reader.remaining(), "truncated chunk payload");
        return Err(EncoderError::TruncatedInput {
            needed: len,
            remaining: reader.remaining(),
        });
    }
    Ok((tag, reader.split_to(len)))
}

fn decode_at_depth(reader: &mut Bytes, config: &DecodeConfig, depth: usize) -> Result<Option<Value>> {
    if !reader.has_remaining() {
        return Ok(None);
    }
    let (tag, payload) = read_chunk(reader)?;
    let value = match tag {
        TAG_BYTES => Value::Bytes(payload),
        TAG_BOOL => Value::Bool(decode_bool(&payload)?),
        TAG_NUMBER => Value::Number(decode_number(&payload)?),
        TAG_TEXT => Value::Text(decode_text(&payload)?),
        TAG_UNORDERED_SEQUENCE => {
            let members = decode_members(payload, config, depth)?;
            Value::Set(members.into_iter().collect::<BTreeSet<_>>())
        }
        TAG_UNORDERED_MAP => {
            let members = decode_members(payload, config, depth)?;
            Value::Map(pair_entries(members)?.collect::<BTreeMap<_, _>>())
        }
        TAG_ORDERED_SEQUENCE => Value::List(decode_members(payload, config, depth)?),
        TAG_ORDERED_MAP => {
            let members = decode_members(payload, config, depth)?;
            Value::OrderedMap(pair_entries(members)?.collect::<IndexMap<_, _>>())
        }
        other => {
            debug!(tag = other, "unknown chunk tag");
            return Err(EncoderError::UnknownTag(other));
        }
    };
    Ok(Some(value))
}

/// Decodes every chunk in a collection payload, one level deeper.
fn decode_members(mut payload: Bytes, config: &DecodeConfig, depth: usize) -> Result<Vec<Value>> {
    let depth = depth + 1;
    if depth > config.max_depth {
        debug!(max_depth = config.max_depth, "collection nesting too deep");
        return Err(EncoderError::DepthLimitExceeded(config.max_depth));
    }
    let mut members = Vec::new();
    while let Some(member) = decode_at_depth(&mut payload, config, depth)? {
        members.push(member);
    }
    Ok(members)
}

/// Re-pairs the alternating key/value chunks of a map payload.
fn pair_entries(members: Vec<Value>) -> Result<impl Iterator<Item = (Value, Value)>> {
    if members.len() % 2 != 0 {
        return Err(EncoderError::Decode(format!(
            "Map payload holds {} chunks; expected key/value pairs",
            members.len()
        )));
    }
    let mut members = members.into_iter();
    Ok(std::iter::from_fn(move || Some((members.next()?, members.next()?))))
}

fn decode_bool(payload: &[u8]) -> Result<bool> {
    match payload {
        [0x00] => Ok(false),
        [0x01] => Ok(true),
        other => Err(EncoderError::Decode(format!(
            "Expected bool payload (0x00 or 0x01), got {:02X?}",
            other
        ))),
    }
}

fn decode_text(payload: &[u8]) -> Result<String> {
    String::from_utf8(payload.to_vec()).map_err(|e| EncoderError::Decode(e.to_string()))
}

/// Whether `text` matches `-?(0|[1-9][0-9]*)(\.[0-9]+)?`.
fn is_plain_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(integer)
        && (integer == "0" || !integer.starts_with('0'))
        && fraction.map_or(true, digits)
}

/// Number payloads must be the exact text the encoder writes, so decoding and re-encoding
/// reproduces the input bytes. Exponents, `+` signs, leading zeros and negative zero are
/// rejected.
fn decode_number(payload: &[u8]) -> Result<BigDecimal> {
    let text = std::str::from_utf8(payload).map_err(|e| EncoderError::Decode(e.to_string()))?;
    if !is_plain_decimal(text) {
        return Err(EncoderError::Decode(format!(
            "Invalid number {:?}: expected plain decimal text",
            text
        )));
    }
    let number = BigDecimal::from_str(text)
        .map_err(|e| EncoderError::Decode(format!("Invalid number {:?}: {}", text, e)))?;
    if number.to_plain_string() != text {
        return Err(EncoderError::Decode(format!(
            "Invalid number {:?}: not in canonical form",
            text
        )));
    }
    Ok(number)
}

/// Iterates over consecutive top-level chunks in one buffer.
///
/// Use this when several values were serialized back to back. Iteration stops at the end
/// of the buffer or after the first error.
///
/// # Examples
///
/// ```
/// use canonical_chunk::{serialize, ChunkReader, Value};
/// use bytes::BytesMut;
///
/// let mut stream = BytesMut::new();
/// stream.extend_from_slice(&serialize(&1u32).unwrap());
/// stream.extend_from_slice(&serialize("two").unwrap());
///
/// let values: Vec<Value> = ChunkReader::new(stream.freeze())
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(values, vec![Value::from(1u32), Value::from("two")]);
/// ```
#[derive(Debug, Clone)]
pub struct ChunkReader {
    buffer: Bytes,
    config: DecodeConfig,
    failed: bool,
}

impl ChunkReader {
    pub fn new(buffer: Bytes) -> Self {
        Self::with_config(buffer, DecodeConfig::default())
    }

    /// The trailing-byte policy of `config` is not consulted; every chunk is read.
    pub fn with_config(buffer: Bytes, config: DecodeConfig) -> Self {
        Self {
            buffer,
            config,
            failed: false,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &Bytes {
        &self.buffer
    }
}

impl Iterator for ChunkReader {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match decode_chunk(&mut self.buffer, &self.config) {
            Ok(value) => value.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
