//! # canonical-chunk
//!
//! A deterministic binary serialization format. Every value is written as a
//! *chunk*: a one byte tag, a four byte big-endian payload length, and the payload.
//!
//! - Unordered collections (sets and maps) are written in canonical order: every member is
//!   encoded on its own first and the encoded chunks are sorted bytewise, so two equal
//!   collections always produce identical bytes regardless of iteration order
//! - Ordered collections (lists and ordered maps) keep their input order
//! - Numbers of every kind are written as their decimal text and decode into one
//!   arbitrary-precision [`BigDecimal`](bigdecimal::BigDecimal)
//! - Decoding always yields a [`Value`], the widest representation of the data
//!
//! ## Wire format
//!
//! | Tag    | Variant             | Payload                                   |
//! |--------|---------------------|-------------------------------------------|
//! | `0x00` | Byte / Bytes        | raw bytes                                 |
//! | `0x01` | Boolean             | `0x00` or `0x01`                          |
//! | `0x02` | Number              | UTF-8 decimal string, no exponent         |
//! | `0x03` | Text                | UTF-8 string                              |
//! | `0x10` | Unordered Sequence  | member chunks, sorted bytewise            |
//! | `0x11` | Unordered Map       | key/value chunks, sorted by key chunk     |
//! | `0x20` | Ordered Sequence    | member chunks in input order              |
//! | `0x21` | Ordered Map         | key/value chunks in input order           |
//!
//! ## Derive Macro
//!
//! `#[derive(Encode)]` encodes structs as ordered maps keyed by field name and enums by
//! variant name. See [`Encode`] for the attributes it accepts.
//!
//! ## Feature Flags
//!
//! - `rust_decimal`: Encodes `rust_decimal::Decimal` as a Number.
//! - `smol_str`: Encodes `smol_str::SmolStr` as Text.
//! - `fxhash`: Re-exports `FxHashMap` and `FxHashSet`, which encode through the generic
//!   hasher impls as unordered collections.
//! - `ahash`: `AHashMap` and `AHashSet` as unordered collections.
//! - `serde_json`: Encodes `serde_json::Value` and converts it into a [`Value`].

pub mod core;
pub mod decode;
mod features;
pub mod value;

pub use bytes::{Bytes, BytesMut};
pub use canonical_chunk_derive::Encode;

pub use crate::core::{
    decode_size, encode_size, to_chunk, write_chunk, write_ordered_map, write_ordered_sequence,
    write_unordered_map, write_unordered_sequence, MAX_PAYLOAD_SIZE, TAG_BOOL, TAG_BYTES,
    TAG_NUMBER, TAG_ORDERED_MAP, TAG_ORDERED_SEQUENCE, TAG_TEXT, TAG_UNORDERED_MAP,
    TAG_UNORDERED_SEQUENCE,
};
pub use crate::decode::{decode_chunk, ChunkReader, DecodeConfig, Trailing, DEFAULT_MAX_DEPTH};
pub use crate::value::{Symbol, Value};
#[cfg(feature = "fxhash")]
pub use fxhash::{FxHashMap, FxHashSet};

/// Errors that can occur during encoding or decoding operations.
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    /// A negative length was handed to the size framer.
    #[error("Invalid size: {0} is negative")]
    InvalidSize(i128),
    /// A length does not fit the four byte frame, or cannot be addressed on this platform.
    #[error("Unsupported size: {0} exceeds the maximum payload size of {}", MAX_PAYLOAD_SIZE)]
    UnsupportedSize(u128),
    /// The value has no representation in the format (e.g. NaN, JSON null).
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),
    /// The tag byte does not name any variant.
    #[error("Unknown tag: 0x{0:02X}")]
    UnknownTag(u8),
    /// The buffer ended before the declared data.
    #[error("Truncated input: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput { needed: usize, remaining: usize },
    /// A payload was framed correctly but its contents are malformed.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Collections are nested deeper than the configured limit.
    #[error("Nesting depth exceeds the limit of {0}")]
    DepthLimitExceeded(usize),
    /// Bytes were left over after the top-level chunk.
    #[error("{0} trailing bytes after the top-level chunk")]
    TrailingData(usize),
}

/// The result type used throughout this crate for encode/decode operations.
pub type Result<T> = std::result::Result<T, EncoderError>;

/// Trait for types that can be encoded into a canonical chunk.
///
/// Implemented for the native shapes the format understands; use `#[derive(Encode)]` for
/// your own structs and enums.
///
/// # Errors
/// Returns `EncoderError` if the value cannot be represented or a payload overflows the
/// four byte length frame.
pub trait Encoder {
    /// Encode the value as exactly one chunk appended to `writer`.
    ///
    /// # Arguments
    /// * `writer` - The buffer to write the encoded bytes into.
    fn encode(&self, writer: &mut BytesMut) -> Result<()>;
}

/// Trait for types that can be read back from the chunk format.
///
/// Decoding widens: the only implementor is [`Value`].
///
/// # Errors
/// Returns `EncoderError` if the data is malformed.
pub trait Decoder: Sized {
    /// Decode one chunk from the front of `reader`, advancing past it.
    ///
    /// # Arguments
    /// * `reader` - The buffer to read the encoded bytes from.
    fn decode(reader: &mut Bytes) -> Result<Self>;
}

/// Serializes a value into its canonical byte form.
///
/// # Example
/// ```rust
/// use canonical_chunk::{serialize, deserialize, Value};
/// use std::collections::HashMap;
///
/// let mut a = HashMap::new();
/// a.insert(true, 10);
/// a.insert(false, 20);
/// let mut b = HashMap::new();
/// b.insert(false, 20);
/// b.insert(true, 10);
///
/// let bytes = serialize(&a).unwrap();
/// assert_eq!(bytes, serialize(&b).unwrap());
///
/// let decoded = deserialize(&bytes).unwrap();
/// assert!(matches!(decoded, Value::Map(ref m) if m.len() == 2));
/// ```
pub fn serialize<T: Encoder + ?Sized>(value: &T) -> Result<Bytes> {
    let mut writer = BytesMut::new();
    value.encode(&mut writer)?;
    Ok(writer.freeze())
}

/// Deserializes exactly one top-level chunk with the default [`DecodeConfig`].
///
/// Trailing bytes after the chunk are rejected; see [`deserialize_with`] to change that.
///
/// # Example
/// ```rust
/// use canonical_chunk::{serialize, deserialize, Value};
///
/// let bytes = serialize("ação").unwrap();
/// assert_eq!(bytes.len(), 5 + 6);
/// assert_eq!(deserialize(&bytes).unwrap(), Value::Text("ação".to_string()));
/// ```
pub fn deserialize(bytes: &[u8]) -> Result<Value> {
    deserialize_with(bytes, &DecodeConfig::default())
}

/// Deserializes one top-level chunk using the given configuration.
pub fn deserialize_with(bytes: &[u8], config: &DecodeConfig) -> Result<Value> {
    let mut reader = Bytes::copy_from_slice(bytes);
    decode::decode_top_level(&mut reader, config)
}
