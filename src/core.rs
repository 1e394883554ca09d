use crate::*;
use bigdecimal::BigDecimal;
use bytes::BufMut;
use indexmap::{IndexMap, IndexSet};
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Type tags used in the chunk format.
///
/// Each chunk starts with one of these tags. Tags are stable and part of the wire format;
/// any other tag byte is rejected on decode.

///< Byte and byte sequences
pub const TAG_BYTES: u8 = 0x00;
pub const TAG_BOOL: u8 = 0x01;
///< Decimal text of any numeric type
pub const TAG_NUMBER: u8 = 0x02;
///< UTF-8 text, strings and flattened symbols
pub const TAG_TEXT: u8 = 0x03;
///< Sets; members sorted by their encoded bytes
pub const TAG_UNORDERED_SEQUENCE: u8 = 0x10;
///< Maps; entries sorted by their encoded key bytes
pub const TAG_UNORDERED_MAP: u8 = 0x11;
pub const TAG_ORDERED_SEQUENCE: u8 = 0x20;
pub const TAG_ORDERED_MAP: u8 = 0x21;

/// Size of the chunk header: one tag byte and a four byte length.
pub const HEADER_LEN: usize = 5;
/// The largest payload a single chunk can carry.
pub const MAX_PAYLOAD_SIZE: u32 = u32::MAX;

// --- Size framer ---
/// Encodes a payload length as four big-endian bytes.
///
/// The size is taken as a signed integer so that callers holding signed lengths get a
/// distinct error instead of a wrapped value.
///
/// # Errors
/// * `InvalidSize` if `size` is negative.
/// * `UnsupportedSize` if `size` exceeds [`MAX_PAYLOAD_SIZE`].
pub fn encode_size(size: i128) -> Result<[u8; 4]> {
    if size < 0 {
        return Err(EncoderError::InvalidSize(size));
    }
    let size = u32::try_from(size).map_err(|_| EncoderError::UnsupportedSize(size as u128))?;
    Ok(size.to_be_bytes())
}

/// Decodes four big-endian bytes into an unsigned payload length.
pub fn decode_size(bytes: [u8; 4]) -> u32 {
    u32::from_be_bytes(bytes)
}

/// Writes a chunk header for a payload of `len` bytes.
#[inline]
fn write_header(writer: &mut BytesMut, tag: u8, len: usize) -> Result<()> {
    let size = encode_size(len as i128)?;
    writer.reserve(HEADER_LEN + len);
    writer.put_u8(tag);
    writer.put_slice(&size);
    Ok(())
}

/// Writes a complete chunk: tag, length and payload.
pub fn write_chunk(writer: &mut BytesMut, tag: u8, payload: &[u8]) -> Result<()> {
    write_header(writer, tag, payload.len())?;
    writer.put_slice(payload);
    Ok(())
}

/// Encodes a value into a standalone chunk.
///
/// Collections use this to serialize every member before sorting or concatenating.
pub fn to_chunk<T: Encoder + ?Sized>(value: &T) -> Result<Bytes> {
    let mut writer = BytesMut::new();
    value.encode(&mut writer)?;
    Ok(writer.freeze())
}

// --- Collection framing ---
fn write_members(writer: &mut BytesMut, tag: u8, members: &[Bytes]) -> Result<()> {
    let len = members.iter().map(Bytes::len).sum();
    write_header(writer, tag, len)?;
    for member in members {
        writer.put_slice(member);
    }
    Ok(())
}

fn write_entries(writer: &mut BytesMut, tag: u8, entries: &[(Bytes, Bytes)]) -> Result<()> {
    let len = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
    write_header(writer, tag, len)?;
    for (key, value) in entries {
        writer.put_slice(key);
        writer.put_slice(value);
    }
    Ok(())
}

/// Writes an Unordered Sequence from already encoded member chunks.
///
/// Members are sorted by their bytes (unsigned, lexicographic, shorter prefix first), so
/// the output does not depend on the order they were produced in.
pub fn write_unordered_sequence(writer: &mut BytesMut, mut members: Vec<Bytes>) -> Result<()> {
    members.sort_unstable();
    write_members(writer, TAG_UNORDERED_SEQUENCE, &members)
}

/// Writes an Ordered Sequence from encoded member chunks, keeping their order.
pub fn write_ordered_sequence(writer: &mut BytesMut, members: Vec<Bytes>) -> Result<()> {
    write_members(writer, TAG_ORDERED_SEQUENCE, &members)
}

/// Writes an Unordered Map from encoded key/value chunk pairs.
///
/// Entries are sorted by the key chunk alone; each value stays directly after its key.
pub fn write_unordered_map(writer: &mut BytesMut, mut entries: Vec<(Bytes, Bytes)>) -> Result<()> {
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    write_entries(writer, TAG_UNORDERED_MAP, &entries)
}

/// Writes an Ordered Map from encoded key/value chunk pairs, keeping their order.
pub fn write_ordered_map(writer: &mut BytesMut, entries: Vec<(Bytes, Bytes)>) -> Result<()> {
    write_entries(writer, TAG_ORDERED_MAP, &entries)
}

pub(crate) fn encode_members<'a, T, I>(items: I) -> Result<Vec<Bytes>>
where
    T: Encoder + ?Sized + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().map(to_chunk).collect()
}

pub(crate) fn encode_entries<'a, K, V, I>(entries: I) -> Result<Vec<(Bytes, Bytes)>>
where
    K: Encoder + ?Sized + 'a,
    V: Encoder + ?Sized + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    entries
        .into_iter()
        .map(|(k, v)| Ok((to_chunk(k)?, to_chunk(v)?)))
        .collect()
}

/// Collects a run of `u8` items into a byte vector, or `None` if `T` is not `u8`.
///
/// Sequences of bytes are written as a single Bytes chunk instead of a list of Byte chunks.
fn byte_run<'a, T: 'static, I: Iterator<Item = &'a T>>(items: I) -> Option<Vec<u8>> {
    if TypeId::of::<T>() != TypeId::of::<u8>() {
        return None;
    }
    Some(
        items
            .filter_map(|item| (item as &dyn Any).downcast_ref::<u8>().copied())
            .collect(),
    )
}

// --- bool ---
/// Encodes a `bool` as a one byte payload: `0x00` for `false`, `0x01` for `true`.
impl Encoder for bool {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_chunk(writer, TAG_BOOL, &[u8::from(*self)])
    }
}

// --- u8 ---
/// A single `u8` is a raw byte, not a number.
impl Encoder for u8 {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_chunk(writer, TAG_BYTES, &[*self])
    }
}

// --- Numbers ---
/// Writes the decimal text of a number.
pub(crate) fn write_number_text(writer: &mut BytesMut, text: &str) -> Result<()> {
    write_chunk(writer, TAG_NUMBER, text.as_bytes())
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {
        $(
            impl Encoder for $ty {
                fn encode(&self, writer: &mut BytesMut) -> Result<()> {
                    write_number_text(writer, &self.to_string())
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, i128, isize, u16, u32, u64, u128, usize);

// --- f32/f64 ---
// Floats use their shortest round-trip decimal form, which never contains an exponent.
// NaN and the infinities have no decimal form and are rejected. Negative zero is written
// as `0`.
macro_rules! impl_float {
    ($($ty:ty),*) => {
        $(
            impl Encoder for $ty {
                fn encode(&self, writer: &mut BytesMut) -> Result<()> {
                    if !self.is_finite() {
                        return Err(EncoderError::UnsupportedType(format!(
                            "{} value {} has no decimal representation",
                            stringify!($ty),
                            self
                        )));
                    }
                    let value = if *self == 0.0 { 0.0 } else { *self };
                    write_number_text(writer, &value.to_string())
                }
            }
        )*
    };
}

impl_float!(f32, f64);

/// Encodes a `BigDecimal` in plain notation, keeping its scale.
impl Encoder for BigDecimal {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_number_text(writer, &self.to_plain_string())
    }
}

// --- Text ---
impl Encoder for str {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_chunk(writer, TAG_TEXT, self.as_bytes())
    }
}
impl Encoder for String {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        self.as_str().encode(writer)
    }
}
impl Encoder for Cow<'_, str> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        self.as_ref().encode(writer)
    }
}

// --- Bytes ---
impl Encoder for Bytes {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_chunk(writer, TAG_BYTES, self)
    }
}
impl Encoder for BytesMut {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_chunk(writer, TAG_BYTES, self)
    }
}

// --- Ordered sequences ---
/// Encodes a slice as an Ordered Sequence. `[u8]` is written as one Bytes chunk.
impl<T: Encoder + 'static> Encoder for [T] {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        if let Some(bytes) = byte_run(self.iter()) {
            return write_chunk(writer, TAG_BYTES, &bytes);
        }
        write_ordered_sequence(writer, encode_members(self)?)
    }
}
impl<T: Encoder + 'static> Encoder for Vec<T> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        self.as_slice().encode(writer)
    }
}
impl<T: Encoder + 'static, const N: usize> Encoder for [T; N] {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        self.as_slice().encode(writer)
    }
}
impl<T: Encoder + 'static> Encoder for VecDeque<T> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        if let Some(bytes) = byte_run(self.iter()) {
            return write_chunk(writer, TAG_BYTES, &bytes);
        }
        write_ordered_sequence(writer, encode_members(self)?)
    }
}
/// An `IndexSet` keeps insertion order, so it is written as an Ordered Sequence.
impl<T: Encoder, S> Encoder for IndexSet<T, S> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_ordered_sequence(writer, encode_members(self)?)
    }
}

// --- Unordered sequences ---
impl<T: Encoder, S> Encoder for HashSet<T, S> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_unordered_sequence(writer, encode_members(self)?)
    }
}
/// A `BTreeSet` is still a set: its members are sorted by encoded bytes, not by `Ord`.
impl<T: Encoder> Encoder for BTreeSet<T> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_unordered_sequence(writer, encode_members(self)?)
    }
}

// --- Maps ---
impl<K: Encoder, V: Encoder, S> Encoder for HashMap<K, V, S> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_unordered_map(writer, encode_entries(self)?)
    }
}
impl<K: Encoder, V: Encoder> Encoder for BTreeMap<K, V> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_unordered_map(writer, encode_entries(self)?)
    }
}
impl<K: Encoder, V: Encoder, S> Encoder for IndexMap<K, V, S> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_ordered_map(writer, encode_entries(self)?)
    }
}

// --- Wrappers ---
/// Implementation for references - delegates to the referenced value
impl<T: Encoder + ?Sized> Encoder for &T {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        (**self).encode(writer)
    }
}
impl<T: Encoder + ?Sized> Encoder for Box<T> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        (**self).encode(writer)
    }
}
impl<T: Encoder + ?Sized> Encoder for Arc<T> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        (**self).encode(writer)
    }
}
