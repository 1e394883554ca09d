//! The widened value model every chunk decodes into.

use crate::core::*;
use crate::*;
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A name with an optional namespace, such as `user/id`.
///
/// Symbols are written as Text with the namespace and name joined by `/`, so a symbol and
/// a string with the same joined text encode identically and both decode to
/// [`Value::Text`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    namespace: Option<String>,
    name: String,
}

impl Symbol {
    /// Creates a symbol without a namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// Creates a symbol in the given namespace.
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}", namespace, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl Encoder for Symbol {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        self.to_string().encode(writer)
    }
}

/// A value in its widest form: one variant per wire tag.
///
/// `Value` is what decoding produces, and it can be encoded again to the same bytes.
/// Its ordering is total across variants (by tag, then by contents) so that decoded sets
/// and maps can hold members of mixed shapes. Numbers compare by numeric value, and two
/// numbers are equal only if their decimal text matches too, so `1` and `1.0` differ.
/// Ordered maps compare entry by entry in insertion order.
#[derive(Debug, Clone)]
pub enum Value {
    /// Tag `0x00`. A single byte decodes as a one-element sequence.
    Bytes(Bytes),
    /// Tag `0x01`.
    Bool(bool),
    /// Tag `0x02`. Every numeric type widens to this.
    Number(BigDecimal),
    /// Tag `0x03`. Strings and symbols.
    Text(String),
    /// Tag `0x10`.
    Set(BTreeSet<Value>),
    /// Tag `0x11`.
    Map(BTreeMap<Value, Value>),
    /// Tag `0x20`.
    List(Vec<Value>),
    /// Tag `0x21`.
    OrderedMap(IndexMap<Value, Value>),
}

impl Value {
    /// The wire tag this value is written with.
    pub fn tag(&self) -> u8 {
        match self {
            Value::Bytes(_) => TAG_BYTES,
            Value::Bool(_) => TAG_BOOL,
            Value::Number(_) => TAG_NUMBER,
            Value::Text(_) => TAG_TEXT,
            Value::Set(_) => TAG_UNORDERED_SEQUENCE,
            Value::Map(_) => TAG_UNORDERED_MAP,
            Value::List(_) => TAG_ORDERED_SEQUENCE,
            Value::OrderedMap(_) => TAG_ORDERED_MAP,
        }
    }

    /// Returns the canonical encoding of this value.
    ///
    /// Equal values always produce equal bytes, so the result can be hashed or signed.
    pub fn to_canonical_bytes(&self) -> Result<Bytes> {
        serialize(self)
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<Value>> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<Value, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_ordered_map(&self) -> Option<&IndexMap<Value, Value>> {
        match self {
            Value::OrderedMap(m) => Some(m),
            _ => None,
        }
    }
}

/// Dispatches each variant to the codec for its tag.
impl Encoder for Value {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        match self {
            Value::Bytes(b) => b.encode(writer),
            Value::Bool(b) => b.encode(writer),
            Value::Number(n) => n.encode(writer),
            Value::Text(s) => s.encode(writer),
            Value::Set(s) => s.encode(writer),
            Value::Map(m) => m.encode(writer),
            Value::List(l) => l.encode(writer),
            Value::OrderedMap(m) => m.encode(writer),
        }
    }
}

impl Decoder for Value {
    fn decode(reader: &mut Bytes) -> Result<Self> {
        let remaining = reader.len();
        decode_chunk(reader, &DecodeConfig::default())?.ok_or(EncoderError::TruncatedInput {
            needed: HEADER_LEN,
            remaining,
        })
    }
}

// --- Ordering ---
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Set(a), Value::Set(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::OrderedMap(a), Value::OrderedMap(b)) => a.iter().cmp(b.iter()),
            _ => self.tag().cmp(&other.tag()),
        }
    }
}

/// Numbers that differ only in scale, such as `1` and `1.0`, are written differently and
/// so are distinct values. They order by numeric value first, then by their decimal text.
fn compare_numbers(a: &BigDecimal, b: &BigDecimal) -> Ordering {
    a.cmp(b).then_with(|| a.to_plain_string().cmp(&b.to_plain_string()))
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().hash(state);
        match self {
            Value::Bytes(b) => b.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => n.to_plain_string().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Set(s) => s.hash(state),
            Value::Map(m) => m.hash(state),
            Value::List(l) => l.hash(state),
            Value::OrderedMap(m) => {
                m.len().hash(state);
                for entry in m {
                    entry.hash(state);
                }
            }
        }
    }
}

// --- Conversions ---
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Bytes(Bytes::copy_from_slice(&[value]))
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(value))
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(value))
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(BigDecimal::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, i128, u16, u32, u64, u128);

impl From<BigDecimal> for Value {
    fn from(value: BigDecimal) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<Symbol> for Value {
    fn from(value: Symbol) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<BTreeSet<Value>> for Value {
    fn from(value: BTreeSet<Value>) -> Self {
        Value::Set(value)
    }
}

impl From<BTreeMap<Value, Value>> for Value {
    fn from(value: BTreeMap<Value, Value>) -> Self {
        Value::Map(value)
    }
}

impl From<IndexMap<Value, Value>> for Value {
    fn from(value: IndexMap<Value, Value>) -> Self {
        Value::OrderedMap(value)
    }
}

impl FromIterator<Value> for Value {
    /// Collects into a [`Value::List`].
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::List(iter.into_iter().collect())
    }
}
