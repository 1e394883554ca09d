#[cfg(feature = "ahash")]
use ahash::{AHashMap, AHashSet};
#[cfg(feature = "rust_decimal")]
use rust_decimal::Decimal;
#[cfg(feature = "smol_str")]
use smol_str::SmolStr;

#[allow(unused_imports)]
use crate::core::*;
#[allow(unused_imports)]
use crate::*;

// FxHashMap and FxHashSet, re-exported from the crate root, are aliases of the std
// collections with a custom hasher, so the generic `HashMap<K, V, S>` and `HashSet<T, S>`
// impls already cover them.

// --- AHashMap ---
#[cfg(feature = "ahash")]
impl<K: Encoder, V: Encoder, S> Encoder for AHashMap<K, V, S> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_unordered_map(writer, encode_entries(self.iter())?)
    }
}

// --- AHashSet ---
#[cfg(feature = "ahash")]
impl<T: Encoder, S> Encoder for AHashSet<T, S> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_unordered_sequence(writer, encode_members(self.iter())?)
    }
}

// --- Decimal ---
/// `Decimal` displays in plain notation with its scale, e.g. `1.50`. A negative zero
/// loses its sign.
#[cfg(feature = "rust_decimal")]
impl Encoder for Decimal {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        let value = if self.is_zero() { self.abs() } else { *self };
        write_number_text(writer, &value.to_string())
    }
}

// --- SmolStr ---
#[cfg(feature = "smol_str")]
impl Encoder for SmolStr {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        self.as_str().encode(writer)
    }
}

// --- serde_json::Value ---
#[cfg(feature = "serde_json")]
mod json {
    use crate::core::*;
    use crate::*;
    use bigdecimal::BigDecimal;
    use serde_json::Number;
    use std::str::FromStr;

    fn null_error() -> EncoderError {
        EncoderError::UnsupportedType("JSON null has no chunk representation".to_string())
    }

    fn number_to_decimal(n: &Number) -> Result<BigDecimal> {
        if let Some(u) = n.as_u64() {
            Ok(BigDecimal::from(u))
        } else if let Some(i) = n.as_i64() {
            Ok(BigDecimal::from(i))
        } else if let Some(f) = n.as_f64() {
            BigDecimal::from_str(&f.to_string())
                .map_err(|e| EncoderError::UnsupportedType(format!("JSON number {}: {}", n, e)))
        } else {
            Err(EncoderError::UnsupportedType(format!("JSON number {}", n)))
        }
    }

    /// Arrays are Ordered Sequences and objects are Unordered Maps with Text keys.
    /// `null` has no variant and is rejected.
    impl Encoder for serde_json::Value {
        fn encode(&self, writer: &mut BytesMut) -> Result<()> {
            match self {
                serde_json::Value::Null => Err(null_error()),
                serde_json::Value::Bool(b) => b.encode(writer),
                serde_json::Value::Number(n) => {
                    if let Some(u) = n.as_u64() {
                        u.encode(writer)
                    } else if let Some(i) = n.as_i64() {
                        i.encode(writer)
                    } else {
                        number_to_decimal(n)?.encode(writer)
                    }
                }
                serde_json::Value::String(s) => s.encode(writer),
                serde_json::Value::Array(arr) => {
                    write_ordered_sequence(writer, encode_members(arr.iter())?)
                }
                serde_json::Value::Object(obj) => {
                    write_unordered_map(writer, encode_entries(obj.iter())?)
                }
            }
        }
    }

    /// Converts JSON into the value it would decode to after a round trip.
    impl TryFrom<serde_json::Value> for Value {
        type Error = EncoderError;

        fn try_from(json: serde_json::Value) -> Result<Self> {
            Ok(match json {
                serde_json::Value::Null => return Err(null_error()),
                serde_json::Value::Bool(b) => Value::Bool(b),
                serde_json::Value::Number(n) => Value::Number(number_to_decimal(&n)?),
                serde_json::Value::String(s) => Value::Text(s),
                serde_json::Value::Array(arr) => Value::List(
                    arr.into_iter()
                        .map(Value::try_from)
                        .collect::<Result<Vec<_>>>()?,
                ),
                serde_json::Value::Object(obj) => Value::Map(
                    obj.into_iter()
                        .map(|(k, v)| Ok((Value::Text(k), Value::try_from(v)?)))
                        .collect::<Result<_>>()?,
                ),
            })
        }
    }
}
