#![cfg(feature = "serde_json")]

use bigdecimal::BigDecimal;
use canonical_chunk::{deserialize, serialize, EncoderError, Value};
use serde_json::json;
use std::str::FromStr;

#[test]
fn test_json_round_trip_matches_conversion() {
    let json = json!({
        "name": "ação",
        "tags": ["a", "b"],
        "score": 2.5,
        "count": 3,
        "delta": -4,
        "active": true,
        "nested": { "z": 1, "a": [] }
    });
    let bytes = serialize(&json).unwrap();
    let converted = Value::try_from(json).unwrap();
    assert_eq!(deserialize(&bytes).unwrap(), converted);
    assert_eq!(converted.to_canonical_bytes().unwrap(), bytes);
}

#[test]
fn test_json_object_key_order_irrelevant() {
    let first: serde_json::Value = serde_json::from_str(r#"{"b": 1, "a": 2}"#).unwrap();
    let second: serde_json::Value = serde_json::from_str(r#"{"a": 2, "b": 1}"#).unwrap();
    assert_eq!(serialize(&first).unwrap(), serialize(&second).unwrap());
}

#[test]
fn test_json_numbers_widen() {
    let value = deserialize(&serialize(&json!([1, -1, 0.125])).unwrap()).unwrap();
    assert_eq!(
        value,
        Value::List(vec![
            Value::Number(BigDecimal::from(1)),
            Value::Number(BigDecimal::from(-1)),
            Value::Number(BigDecimal::from_str("0.125").unwrap()),
        ])
    );
}

#[test]
fn test_json_null_unsupported() {
    assert!(matches!(
        serialize(&json!(null)),
        Err(EncoderError::UnsupportedType(_))
    ));
    assert!(matches!(
        serialize(&json!({"a": [1, null]})),
        Err(EncoderError::UnsupportedType(_))
    ));
    assert!(matches!(
        Value::try_from(json!([null])),
        Err(EncoderError::UnsupportedType(_))
    ));
}
