#[allow(unused_imports)]
use canonical_chunk::{deserialize, serialize, Value};
#[allow(unused_imports)]
use std::collections::{HashMap, HashSet};

#[cfg(feature = "rust_decimal")]
#[test]
fn test_rust_decimal_keeps_scale() {
    use bigdecimal::BigDecimal;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    let value = Decimal::from_str("1.50").unwrap();
    let bytes = serialize(&value).unwrap();
    assert_eq!(&bytes[5..], b"1.50");
    assert_eq!(
        deserialize(&bytes).unwrap(),
        Value::Number(BigDecimal::from_str("1.50").unwrap())
    );
    assert_eq!(
        serialize(&Decimal::from(42)).unwrap(),
        serialize(&42i64).unwrap()
    );

    let negative_zero = Decimal::from_str("-0.00").unwrap();
    let bytes = serialize(&negative_zero).unwrap();
    assert_eq!(&bytes[5..], b"0.00");
    assert_eq!(deserialize(&bytes).unwrap().to_canonical_bytes().unwrap(), bytes);
}

#[cfg(feature = "smol_str")]
#[test]
fn test_smol_str_is_text() {
    use smol_str::SmolStr;

    let value = SmolStr::new("ação");
    assert_eq!(serialize(&value).unwrap(), serialize("ação").unwrap());
    assert_eq!(
        deserialize(&serialize(&value).unwrap()).unwrap(),
        Value::from("ação")
    );
}

#[cfg(feature = "fxhash")]
#[test]
fn test_fxhash_collections_match_std() {
    use canonical_chunk::{FxHashMap, FxHashSet};

    let mut fx_map = FxHashMap::default();
    let mut std_map = HashMap::new();
    for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
        fx_map.insert(k.to_string(), v);
        std_map.insert(k.to_string(), v);
    }
    assert_eq!(serialize(&fx_map).unwrap(), serialize(&std_map).unwrap());

    let fx_set: FxHashSet<i32> = [5, -5, 50].into_iter().collect();
    let std_set: HashSet<i32> = [50, 5, -5].into_iter().collect();
    assert_eq!(serialize(&fx_set).unwrap(), serialize(&std_set).unwrap());
}

#[cfg(feature = "ahash")]
#[test]
fn test_ahash_collections_match_std() {
    use ahash::{AHashMap, AHashSet};

    let mut a_map = AHashMap::new();
    let mut std_map = HashMap::new();
    for (k, v) in [("x", true), ("y", false)] {
        a_map.insert(k.to_string(), v);
        std_map.insert(k.to_string(), v);
    }
    assert_eq!(serialize(&a_map).unwrap(), serialize(&std_map).unwrap());

    let a_set: AHashSet<String> = ["p", "q"].iter().map(|s| s.to_string()).collect();
    let std_set: HashSet<String> = ["q", "p"].iter().map(|s| s.to_string()).collect();
    assert_eq!(serialize(&a_set).unwrap(), serialize(&std_set).unwrap());
}
