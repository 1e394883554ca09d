use bigdecimal::BigDecimal;
use canonical_chunk::{deserialize, serialize, Encode, Value};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;

#[derive(Encode)]
struct User {
    #[chunk(rename = "user_id")]
    id: u64,
    name: String,
    nickname: Option<String>,
    #[chunk(skip)]
    #[allow(dead_code)]
    cache: Vec<u8>,
}

#[derive(Encode)]
struct Point(i32, i32);

#[derive(Encode)]
struct Marker;

#[derive(Encode)]
enum Shape {
    Empty,
    Circle(f64),
    Rect {
        w: u32,
        h: u32,
    },
    #[chunk(rename = "tri")]
    Triangle(u8, u8, u8),
}

#[derive(Encode)]
struct Tagged<T> {
    tags: T,
}

#[derive(Encode)]
enum Never {}

fn number(text: &str) -> Value {
    Value::Number(BigDecimal::from_str(text).unwrap())
}

fn ordered(entries: Vec<(&str, Value)>) -> Value {
    Value::OrderedMap(
        entries
            .into_iter()
            .map(|(k, v)| (Value::from(k), v))
            .collect::<IndexMap<_, _>>(),
    )
}

#[test]
fn test_named_struct_is_ordered_map() {
    let user = User {
        id: 7,
        name: "ana".to_string(),
        nickname: None,
        cache: vec![1, 2, 3],
    };
    let decoded = deserialize(&serialize(&user).unwrap()).unwrap();
    assert_eq!(
        decoded,
        ordered(vec![("user_id", number("7")), ("name", Value::from("ana"))])
    );

    let mut expected = IndexMap::new();
    expected.insert("user_id", Value::from(7u64));
    expected.insert("name", Value::from("ana"));
    assert_eq!(serialize(&user).unwrap(), serialize(&expected).unwrap());
}

#[test]
fn test_option_field_written_when_present() {
    let user = User {
        id: 1,
        name: "bo".to_string(),
        nickname: Some("b".to_string()),
        cache: Vec::new(),
    };
    let decoded = deserialize(&serialize(&user).unwrap()).unwrap();
    assert_eq!(
        decoded,
        ordered(vec![
            ("user_id", number("1")),
            ("name", Value::from("bo")),
            ("nickname", Value::from("b")),
        ])
    );
}

#[test]
fn test_tuple_and_unit_structs() {
    let point = deserialize(&serialize(&Point(1, -2)).unwrap()).unwrap();
    assert_eq!(point, Value::List(vec![number("1"), number("-2")]));

    let marker = deserialize(&serialize(&Marker).unwrap()).unwrap();
    assert_eq!(marker, Value::List(Vec::new()));
}

#[test]
fn test_enum_variants() {
    let empty = deserialize(&serialize(&Shape::Empty).unwrap()).unwrap();
    assert_eq!(empty, Value::from("Empty"));

    let circle = deserialize(&serialize(&Shape::Circle(1.5)).unwrap()).unwrap();
    assert_eq!(
        circle,
        ordered(vec![("Circle", Value::List(vec![number("1.5")]))])
    );

    let rect = deserialize(&serialize(&Shape::Rect { w: 2, h: 3 }).unwrap()).unwrap();
    assert_eq!(
        rect,
        ordered(vec![(
            "Rect",
            ordered(vec![("w", number("2")), ("h", number("3"))])
        )])
    );

    let tri = deserialize(&serialize(&Shape::Triangle(1, 2, 3)).unwrap()).unwrap();
    assert_eq!(
        tri,
        ordered(vec![(
            "tri",
            Value::List(vec![
                Value::from(1u8),
                Value::from(2u8),
                Value::from(3u8)
            ])
        )])
    );
}

#[test]
fn test_generic_struct_stays_canonical() {
    let first = Tagged {
        tags: ["x", "y", "z"].into_iter().collect::<HashSet<_>>(),
    };
    let second = Tagged {
        tags: ["z", "y", "x"].into_iter().collect::<HashSet<_>>(),
    };
    assert_eq!(serialize(&first).unwrap(), serialize(&second).unwrap());

    let decoded = deserialize(&serialize(&first).unwrap()).unwrap();
    let tags: BTreeSet<Value> = ["x", "y", "z"].into_iter().map(Value::from).collect();
    assert_eq!(decoded, ordered(vec![("tags", Value::Set(tags))]));
}

#[test]
fn test_empty_enum_compiles() {
    fn assert_encoder<T: canonical_chunk::Encoder>() {}
    assert_encoder::<Never>();
}
