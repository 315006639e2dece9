//! Property tests over arbitrary generated JSON values: round-trip
//! serialize/parse identity and tape structural invariants.

use proptest::prelude::*;
use tapejson::{build_tape, serialize, Map, ParserConfig, Tape, Value};

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|v| Value::I64(v as i64)),
        (-1e6f64..1e6f64).prop_map(Value::F64),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::String),
    ];

    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-zA-Z][a-zA-Z0-9_]{0,8}", inner), 0..6).prop_map(|pairs| {
                let mut m = Map::new();
                for (k, v) in pairs {
                    m.insert(k, v);
                }
                Value::Map(m)
            }),
        ]
    })
}

fn check_container_partners(tape: &Tape) {
    use tapejson::tape::tag;
    let mut i = 0;
    while i < tape.len() {
        let (t, payload) = tape.entry(i);
        match t {
            tag::OBJ_BEGIN | tag::ARR_BEGIN => {
                let (end_tag, end_payload) = tape.entry(payload as usize);
                let expected_end = if t == tag::OBJ_BEGIN { tag::OBJ_END } else { tag::ARR_END };
                assert_eq!(end_tag, expected_end, "begin/end tag mismatch at {i}");
                assert_eq!(end_payload as usize, i, "end's partner payload must point back to begin");
            }
            tag::INT64 | tag::DOUBLE => {
                i += 1; // consume the raw-bits word too
            }
            _ => {}
        }
        i += 1;
    }
}

proptest! {
    #[test]
    fn serialize_then_parse_is_identity(value in arb_value()) {
        let bytes = serialize(&value);
        let reparsed = tapejson::parse_safe(&bytes, ParserConfig::default())
            .expect("serializer output must be valid JSON");
        prop_assert_eq!(value, reparsed);
    }

    #[test]
    fn tape_container_partners_are_symmetric(value in arb_value()) {
        let bytes = serialize(&value);
        let tape = build_tape(&bytes, ParserConfig::default()).expect("valid JSON");
        check_container_partners(&tape);
    }

    #[test]
    fn tape_entry_count_matches_numeric_leaf_count(value in arb_value()) {
        let bytes = serialize(&value);
        let tape = build_tape(&bytes, ParserConfig::default()).expect("valid JSON");

        fn count_numbers(v: &Value) -> usize {
            match v {
                Value::I64(_) | Value::F64(_) => 1,
                Value::Array(items) => items.iter().map(count_numbers).sum(),
                Value::Map(m) => m.iter().map(|(_, v)| count_numbers(v)).sum(),
                _ => 0,
            }
        }

        use tapejson::tape::tag;
        let mut numeric_entries = 0;
        let mut i = 0;
        while i < tape.len() {
            let (t, _) = tape.entry(i);
            if t == tag::INT64 || t == tag::DOUBLE {
                numeric_entries += 1;
                i += 2;
            } else {
                i += 1;
            }
        }
        prop_assert_eq!(numeric_entries, count_numbers(&value));
    }
}
