//! Encoding a value and decoding the text gives the value back

use proptest::prelude::*;

use resinsight_cmd::marshal::{encode, parse_value};
use resinsight_cmd::{DiagnosticsCollector, EnumDef, NoObjects, Value, ValueType};

static CELL_RESULT: EnumDef = EnumDef::new("CellResult", &["SOIL", "SWAT", "PRESSURE", "FIPNUM"]);
static STRING: ValueType = ValueType::String;
static INT: ValueType = ValueType::Int;

fn decode(text: &str, ty: &ValueType) -> (Option<Value>, usize) {
    let mut reader = DiagnosticsCollector::new(text);
    let value = parse_value(&mut reader, ty, &NoObjects);
    (value, reader.error_count())
}

fn awkward_string() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ,\"\\\\\\[\\]()]{0,16}",
        any::<String>(),
    ]
}

proptest! {
    #[test]
    fn strings_round_trip(s in awkward_string()) {
        let (value, errors) = decode(&encode(&Value::String(s.clone())), &ValueType::String);
        prop_assert_eq!(errors, 0);
        prop_assert_eq!(value, Some(Value::String(s)));
    }

    #[test]
    fn ints_round_trip(i in any::<i64>()) {
        let (value, errors) = decode(&encode(&Value::Int(i)), &ValueType::Int);
        prop_assert_eq!(errors, 0);
        prop_assert_eq!(value, Some(Value::Int(i)));
    }

    #[test]
    fn doubles_keep_fifteen_digits(d in -1.0e300f64..1.0e300) {
        let text = encode(&Value::Double(d));
        let (value, errors) = decode(&text, &ValueType::Double);
        prop_assert_eq!(errors, 0);

        let back = value.and_then(|v| v.as_double()).unwrap();
        prop_assert!((back - d).abs() <= d.abs() * 1e-14, "{} -> {} -> {}", d, text, back);
    }

    #[test]
    fn enums_round_trip(index in 0..CELL_RESULT.variants.len()) {
        let name = CELL_RESULT.variants[index];
        let (value, errors) = decode(&encode(&Value::Enum(name.to_string())), &ValueType::Enum(&CELL_RESULT));
        prop_assert_eq!(errors, 0);
        prop_assert_eq!(value, Some(Value::Enum(name.to_string())));
    }

    #[test]
    fn string_arrays_are_not_split_inside_quotes(items in prop::collection::vec(awkward_string(), 0..6)) {
        let array = Value::Array(items.into_iter().map(Value::String).collect());
        let (value, errors) = decode(&encode(&array), &ValueType::Array(&STRING));
        prop_assert_eq!(errors, 0);
        prop_assert_eq!(value, Some(array));
    }

    #[test]
    fn int_arrays_round_trip(items in prop::collection::vec(any::<i64>(), 0..8)) {
        let array = Value::Array(items.into_iter().map(Value::Int).collect());
        let (value, errors) = decode(&encode(&array), &ValueType::Array(&INT));
        prop_assert_eq!(errors, 0);
        prop_assert_eq!(value, Some(array));
    }

    #[test]
    fn bools_ignore_letter_case(value in any::<bool>(), upper in prop::collection::vec(any::<bool>(), 5)) {
        let text: String = if value { "true" } else { "false" }
            .chars()
            .zip(&upper)
            .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c })
            .collect();
        let (decoded, errors) = decode(&text, &ValueType::Bool);
        prop_assert_eq!(errors, 0);
        prop_assert_eq!(decoded, Some(Value::Bool(value)));
    }

    #[test]
    fn other_bool_tokens_are_false_with_one_error(token in "[a-zA-Z0-9_]{1,8}") {
        prop_assume!(!token.eq_ignore_ascii_case("true") && !token.eq_ignore_ascii_case("false"));
        let (decoded, errors) = decode(&token, &ValueType::Bool);
        prop_assert_eq!(errors, 1);
        prop_assert_eq!(decoded, Some(Value::Bool(false)));
    }
}

#[test]
fn empty_and_singleton_arrays() {
    for array in [
        Value::Array(Vec::new()),
        Value::Array(vec![Value::from("a, b")]),
    ] {
        assert_eq!(decode(&encode(&array), &ValueType::Array(&STRING)), (Some(array), 0));
    }
    assert_eq!(encode(&Value::Array(Vec::new())), "[]");
}
