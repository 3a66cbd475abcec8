//! Coercion of form-style string input
//!
//! Form and query parameters arrive as strings. A params schema coerces each
//! declared key to its declared type before any rule runs, so `"18"` checked
//! with `int?` and `gt?(18)` reports the comparison rather than the type.
//! A value that does not parse is left untouched and its type predicate
//! reports it.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::schema::ValueType;

/// How a declared key is coerced.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Coercion {
    /// Left as is.
    #[default]
    Any,
    /// Coerced to a scalar type.
    Scalar(ValueType),
    /// A map whose keys are coerced individually.
    Hash(IndexMap<String, Coercion>),
    /// A sequence whose elements share one coercion.
    Array(Box<Coercion>),
}

impl Coercion {
    /// Returns `true` if applying this coercion never changes a value.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        match self {
            Self::Any => true,
            Self::Scalar(ty) => matches!(ty, ValueType::String | ValueType::Hash | ValueType::Array),
            Self::Hash(keys) => keys.values().all(Coercion::is_identity),
            Self::Array(inner) => inner.is_identity(),
        }
    }

    /// Merges what is known about a key from another declaration.
    #[must_use]
    pub fn refine(self, other: Coercion) -> Coercion {
        match (self, other) {
            (Self::Any, other) => other,
            (Self::Hash(mut mine), Self::Hash(theirs)) => {
                for (key, coercion) in theirs {
                    let merged = mine.shift_remove(&key).unwrap_or_default().refine(coercion);
                    mine.insert(key, merged);
                }
                Self::Hash(mine)
            }
            (Self::Array(mine), Self::Array(theirs)) => Self::Array(Box::new(mine.refine(*theirs))),
            (Self::Scalar(ValueType::Hash), hash @ Self::Hash(_)) => hash,
            (Self::Scalar(ValueType::Array), array @ Self::Array(_)) => array,
            (mine, _) => mine,
        }
    }

    /// Coerces `value`.
    #[must_use]
    pub fn apply(&self, value: Value) -> Value {
        match (self, value) {
            (Self::Any, value) => value,
            (Self::Scalar(ty), value) => coerce_scalar(*ty, value),
            (Self::Hash(keys), Value::Object(map)) => Value::Object(coerce_map(keys, map)),
            (Self::Array(inner), Value::Array(items)) => {
                Value::Array(items.into_iter().map(|item| inner.apply(item)).collect())
            }
            (Self::Array(_), Value::String(s)) if s.is_empty() => Value::Array(Vec::new()),
            (_, value) => value,
        }
    }
}

fn coerce_map(keys: &IndexMap<String, Coercion>, mut map: Map<String, Value>) -> Map<String, Value> {
    for (key, coercion) in keys {
        if let Some(value) = map.get_mut(key) {
            let taken = std::mem::take(value);
            *value = coercion.apply(taken);
        }
    }
    map
}

fn coerce_scalar(ty: ValueType, value: Value) -> Value {
    let text = match value {
        Value::String(text) => text,
        other => return other,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() && !matches!(ty, ValueType::String) {
        return Value::Null;
    }

    let coerced = match ty {
        ValueType::Integer => parse_integer(trimmed),
        ValueType::Float => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        ValueType::Number => parse_integer(trimmed).or_else(|| {
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
        }),
        ValueType::Bool => parse_bool(trimmed).map(Value::Bool),
        ValueType::Nil | ValueType::String | ValueType::Hash | ValueType::Array => None,
    };
    coerced.unwrap_or(Value::String(text))
}

fn parse_integer(text: &str) -> Option<Value> {
    text.parse::<i64>()
        .map(Value::from)
        .or_else(|_| text.parse::<u64>().map(Value::from))
        .ok()
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "1" | "on" | "t" | "true" | "y" | "yes" => Some(true),
        "0" | "off" | "f" | "false" | "n" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(ValueType::Integer, json!("18"), json!(18))]
    #[case(ValueType::Integer, json!(" 7 "), json!(7))]
    #[case(ValueType::Integer, json!("1.5"), json!("1.5"))]
    #[case(ValueType::Integer, json!(""), json!(null))]
    #[case(ValueType::Integer, json!(18), json!(18))]
    #[case(ValueType::Float, json!("45.6"), json!(45.6))]
    #[case(ValueType::Float, json!("abc"), json!("abc"))]
    #[case(ValueType::Number, json!("3"), json!(3))]
    #[case(ValueType::Number, json!("3.5"), json!(3.5))]
    #[case(ValueType::Bool, json!("yes"), json!(true))]
    #[case(ValueType::Bool, json!("0"), json!(false))]
    #[case(ValueType::Bool, json!("maybe"), json!("maybe"))]
    #[case(ValueType::String, json!(""), json!(""))]
    fn scalar_coercion(#[case] ty: ValueType, #[case] input: Value, #[case] expected: Value) {
        assert_eq!(Coercion::Scalar(ty).apply(input), expected);
    }

    #[test]
    fn nested_maps_and_arrays() {
        let plan = Coercion::Hash(IndexMap::from([
            ("age".to_owned(), Coercion::Scalar(ValueType::Integer)),
            (
                "scores".to_owned(),
                Coercion::Array(Box::new(Coercion::Scalar(ValueType::Float))),
            ),
            (
                "address".to_owned(),
                Coercion::Hash(IndexMap::from([(
                    "zip".to_owned(),
                    Coercion::Scalar(ValueType::Integer),
                )])),
            ),
        ]));
        let input = json!({
            "age": "30",
            "scores": ["1.5", "x"],
            "address": {"zip": "12345", "city": "Krakow"},
            "extra": "1"
        });
        assert_eq!(
            plan.apply(input),
            json!({
                "age": 30,
                "scores": [1.5, "x"],
                "address": {"zip": 12345, "city": "Krakow"},
                "extra": "1"
            })
        );
    }

    #[test]
    fn blank_array_becomes_empty() {
        let plan = Coercion::Array(Box::new(Coercion::Any));
        assert_eq!(plan.apply(json!("")), json!([]));
    }

    #[test]
    fn refine_keeps_the_most_specific_plan() {
        let hash = Coercion::Hash(IndexMap::from([("a".to_owned(), Coercion::Any)]));
        assert_eq!(Coercion::Scalar(ValueType::Hash).refine(hash.clone()), hash);
        assert_eq!(Coercion::Any.refine(Coercion::Scalar(ValueType::Bool)), Coercion::Scalar(ValueType::Bool));
        assert!(Coercion::Scalar(ValueType::String).is_identity());
        assert!(!Coercion::Scalar(ValueType::Integer).is_identity());
    }

    proptest! {
        #[test]
        fn integers_round_trip_through_strings(n in any::<i64>()) {
            let coerced = Coercion::Scalar(ValueType::Integer).apply(Value::String(n.to_string()));
            prop_assert_eq!(coerced, json!(n));
        }

        #[test]
        fn non_strings_are_untouched(n in any::<i64>(), b in any::<bool>()) {
            for ty in [ValueType::Integer, ValueType::Float, ValueType::Bool] {
                prop_assert_eq!(Coercion::Scalar(ty).apply(json!(n)), json!(n));
                prop_assert_eq!(Coercion::Scalar(ty).apply(json!(b)), json!(b));
            }
        }
    }
}
