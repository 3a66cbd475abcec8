//! Built-in predicates
//!
//! The closed set of predicates every catalog starts with. Type predicates
//! (`str?`, `int?`, `hash?`, ...) never look at bound arguments; value
//! predicates return `false` for inputs of the wrong shape instead of failing,
//! because type checks are expected to run before them.

use regex::Regex;
use serde_json::Value;

use crate::foundation::{SchemaError, ValueShape};
use crate::predicates::{Arg, Predicate};

/// Every predicate shipped with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BuiltinPredicate {
    /// `key?(name, input)`: the map has the key.
    Key,
    /// `filled?(input)`: not null, undefined or an empty string/array/map.
    Filled,
    /// `empty?(input)`: null or an empty string/array/map.
    Empty,
    /// `nil?(input)`: null or undefined.
    Nil,
    /// `str?(input)`.
    Str,
    /// `int?(input)`.
    Int,
    /// `float?(input)`.
    Float,
    /// `number?(input)`: integer or float.
    Number,
    /// `bool?(input)`.
    Bool,
    /// `hash?(input)`.
    Hash,
    /// `array?(input)`.
    Array,
    /// `true?(input)`.
    True,
    /// `false?(input)`.
    False,
    /// `gt?(num, input)`.
    Gt,
    /// `gteq?(num, input)`.
    Gteq,
    /// `lt?(num, input)`.
    Lt,
    /// `lteq?(num, input)`.
    Lteq,
    /// `eql?(left, input)`.
    Eql,
    /// `not_eql?(left, input)`.
    NotEql,
    /// `size?(size, input)`: exact size or size within a range.
    Size,
    /// `min_size?(num, input)`.
    MinSize,
    /// `max_size?(num, input)`.
    MaxSize,
    /// `included_in?(list, input)`.
    IncludedIn,
    /// `excluded_from?(list, input)`.
    ExcludedFrom,
    /// `format?(regex, input)`.
    Format,
    /// `odd?(input)`.
    Odd,
    /// `even?(input)`.
    Even,
}

impl BuiltinPredicate {
    /// All built-in predicates in registration order.
    pub const ALL: &'static [BuiltinPredicate] = &[
        Self::Key,
        Self::Filled,
        Self::Empty,
        Self::Nil,
        Self::Str,
        Self::Int,
        Self::Float,
        Self::Number,
        Self::Bool,
        Self::Hash,
        Self::Array,
        Self::True,
        Self::False,
        Self::Gt,
        Self::Gteq,
        Self::Lt,
        Self::Lteq,
        Self::Eql,
        Self::NotEql,
        Self::Size,
        Self::MinSize,
        Self::MaxSize,
        Self::IncludedIn,
        Self::ExcludedFrom,
        Self::Format,
        Self::Odd,
        Self::Even,
    ];

    /// Registered name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Key => "key?",
            Self::Filled => "filled?",
            Self::Empty => "empty?",
            Self::Nil => "nil?",
            Self::Str => "str?",
            Self::Int => "int?",
            Self::Float => "float?",
            Self::Number => "number?",
            Self::Bool => "bool?",
            Self::Hash => "hash?",
            Self::Array => "array?",
            Self::True => "true?",
            Self::False => "false?",
            Self::Gt => "gt?",
            Self::Gteq => "gteq?",
            Self::Lt => "lt?",
            Self::Lteq => "lteq?",
            Self::Eql => "eql?",
            Self::NotEql => "not_eql?",
            Self::Size => "size?",
            Self::MinSize => "min_size?",
            Self::MaxSize => "max_size?",
            Self::IncludedIn => "included_in?",
            Self::ExcludedFrom => "excluded_from?",
            Self::Format => "format?",
            Self::Odd => "odd?",
            Self::Even => "even?",
        }
    }

    /// Looks a built-in up by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == name)
    }

    fn invalid(self, param: &str, expected: &'static str, arg: &Arg) -> SchemaError {
        SchemaError::InvalidArgument {
            name: self.as_str().to_owned(),
            param: param.to_owned(),
            expected,
            actual: arg.shape(),
        }
    }
}

// ============================================================================
// PREDICATE IMPLEMENTATION
// ============================================================================

impl Predicate for BuiltinPredicate {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn params(&self) -> &[&'static str] {
        match self {
            Self::Key => &["name", "input"],
            Self::Gt | Self::Gteq | Self::Lt | Self::Lteq | Self::MinSize | Self::MaxSize => {
                &["num", "input"]
            }
            Self::Eql | Self::NotEql => &["left", "input"],
            Self::Size => &["size", "input"],
            Self::IncludedIn | Self::ExcludedFrom => &["list", "input"],
            Self::Format => &["regex", "input"],
            _ => &["input"],
        }
    }

    fn check_args(&self, args: &[Arg]) -> Result<(), SchemaError> {
        let Some(arg) = args.first() else {
            return Ok(());
        };
        let param = self.params()[0];
        match self {
            Self::Key => match arg.as_value() {
                Some(Value::String(_)) => Ok(()),
                _ => Err(self.invalid(param, "a string", arg)),
            },
            Self::Gt | Self::Gteq | Self::Lt | Self::Lteq => match arg.as_value() {
                Some(Value::Number(_)) => Ok(()),
                _ => Err(self.invalid(param, "a number", arg)),
            },
            Self::MinSize | Self::MaxSize => match arg.as_value().and_then(Value::as_u64) {
                Some(_) => Ok(()),
                None => Err(self.invalid(param, "a non-negative integer", arg)),
            },
            Self::Size => match arg {
                Arg::Range { start, end } if start <= end => Ok(()),
                Arg::Value(value) if value.as_u64().is_some() => Ok(()),
                _ => Err(self.invalid(param, "a non-negative integer or a range", arg)),
            },
            Self::IncludedIn | Self::ExcludedFrom => match arg {
                Arg::Range { .. } | Arg::Value(Value::Array(_)) => Ok(()),
                _ => Err(self.invalid(param, "a list or a range", arg)),
            },
            Self::Eql | Self::NotEql => match arg {
                Arg::Value(_) => Ok(()),
                _ => Err(self.invalid(param, "a value", arg)),
            },
            Self::Format => match arg.as_value() {
                Some(Value::String(_)) => Ok(()),
                _ => Err(self.invalid(param, "a pattern string", arg)),
            },
            _ => Ok(()),
        }
    }

    fn compile_pattern(&self, args: &[Arg]) -> Result<Option<Regex>, SchemaError> {
        let pattern = match (self, args.first().and_then(Arg::as_value)) {
            (Self::Format, Some(Value::String(pattern))) => pattern,
            _ => return Ok(None),
        };
        Regex::new(pattern).map(Some).map_err(|e| SchemaError::InvalidPattern {
            name: self.as_str().to_owned(),
            reason: e.to_string(),
        })
    }

    fn call(&self, args: &[Arg], input: &Arg) -> bool {
        let value = input.as_value();
        let first = args.first().unwrap_or(&Arg::Undefined);
        match self {
            Self::Key => match (value, first.as_value()) {
                (Some(Value::Object(map)), Some(Value::String(name))) => map.contains_key(name),
                _ => false,
            },
            Self::Filled => !is_empty(input),
            Self::Empty => is_empty(input),
            Self::Nil => matches!(input, Arg::Undefined | Arg::Value(Value::Null)),
            Self::Str => input.shape() == ValueShape::String,
            Self::Int => input.shape() == ValueShape::Integer,
            Self::Float => input.shape() == ValueShape::Float,
            Self::Number => matches!(input.shape(), ValueShape::Integer | ValueShape::Float),
            Self::Bool => input.shape() == ValueShape::Bool,
            Self::Hash => input.shape() == ValueShape::Hash,
            Self::Array => input.shape() == ValueShape::Array,
            Self::True => value == Some(&Value::Bool(true)),
            Self::False => value == Some(&Value::Bool(false)),
            Self::Gt => compare(first, input, |num, v| v > num),
            Self::Gteq => compare(first, input, |num, v| v >= num),
            Self::Lt => compare(first, input, |num, v| v < num),
            Self::Lteq => compare(first, input, |num, v| v <= num),
            Self::Eql => first.as_value() == value,
            Self::NotEql => first.as_value() != value,
            Self::Size => size_of(input).is_some_and(|size| match first {
                Arg::Range { start, end } => (*start..=*end).contains(&(size as i64)),
                other => other.as_value().and_then(Value::as_u64) == Some(size as u64),
            }),
            Self::MinSize => match (size_of(input), first.as_value().and_then(Value::as_u64)) {
                (Some(size), Some(min)) => size as u64 >= min,
                _ => false,
            },
            Self::MaxSize => match (size_of(input), first.as_value().and_then(Value::as_u64)) {
                (Some(size), Some(max)) => size as u64 <= max,
                _ => false,
            },
            Self::IncludedIn => included(first, input),
            Self::ExcludedFrom => !input.is_undefined() && !included(first, input),
            // Rule nodes match with the pattern compiled at construction.
            Self::Format => match (value, first.as_value()) {
                (Some(Value::String(s)), Some(Value::String(pattern))) => {
                    Regex::new(pattern).is_ok_and(|re| re.is_match(s))
                }
                _ => false,
            },
            Self::Odd => value.and_then(Value::as_i64).is_some_and(|n| n % 2 != 0),
            Self::Even => value.and_then(Value::as_i64).is_some_and(|n| n % 2 == 0),
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn is_empty(input: &Arg) -> bool {
    match input {
        Arg::Undefined | Arg::Value(Value::Null) => true,
        Arg::Value(Value::String(s)) => s.is_empty(),
        Arg::Value(Value::Array(items)) => items.is_empty(),
        Arg::Value(Value::Object(map)) => map.is_empty(),
        _ => false,
    }
}

fn size_of(input: &Arg) -> Option<usize> {
    match input.as_value()? {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

fn compare(num: &Arg, input: &Arg, op: impl Fn(f64, f64) -> bool) -> bool {
    match (num.as_f64(), input.as_value()) {
        (Some(num), Some(Value::Number(v))) => v.as_f64().is_some_and(|v| op(num, v)),
        _ => false,
    }
}

fn included(list: &Arg, input: &Arg) -> bool {
    match (list, input.as_value()) {
        (Arg::Range { start, end }, Some(Value::Number(n))) => n
            .as_f64()
            .is_some_and(|v| v >= *start as f64 && v <= *end as f64),
        (Arg::Value(Value::Array(items)), Some(value)) => items.contains(value),
        _ => false,
    }
}
