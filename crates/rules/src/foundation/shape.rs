//! Runtime shape of values and predicate arguments.
//!
//! Message lookup classifies arguments and values by shape (for example a
//! range argument selects `arg.range` templates), so the shape is a small
//! closed enum that can be used as a configuration key.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The runtime shape of a value or argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// The "no value supplied" sentinel.
    Undefined,
    /// `null`.
    Null,
    /// `true` / `false`.
    Bool,
    /// A number without a fractional part.
    Integer,
    /// A number with a fractional part.
    Float,
    /// A string.
    String,
    /// A sequence.
    Array,
    /// A map.
    Hash,
    /// An inclusive numeric range argument.
    Range,
}

impl ValueShape {
    /// Classifies a JSON value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(n) if n.is_f64() => Self::Float,
            Value::Number(_) => Self::Integer,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Hash,
        }
    }

    /// Human readable name, used in type-mismatch diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
            Self::Hash => "hash",
            Self::Range => "range",
        }
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
