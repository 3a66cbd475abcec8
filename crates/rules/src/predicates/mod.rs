//! Predicates and their arguments
//!
//! A predicate is a named boolean check over a value plus a fixed list of
//! bound arguments. The engine ships a closed set of [`BuiltinPredicate`]s and
//! accepts user predicates through the [`Predicate`] trait; both are looked up
//! by name in a [`PredicateCatalog`].
//!
//! Every predicate declares an ordered parameter list whose **last** entry is
//! the validated input. Argument binding pairs the declared names with the
//! supplied values and pads anything missing with [`Arg::Undefined`], which is
//! distinct from `null`.
//!
//! # Examples
//!
//! ```
//! use nebula_rules::predicates::{Arg, PredicateCatalog};
//!
//! let catalog = PredicateCatalog::builtin();
//! let bindings = catalog.arg_list("gt?", vec![Arg::from(18)]).unwrap();
//! assert_eq!(bindings[0].name, "num");
//! assert_eq!(bindings[1].value, Arg::Undefined);
//! ```

pub mod builtin;
pub mod catalog;

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::foundation::{SchemaError, ValueShape};

pub use builtin::BuiltinPredicate;
pub use catalog::PredicateCatalog;

// ============================================================================
// PREDICATE TRAIT
// ============================================================================

/// A named boolean check with a fixed parameter list.
///
/// # Examples
///
/// ```
/// use nebula_rules::predicates::{Arg, Predicate};
///
/// #[derive(Debug)]
/// struct Uppercase;
///
/// impl Predicate for Uppercase {
///     fn name(&self) -> &str {
///         "uppercase?"
///     }
///
///     fn params(&self) -> &[&'static str] {
///         &["input"]
///     }
///
///     fn call(&self, _args: &[Arg], input: &Arg) -> bool {
///         input
///             .as_value()
///             .and_then(|v| v.as_str())
///             .is_some_and(|s| s.chars().all(char::is_uppercase))
///     }
/// }
///
/// assert!(Uppercase.call(&[], &Arg::from("ABC")));
/// ```
pub trait Predicate: fmt::Debug + Send + Sync {
    /// Registered name, conventionally ending in `?`.
    fn name(&self) -> &str;

    /// Ordered parameter names; the last one is the validated input.
    fn params(&self) -> &[&'static str];

    /// Total number of parameters, input included.
    fn arity(&self) -> usize {
        self.params().len()
    }

    /// Checks bound arguments when a rule is constructed.
    ///
    /// `args` holds every parameter except the input, in declaration order.
    fn check_args(&self, args: &[Arg]) -> Result<(), SchemaError> {
        let _ = args;
        Ok(())
    }

    /// Compiles the pattern string input must match, if the predicate has one.
    ///
    /// Runs once when a rule is constructed, after [`Predicate::check_args`].
    /// Rule nodes holding a pattern evaluate with it instead of calling
    /// [`Predicate::call`].
    fn compile_pattern(&self, args: &[Arg]) -> Result<Option<Regex>, SchemaError> {
        let _ = args;
        Ok(None)
    }

    /// Evaluates the predicate.
    ///
    /// `args` holds the bound arguments (input excluded); `input` is the value
    /// at the rule's path, or [`Arg::Undefined`] when nothing is there.
    fn call(&self, args: &[Arg], input: &Arg) -> bool;
}

// ============================================================================
// ARGUMENTS
// ============================================================================

/// An argument value bound to a predicate parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arg {
    /// No value supplied. Distinct from [`Value::Null`].
    Undefined,
    /// A concrete value.
    Value(Value),
    /// An inclusive integer range, e.g. `size?(2..=5)`.
    Range {
        /// Lower bound, inclusive.
        start: i64,
        /// Upper bound, inclusive.
        end: i64,
    },
}

impl Arg {
    /// Creates an inclusive range argument.
    #[must_use]
    pub fn range(start: i64, end: i64) -> Self {
        Self::Range { start, end }
    }

    /// Creates a list argument.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Value(Value::Array(items.into_iter().map(Into::into).collect()))
    }

    /// Returns the shape used for message lookup.
    #[must_use]
    pub fn shape(&self) -> ValueShape {
        match self {
            Self::Undefined => ValueShape::Undefined,
            Self::Value(value) => ValueShape::of(value),
            Self::Range { .. } => ValueShape::Range,
        }
    }

    /// Returns the wrapped value, if any.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the argument as a number, if it is one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    /// Returns `true` for [`Arg::Undefined`].
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&Value> for Arg {
    fn from(value: &Value) -> Self {
        Self::Value(value.clone())
    }
}

impl From<Option<&Value>> for Arg {
    fn from(value: Option<&Value>) -> Self {
        value.map_or(Self::Undefined, Self::from)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Self::Value(value.into())
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Self::Value(value.into())
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Self::Value(value.into())
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::Value(value.into())
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Value(value.into())
    }
}

impl From<std::ops::RangeInclusive<i64>> for Arg {
    fn from(range: std::ops::RangeInclusive<i64>) -> Self {
        Self::range(*range.start(), *range.end())
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Value(Value::String(s)) => f.write_str(s),
            Self::Value(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match item {
                        Value::String(s) => f.write_str(s)?,
                        other => write!(f, "{other}")?,
                    }
                }
                Ok(())
            }
            Self::Value(other) => write!(f, "{other}"),
            Self::Range { start, end } => write!(f, "{start}..{end}"),
        }
    }
}

/// A parameter name paired with its bound argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgBinding {
    /// Declared parameter name.
    pub name: String,
    /// Bound value, or [`Arg::Undefined`] for the input slot.
    pub value: Arg,
}

impl ArgBinding {
    /// Creates a binding.
    pub fn new(name: impl Into<String>, value: Arg) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

// ============================================================================
// PREDICATE HANDLE
// ============================================================================

/// A shared handle to a catalog predicate.
///
/// Equality compares names only, so two rule trees built from the same
/// declarations compare equal even when they came from different catalogs.
#[derive(Clone)]
pub struct PredicateRef(Arc<dyn Predicate>);

impl PredicateRef {
    /// Wraps a predicate.
    pub fn new(predicate: Arc<dyn Predicate>) -> Self {
        Self(predicate)
    }

    /// Returns the predicate name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Returns the underlying predicate.
    #[must_use]
    pub fn get(&self) -> &dyn Predicate {
        self.0.as_ref()
    }
}

impl fmt::Debug for PredicateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PredicateRef").field(&self.name()).finish()
    }
}

impl PartialEq for PredicateRef {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}
