//! Builders for declaring schemas
//!
//! The builders are a thin layer over [`RuleNode`]: every key declaration
//! becomes one named top-level rule, and the predicates chained on a key are
//! joined with `and` in declaration order.
//!
//! ```
//! use nebula_rules::predicates::PredicateCatalog;
//! use nebula_rules::schema::{Schema, ValueType};
//! use serde_json::json;
//!
//! let catalog = PredicateCatalog::builtin();
//! let schema = Schema::define(&catalog, |s| {
//!     s.required("meta", |v| {
//!         v.schema(|s| s.required("info", |v| v.schema(|s| s.required("details", |v| v.filled_as(ValueType::String)))))
//!     })
//! })?;
//!
//! assert_eq!(schema.call(&json!({})).messages().to_json(), json!({"meta": ["is missing"]}));
//! # Ok::<(), nebula_rules::foundation::SchemaError>(())
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::foundation::SchemaError;
use crate::predicates::{Arg, BuiltinPredicate, PredicateCatalog};
use crate::rule::{NamedRule, RuleNode};
use crate::schema::{Coercion, Schema};

// ============================================================================
// VALUE TYPES
// ============================================================================

/// Declared type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// `str?`
    String,
    /// `int?`
    Integer,
    /// `float?`
    Float,
    /// `number?`
    Number,
    /// `bool?`
    Bool,
    /// `nil?`
    Nil,
    /// `hash?`
    Hash,
    /// `array?`
    Array,
}

impl ValueType {
    /// The predicate checking this type.
    #[must_use]
    pub const fn predicate(self) -> BuiltinPredicate {
        match self {
            Self::String => BuiltinPredicate::Str,
            Self::Integer => BuiltinPredicate::Int,
            Self::Float => BuiltinPredicate::Float,
            Self::Number => BuiltinPredicate::Number,
            Self::Bool => BuiltinPredicate::Bool,
            Self::Nil => BuiltinPredicate::Nil,
            Self::Hash => BuiltinPredicate::Hash,
            Self::Array => BuiltinPredicate::Array,
        }
    }

    /// The type a predicate implies, if it is a type check.
    #[must_use]
    pub fn from_predicate(name: &str) -> Option<Self> {
        Some(match name {
            "str?" => Self::String,
            "int?" => Self::Integer,
            "float?" => Self::Float,
            "number?" => Self::Number,
            "bool?" | "true?" | "false?" => Self::Bool,
            "nil?" => Self::Nil,
            "hash?" => Self::Hash,
            "array?" => Self::Array,
            _ => return None,
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.predicate().as_str())
    }
}

// ============================================================================
// VALUE RULES
// ============================================================================

/// Predicates chained on one value.
///
/// Construction errors are kept and surface when the enclosing schema is
/// built, so declarations read as one expression.
#[derive(Debug)]
pub struct ValueRules<'c> {
    catalog: &'c PredicateCatalog,
    steps: Vec<RuleNode>,
    coercion: Coercion,
    hash_checked: bool,
    error: Option<SchemaError>,
}

impl<'c> ValueRules<'c> {
    fn new(catalog: &'c PredicateCatalog) -> Self {
        Self {
            catalog,
            steps: Vec::new(),
            coercion: Coercion::Any,
            hash_checked: false,
            error: None,
        }
    }

    fn push(mut self, node: Result<RuleNode, SchemaError>) -> Self {
        match node {
            Ok(node) => self.steps.push(node),
            Err(error) => {
                self.error.get_or_insert(error);
            }
        }
        self
    }

    fn coerce(mut self, coercion: Coercion) -> Self {
        self.coercion = std::mem::take(&mut self.coercion).refine(coercion);
        self
    }

    /// Checks the value's type.
    #[must_use]
    pub fn value(self, ty: ValueType) -> Self {
        self.pred(ty.predicate().as_str())
    }

    /// Requires a non-empty value.
    #[must_use]
    pub fn filled(self) -> Self {
        self.pred(BuiltinPredicate::Filled.as_str())
    }

    /// Requires a non-empty value of type `ty`.
    #[must_use]
    pub fn filled_as(self, ty: ValueType) -> Self {
        self.filled().value(ty)
    }

    /// Applies a predicate that takes no arguments besides the input.
    #[must_use]
    pub fn pred(self, name: &str) -> Self {
        self.pred_with(name, Vec::new())
    }

    /// Applies a predicate with bound arguments.
    #[must_use]
    pub fn pred_with(self, name: &str, args: Vec<Arg>) -> Self {
        let node = RuleNode::predicate(self.catalog, name, args);
        let this = match ValueType::from_predicate(name) {
            Some(ValueType::Hash) => Self {
                hash_checked: true,
                ..self
            },
            Some(ty) => self.coerce(Coercion::Scalar(ty)),
            None => self,
        };
        this.push(node)
    }

    /// Requires a predicate to fail.
    #[must_use]
    pub fn not(self, name: &str) -> Self {
        let node = RuleNode::predicate(self.catalog, name, Vec::new()).map(RuleNode::negate);
        self.push(node)
    }

    /// Appends a prebuilt rule.
    #[must_use]
    pub fn rule(self, node: RuleNode) -> Self {
        self.push(Ok(node))
    }

    /// Validates the value as a map with a nested schema.
    ///
    /// A `hash?` check is added first unless the chain already has one, so a
    /// wrong-typed value reports the type and skips the nested keys.
    #[must_use]
    pub fn schema(self, define: impl FnOnce(SchemaBuilder<'c>) -> SchemaBuilder<'c>) -> Self {
        let catalog = self.catalog;
        match define(SchemaBuilder::new(catalog)).finish() {
            Ok((rules, coercion)) => self.nested(rules, coercion),
            Err(error) => self.push(Err(error)),
        }
    }

    /// Validates the value as a map with an existing schema's rules.
    #[must_use]
    pub fn schema_from(self, schema: &Schema) -> Self {
        let rules = schema.rules().to_vec();
        let coercion = schema.coercion().cloned().unwrap_or_default();
        self.nested(rules, coercion)
    }

    fn nested(self, rules: Vec<NamedRule>, coercion: Coercion) -> Self {
        let this = if self.hash_checked {
            self
        } else {
            self.value(ValueType::Hash)
        };
        let set = RuleNode::set(
            SCHEMA_SET,
            rules.into_iter().map(|named| named.rule).collect(),
        );
        this.coerce(coercion).push(Ok(set))
    }

    /// Applies element rules to every element of a sequence.
    ///
    /// A value that is not a sequence reports `array?` once.
    #[must_use]
    pub fn each(self, define: impl FnOnce(ValueRules<'c>) -> ValueRules<'c>) -> Self {
        let catalog = self.catalog;
        let element = define(ValueRules::new(catalog));
        let coercion = Coercion::Array(Box::new(element.coercion.clone()));
        match element.into_rule() {
            Ok(Some(inner)) => self.coerce(coercion).push(Ok(RuleNode::each(inner))),
            Ok(None) => self.value(ValueType::Array),
            Err(error) => self.push(Err(error)),
        }
    }

    fn into_rule(self) -> Result<Option<RuleNode>, SchemaError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(self.steps.into_iter().reduce(RuleNode::and))
    }
}

/// Name of the rule set a nested schema compiles to.
pub const SCHEMA_SET: &str = "schema";

// ============================================================================
// SCHEMA BUILDER
// ============================================================================

/// Declares the keys of a map.
#[derive(Debug)]
pub struct SchemaBuilder<'c> {
    catalog: &'c PredicateCatalog,
    rules: Vec<NamedRule>,
    coercion: IndexMap<String, Coercion>,
    error: Option<SchemaError>,
}

impl<'c> SchemaBuilder<'c> {
    /// Creates a builder resolving predicates in `catalog`.
    #[must_use]
    pub fn new(catalog: &'c PredicateCatalog) -> Self {
        Self {
            catalog,
            rules: Vec::new(),
            coercion: IndexMap::new(),
            error: None,
        }
    }

    fn declare(
        mut self,
        name: &str,
        optional: bool,
        define: impl FnOnce(ValueRules<'c>) -> ValueRules<'c>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        if self.rules.iter().any(|r| r.name == name) {
            self.error = Some(SchemaError::DuplicateKey {
                name: name.to_owned(),
            });
            return self;
        }

        let rules = define(ValueRules::new(self.catalog));
        let coercion = rules.coercion.clone();
        let inner = match rules.into_rule() {
            Ok(inner) => inner,
            Err(error) => {
                self.error = Some(error);
                return self;
            }
        };

        let key_present = RuleNode::predicate(self.catalog, "key?", vec![Arg::from(name)]);
        let rule = match (inner, optional) {
            (Some(inner), false) => Ok(RuleNode::key(name, inner)),
            (Some(inner), true) => key_present.map(|present| present.then(RuleNode::key(name, inner))),
            // An empty set never fails, leaving only the presence check.
            (None, false) => Ok(RuleNode::key(name, RuleNode::set(name, Vec::new()))),
            (None, true) => {
                tracing::debug!(key = name, "optional key without rules always passes");
                return self;
            }
        };
        match rule {
            Ok(rule) => {
                self.rules.push(NamedRule::new(name, rule));
                self.coercion.insert(name.to_owned(), coercion);
            }
            Err(error) => self.error = Some(error),
        }
        self
    }

    /// Declares a key that must be present.
    #[must_use]
    pub fn required(
        self,
        name: &str,
        define: impl FnOnce(ValueRules<'c>) -> ValueRules<'c>,
    ) -> Self {
        self.declare(name, false, define)
    }

    /// Declares a key whose rules only apply when it is present.
    #[must_use]
    pub fn optional(
        self,
        name: &str,
        define: impl FnOnce(ValueRules<'c>) -> ValueRules<'c>,
    ) -> Self {
        self.declare(name, true, define)
    }

    /// Adds a prebuilt top-level rule.
    #[must_use]
    pub fn rule(mut self, name: &str, rule: RuleNode) -> Self {
        if self.error.is_some() {
            return self;
        }
        if self.rules.iter().any(|r| r.name == name) {
            self.error = Some(SchemaError::DuplicateKey {
                name: name.to_owned(),
            });
            return self;
        }
        self.rules.push(NamedRule::new(name, rule));
        self
    }

    /// Returns the declared rules and the coercion plan for the map.
    pub fn finish(self) -> Result<(Vec<NamedRule>, Coercion), SchemaError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok((self.rules, Coercion::Hash(self.coercion))),
        }
    }

    /// Builds a schema that validates input as given.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let (rules, _) = self.finish()?;
        Schema::from_rules(rules, None)
    }

    /// Builds a schema that coerces string input to the declared types first.
    pub fn build_params(self) -> Result<Schema, SchemaError> {
        let (rules, coercion) = self.finish()?;
        Schema::from_rules(rules, Some(coercion))
    }
}
