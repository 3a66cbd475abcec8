//! Schemas over nested map input
//!
//! A [`Schema`] is an ordered set of named rules, one per declared key, plus
//! an optional coercion plan. Schemas built with [`Schema::params`] coerce
//! form-style string input to the declared types before validating, schemas
//! built with [`Schema::define`] validate input as given.

pub mod coercion;
pub mod dsl;

use serde_json::Value;

pub use coercion::Coercion;
pub use dsl::{SCHEMA_SET, SchemaBuilder, ValueRules, ValueType};

use crate::foundation::SchemaError;
use crate::messages::{ErrorReport, MessageCompiler};
use crate::predicates::PredicateCatalog;
use crate::rule::{Ast, NamedRule, RuleApplier, RuleFailure, ValidationInput};

// ============================================================================
// SCHEMA
// ============================================================================

/// A compiled schema.
///
/// Schemas are immutable and cheap to share; one instance can validate many
/// inputs from many threads.
///
/// # Examples
///
/// ```
/// use nebula_rules::predicates::{Arg, PredicateCatalog};
/// use nebula_rules::schema::{Schema, ValueType};
/// use serde_json::json;
///
/// let catalog = PredicateCatalog::builtin();
/// let schema = Schema::params(&catalog, |s| {
///     s.required("email", |v| v.filled())
///         .required("age", |v| v.filled_as(ValueType::Integer).pred_with("gt?", vec![Arg::from(18)]))
/// })?;
///
/// let result = schema.call(&json!({"email": "", "age": "18"}));
/// assert_eq!(result.output(), &json!({"email": "", "age": 18}));
/// assert_eq!(
///     result.messages().to_json(),
///     json!({"email": ["must be filled"], "age": ["must be greater than 18"]})
/// );
/// # Ok::<(), nebula_rules::foundation::SchemaError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    applier: RuleApplier,
    coercion: Option<Coercion>,
}

impl Schema {
    /// Declares a schema that validates input as given.
    pub fn define<'c>(
        catalog: &'c PredicateCatalog,
        define: impl FnOnce(SchemaBuilder<'c>) -> SchemaBuilder<'c>,
    ) -> Result<Self, SchemaError> {
        define(SchemaBuilder::new(catalog)).build()
    }

    /// Declares a schema that coerces string input to the declared types.
    pub fn params<'c>(
        catalog: &'c PredicateCatalog,
        define: impl FnOnce(SchemaBuilder<'c>) -> SchemaBuilder<'c>,
    ) -> Result<Self, SchemaError> {
        define(SchemaBuilder::new(catalog)).build_params()
    }

    /// Wraps already built rules.
    pub fn from_rules(rules: Vec<NamedRule>, coercion: Option<Coercion>) -> Result<Self, SchemaError> {
        let applier = RuleApplier::new(rules)?;
        let coercion = coercion.filter(|plan| !plan.is_identity());
        tracing::debug!(
            rules = applier.rules().len(),
            coerces = coercion.is_some(),
            "built schema"
        );
        Ok(Self { applier, coercion })
    }

    /// Uses `compiler` to build message reports.
    #[must_use]
    pub fn with_compiler(mut self, compiler: MessageCompiler) -> Self {
        self.applier = self.applier.with_messages(compiler);
        self
    }

    /// Rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[NamedRule] {
        self.applier.rules()
    }

    /// The underlying applier.
    #[must_use]
    pub fn applier(&self) -> &RuleApplier {
        &self.applier
    }

    /// The coercion plan, for params schemas that change input.
    #[must_use]
    pub fn coercion(&self) -> Option<&Coercion> {
        self.coercion.as_ref()
    }

    /// Serializes the rules.
    #[must_use]
    pub fn to_ast(&self) -> Ast {
        self.applier.to_ast()
    }

    /// Coerces and validates `input`.
    #[must_use]
    pub fn call(&self, input: &Value) -> SchemaResult {
        let value = match &self.coercion {
            Some(plan) => plan.apply(input.clone()),
            None => input.clone(),
        };
        let input = self.applier.apply(ValidationInput::new(value));
        if !input.is_success() {
            tracing::debug!(failures = input.failures().len(), "validation failed");
        }
        SchemaResult {
            input,
            compiler: self.applier.compiler().clone(),
        }
    }
}

// ============================================================================
// RESULT
// ============================================================================

/// Outcome of [`Schema::call`].
#[derive(Debug, Clone)]
pub struct SchemaResult {
    input: ValidationInput,
    compiler: MessageCompiler,
}

impl SchemaResult {
    /// The input after coercion.
    #[must_use]
    pub fn output(&self) -> &Value {
        self.input.output()
    }

    /// Consumes the result and returns the coerced input.
    #[must_use]
    pub fn into_output(self) -> Value {
        self.input.into_output()
    }

    /// Returns `true` if every rule passed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.input.is_success()
    }

    /// Returns `true` if any rule failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Returns `true` if a failure concerns key or rule `name`.
    #[must_use]
    pub fn has_error(&self, name: &str) -> bool {
        self.input.has_error(name)
    }

    /// Failures in rule order.
    #[must_use]
    pub fn failures(&self) -> &[RuleFailure] {
        self.input.failures()
    }

    /// Messages compiled with the schema's compiler.
    #[must_use]
    pub fn messages(&self) -> ErrorReport {
        self.compiler.compile(self.input.failures())
    }

    /// Messages compiled with another compiler, e.g. for another locale.
    #[must_use]
    pub fn messages_with(&self, compiler: &MessageCompiler) -> ErrorReport {
        compiler.compile(self.input.failures())
    }
}
