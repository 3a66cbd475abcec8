//! Prelude module for convenient imports.
//!
//! ```
//! use nebula_rules::prelude::*;
//!
//! let catalog = PredicateCatalog::builtin();
//! let schema = Schema::params(&catalog, |s| s.required("age", |v| v.filled_as(ValueType::Integer)))?;
//! assert!(schema.call(&serde_json::json!({"age": "42"})).is_success());
//! # Ok::<(), SchemaError>(())
//! ```

// ============================================================================
// FOUNDATION
// ============================================================================

pub use crate::foundation::{MessagesError, Path, PathSegment, SchemaError, ValueShape};

// ============================================================================
// PREDICATES AND RULES
// ============================================================================

pub use crate::predicates::{Arg, BuiltinPredicate, Predicate, PredicateCatalog};
pub use crate::rule::{Ast, Failure, NamedRule, RuleApplier, RuleNode, RuleResult, ValidationInput};

// ============================================================================
// MESSAGES
// ============================================================================

pub use crate::messages::{
    CatalogTranslator, ErrorReport, LocalizedMessages, LookupOptions, MessageBackend,
    MessageCompiler, MessagesConfig, NamespacedMessages, StaticMessages, TemplateTree, Translator,
};

// ============================================================================
// SCHEMA
// ============================================================================

pub use crate::schema::{Coercion, Schema, SchemaBuilder, SchemaResult, ValueRules, ValueType};
