//! # nebula-rules
//!
//! Validation of nested map input through composable rules, with localized
//! error messages.
//!
//! ## Quick Start
//!
//! ```
//! use nebula_rules::prelude::*;
//! use serde_json::json;
//!
//! let catalog = PredicateCatalog::builtin();
//! let schema = Schema::define(&catalog, |s| {
//!     s.required("meta", |v| {
//!         v.schema(|s| s.required("info", |v| v.schema(|s| s.required("details", |v| v.filled_as(ValueType::String)))))
//!     })
//! })?;
//!
//! let result = schema.call(&json!({"meta": {"info": {"details": ""}}}));
//! assert_eq!(
//!     result.messages().to_json(),
//!     json!({"meta": {"info": {"details": ["must be filled"]}}})
//! );
//! # Ok::<(), nebula_rules::foundation::SchemaError>(())
//! ```
//!
//! ## Layers
//!
//! - [`predicates`]: named boolean checks with declared parameters, kept in a
//!   [`PredicateCatalog`](predicates::PredicateCatalog)
//! - [`rule`]: immutable rule trees ([`RuleNode`](rule::RuleNode)) evaluated
//!   into failure trees, and the ordered [`RuleApplier`](rule::RuleApplier)
//! - [`messages`]: message backends resolving failures to templates through
//!   an ordered list of candidate keys, and the
//!   [`MessageCompiler`](messages::MessageCompiler)
//! - [`schema`]: the key declaration builders and params coercion

pub mod foundation;
pub mod messages;
pub mod predicates;
pub mod prelude;
pub mod rule;
pub mod schema;

pub use foundation::{MessagesError, Path, PathSegment, SchemaError, ValueShape};
pub use messages::{ErrorReport, MessageBackend, MessageCompiler};
pub use predicates::{Arg, PredicateCatalog};
pub use rule::{RuleApplier, RuleNode};
pub use schema::{Schema, SchemaResult, ValueType};
