//! Error types
//!
//! Validation failures are never errors: they are data carried by
//! [`RuleResult`](crate::rule::RuleResult). The types in this module describe
//! misconfiguration, which is reported while a schema or a message catalog is
//! being built, before any input is evaluated.

use std::path::PathBuf;

use crate::foundation::ValueShape;

// ============================================================================
// SCHEMA ERROR
// ============================================================================

/// A rule tree could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// No predicate with this name is registered in the catalog.
    #[error("unknown predicate `{name}`")]
    UnknownPredicate {
        /// The requested predicate name.
        name: String,
    },

    /// More arguments were bound than the predicate declares.
    #[error("predicate `{name}` takes {expected} argument(s) besides the input, got {given}")]
    ArityMismatch {
        /// Predicate name.
        name: String,
        /// Number of bindable parameters.
        expected: usize,
        /// Number of supplied arguments.
        given: usize,
    },

    /// A bound argument has a shape the predicate cannot use.
    #[error("predicate `{name}` expects `{param}` to be {expected}, got {actual}")]
    InvalidArgument {
        /// Predicate name.
        name: String,
        /// Parameter name.
        param: String,
        /// What the predicate accepts.
        expected: &'static str,
        /// Shape of the supplied argument.
        actual: ValueShape,
    },

    /// A `format?` pattern failed to compile.
    #[error("predicate `{name}` has an invalid pattern: {reason}")]
    InvalidPattern {
        /// Predicate name.
        name: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// A predicate with this name is already registered.
    #[error("predicate `{name}` is already registered")]
    DuplicatePredicate {
        /// Predicate name.
        name: String,
    },

    /// A schema declares the same key twice.
    #[error("key `{name}` is declared more than once")]
    DuplicateKey {
        /// Key name.
        name: String,
    },
}

impl SchemaError {
    /// Creates an unknown predicate error.
    pub fn unknown_predicate(name: impl Into<String>) -> Self {
        Self::UnknownPredicate { name: name.into() }
    }

    /// Returns the predicate this error refers to, if any.
    #[must_use]
    pub fn predicate(&self) -> Option<&str> {
        match self {
            Self::UnknownPredicate { name }
            | Self::ArityMismatch { name, .. }
            | Self::InvalidArgument { name, .. }
            | Self::InvalidPattern { name, .. }
            | Self::DuplicatePredicate { name } => Some(name),
            Self::DuplicateKey { .. } => None,
        }
    }
}

// ============================================================================
// MESSAGES ERROR
// ============================================================================

/// A message template source could not be loaded.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MessagesError {
    /// The template file could not be read.
    #[error("failed to read message file {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The template source is not valid YAML.
    #[error("failed to parse messages{}: {source}", .path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    Parse {
        /// File that was being parsed, if the source came from disk.
        path: Option<PathBuf>,
        /// Parser diagnostic.
        #[source]
        source: serde_yaml::Error,
    },

    /// The top level of a template tree must map locales to sub-trees.
    #[error("message tree must map locale names to tables, found {found} at the top level")]
    InvalidTree {
        /// What was found instead.
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_mismatch_message() {
        let err = SchemaError::ArityMismatch {
            name: "gt?".into(),
            expected: 1,
            given: 2,
        };
        assert_eq!(
            err.to_string(),
            "predicate `gt?` takes 1 argument(s) besides the input, got 2"
        );
        assert_eq!(err.predicate(), Some("gt?"));
    }

    #[test]
    fn duplicate_key_has_no_predicate() {
        let err = SchemaError::DuplicateKey { name: "email".into() };
        assert_eq!(err.predicate(), None);
    }

    #[test]
    fn parse_error_mentions_file() {
        let source = serde_yaml::from_str::<serde_yaml::Value>("a: [").unwrap_err();
        let err = MessagesError::Parse {
            path: Some(PathBuf::from("errors.yml")),
            source,
        };
        assert!(err.to_string().contains("in errors.yml"));
    }
}
