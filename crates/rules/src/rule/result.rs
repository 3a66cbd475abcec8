//! Evaluation results
//!
//! A failed evaluation yields a [`Failure`] tree whose shape follows the rule
//! tree that produced it, pruned to the nodes that failed. Leaves carry the
//! predicate call (bound arguments plus the evaluated input) so messages can
//! be resolved and interpolated later without re-running anything.

use std::fmt;

use serde::Serialize;

use crate::foundation::{Path, ValueShape};
use crate::predicates::{Arg, ArgBinding};

/// Outcome of evaluating a rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleResult {
    /// Every check passed.
    Success,
    /// At least one check failed.
    Failure(Failure),
}

impl RuleResult {
    /// Returns `true` on success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns `true` on failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Returns the failure tree, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Success => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Consumes the result and returns the failure tree, if any.
    #[must_use]
    pub fn into_failure(self) -> Option<Failure> {
        match self {
            Self::Success => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

impl From<Option<Failure>> for RuleResult {
    fn from(failure: Option<Failure>) -> Self {
        failure.map_or(Self::Success, Self::Failure)
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// The composite rule a failure node came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Conjunction; holds the first failing side.
    And,
    /// Disjunction; holds both failing sides.
    Or,
    /// Negation; holds the negated description of what succeeded.
    Not,
    /// Implication whose antecedent held; holds the consequent failure.
    Implication,
    /// Named rule set; holds every failing member.
    Set(String),
    /// Per-element rule; holds the failing elements.
    Each,
    /// Map key rule; holds the failure under that key.
    Key(String),
}

impl Operation {
    /// Short name of the operation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Implication => "implication",
            Self::Set(_) => "set",
            Self::Each => "each",
            Self::Key(_) => "key",
        }
    }
}

// ============================================================================
// PREDICATE CALLS
// ============================================================================

/// A failed predicate application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredicateCall {
    /// Predicate name.
    pub name: String,
    /// Every parameter with its value; the last binding is the input.
    pub args: Vec<ArgBinding>,
    /// `true` when the failure comes from a negated rule that succeeded.
    pub negated: bool,
}

impl PredicateCall {
    /// Bound arguments, input excluded.
    #[must_use]
    pub fn bound(&self) -> &[ArgBinding] {
        match self.args.split_last() {
            Some((_, bound)) => bound,
            None => &[],
        }
    }

    /// The evaluated input.
    #[must_use]
    pub fn input(&self) -> &Arg {
        self.args.last().map_or(&Arg::Undefined, |b| &b.value)
    }

    /// Shape of the single bound argument, if there is exactly one.
    #[must_use]
    pub fn arg_shape(&self) -> Option<ValueShape> {
        match self.bound() {
            [only] => Some(only.value.shape()),
            _ => None,
        }
    }

    /// Shape of the evaluated input.
    #[must_use]
    pub fn input_shape(&self) -> ValueShape {
        self.input().shape()
    }
}

// ============================================================================
// FAILURE TREE
// ============================================================================

/// A node of the failure tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    /// A predicate returned `false`.
    Predicate {
        /// Where the checked value lives.
        path: Path,
        /// The failed call.
        call: PredicateCall,
    },
    /// A composite rule failed because some of its children did.
    Composite {
        /// Where the composite was evaluated.
        path: Path,
        /// Which composite failed.
        operation: Operation,
        /// Failing children, in evaluation order.
        children: Vec<Failure>,
    },
}

impl Failure {
    /// Creates a leaf failure.
    #[must_use]
    pub fn predicate(path: Path, call: PredicateCall) -> Self {
        Self::Predicate { path, call }
    }

    /// Creates a composite failure.
    #[must_use]
    pub fn composite(path: Path, operation: Operation, children: Vec<Failure>) -> Self {
        Self::Composite {
            path,
            operation,
            children,
        }
    }

    /// Location of this node.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Predicate { path, .. } | Self::Composite { path, .. } => path,
        }
    }

    /// Child failures; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Failure] {
        match self {
            Self::Predicate { .. } => &[],
            Self::Composite { children, .. } => children,
        }
    }

    /// Returns the predicate call for leaves.
    #[must_use]
    pub fn call(&self) -> Option<&PredicateCall> {
        match self {
            Self::Predicate { call, .. } => Some(call),
            Self::Composite { .. } => None,
        }
    }

    /// Collects every leaf, depth-first, in evaluation order.
    #[must_use]
    pub fn leaves(&self) -> Vec<(&Path, &PredicateCall)> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<(&'a Path, &'a PredicateCall)>) {
        match self {
            Self::Predicate { path, call } => out.push((path, call)),
            Self::Composite { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (path, call)) in self.leaves().into_iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            let not = if call.negated { "not " } else { "" };
            if path.is_root() {
                write!(f, "{not}{}", call.name)?;
            } else {
                write!(f, "{path}: {not}{}", call.name)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: Vec<ArgBinding>) -> PredicateCall {
        PredicateCall {
            name: name.into(),
            args,
            negated: false,
        }
    }

    #[test]
    fn bound_excludes_input() {
        let c = call(
            "gt?",
            vec![
                ArgBinding::new("num", Arg::from(18)),
                ArgBinding::new("input", Arg::from(json!(10))),
            ],
        );
        assert_eq!(c.bound().len(), 1);
        assert_eq!(c.input(), &Arg::from(json!(10)));
        assert_eq!(c.arg_shape(), Some(ValueShape::Integer));
        assert_eq!(c.input_shape(), ValueShape::Integer);
    }

    #[test]
    fn single_param_predicate_has_no_arg_shape() {
        let c = call("filled?", vec![ArgBinding::new("input", Arg::from(""))]);
        assert_eq!(c.arg_shape(), None);
        assert!(c.bound().is_empty());
    }

    #[test]
    fn leaves_are_depth_first() {
        let leaf = |key: &str, name: &str| {
            Failure::predicate(
                Path::from(key),
                call(name, vec![ArgBinding::new("input", Arg::Undefined)]),
            )
        };
        let tree = Failure::composite(
            Path::root(),
            Operation::Set("root".into()),
            vec![
                leaf("email", "filled?"),
                Failure::composite(Path::from("age"), Operation::And, vec![leaf("age", "int?")]),
            ],
        );
        let names: Vec<&str> = tree.leaves().iter().map(|(_, c)| c.name.as_str()).collect();
        assert_eq!(names, ["filled?", "int?"]);
        assert_eq!(tree.to_string(), "email: filled?; age: int?");
    }
}
