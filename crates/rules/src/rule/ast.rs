//! Language-agnostic rule representation
//!
//! [`Ast`] mirrors [`RuleNode`](crate::rule::RuleNode) without predicate
//! implementation handles, so it can be serialized, compared and shipped to
//! tooling. [`RuleNode::from_ast`](crate::rule::RuleNode::from_ast) rebuilds an
//! executable tree against a catalog.

use serde::{Deserialize, Serialize};

use crate::foundation::Path;
use crate::predicates::ArgBinding;

/// Serializable form of a rule tree.
///
/// # Examples
///
/// ```
/// use nebula_rules::predicates::PredicateCatalog;
/// use nebula_rules::rule::{Ast, RuleNode};
///
/// let catalog = PredicateCatalog::builtin();
/// let rule = RuleNode::key("email", RuleNode::predicate(&catalog, "filled?", vec![]).unwrap());
/// let ast = rule.to_ast();
/// assert!(matches!(ast, Ast::Key { ref name, .. } if name == "email"));
/// assert_eq!(RuleNode::from_ast(&ast, &catalog).unwrap(), rule);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ast {
    /// Predicate application.
    Predicate {
        /// Predicate name.
        name: String,
        /// Path relative to the evaluated value.
        path: Path,
        /// Parameter bindings; the input slot is undefined.
        args: Vec<ArgBinding>,
    },
    /// Conjunction.
    And(Box<Ast>, Box<Ast>),
    /// Disjunction.
    Or(Box<Ast>, Box<Ast>),
    /// Negation.
    Not(Box<Ast>),
    /// Implication.
    Implication(Box<Ast>, Box<Ast>),
    /// Named rule set.
    Set {
        /// Set name.
        name: String,
        /// Members in declaration order.
        rules: Vec<Ast>,
    },
    /// Per-element rule.
    Each {
        /// Path of the sequence relative to the evaluated value.
        path: Path,
        /// Element rule.
        rule: Box<Ast>,
    },
    /// Rule applied to a map key.
    Key {
        /// Key name.
        name: String,
        /// Rule for the value under the key.
        rule: Box<Ast>,
    },
}

impl Ast {
    /// Short name of the node kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Predicate { .. } => "predicate",
            Self::And(..) => "and",
            Self::Or(..) => "or",
            Self::Not(_) => "not",
            Self::Implication(..) => "implication",
            Self::Set { .. } => "set",
            Self::Each { .. } => "each",
            Self::Key { .. } => "key",
        }
    }

    /// Names of every predicate in the tree, depth-first.
    #[must_use]
    pub fn predicates(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_predicates(&mut names);
        names
    }

    fn collect_predicates<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Predicate { name, .. } => out.push(name),
            Self::And(l, r) | Self::Or(l, r) | Self::Implication(l, r) => {
                l.collect_predicates(out);
                r.collect_predicates(out);
            }
            Self::Not(inner) => inner.collect_predicates(out),
            Self::Set { rules, .. } => {
                for rule in rules {
                    rule.collect_predicates(out);
                }
            }
            Self::Each { rule, .. } | Self::Key { rule, .. } => rule.collect_predicates(out),
        }
    }
}
