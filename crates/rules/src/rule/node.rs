//! Rule nodes and their evaluation
//!
//! A [`RuleNode`] is an immutable tree. Leaves apply a predicate; inner nodes
//! combine children logically (`and`, `or`, `not`, `implication`) or
//! structurally (`set`, `each`, `key`). Evaluation is synchronous, runs every
//! node at most once and never backtracks.
//!
//! Short-circuit rules:
//!
//! - `and` stops at the first failing side
//! - `or` stops at the first succeeding side
//! - `implication` only evaluates the consequent when the antecedent holds
//! - `set` evaluates every member, so sibling fields report together
//! - `key` reports a single `key?` failure and skips its rule when the key is
//!   absent
//! - `each` reports a single `array?` failure and skips elements when the
//!   value is not a sequence

use regex::Regex;
use serde_json::Value;

use crate::foundation::{Path, SchemaError};
use crate::predicates::{Arg, ArgBinding, BuiltinPredicate, PredicateCatalog, PredicateRef};
use crate::rule::{Ast, Failure, Operation, PredicateCall, RuleResult};

// ============================================================================
// PREDICATE NODE
// ============================================================================

/// A predicate applied to the value at a relative path.
#[derive(Debug, Clone)]
pub struct PredicateNode {
    predicate: PredicateRef,
    path: Path,
    args: Vec<ArgBinding>,
    pattern: Option<Regex>,
}

// The pattern is derived from the bound arguments.
impl PartialEq for PredicateNode {
    fn eq(&self, other: &Self) -> bool {
        self.predicate == other.predicate && self.path == other.path && self.args == other.args
    }
}

impl PredicateNode {
    /// Predicate name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.predicate.name()
    }

    /// Path relative to the evaluated value.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parameter bindings, input slot included.
    #[must_use]
    pub fn args(&self) -> &[ArgBinding] {
        &self.args
    }

    /// Pattern compiled when the node was built, for `format?`-like predicates.
    #[must_use]
    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    fn matches(&self, input: &Arg) -> bool {
        match &self.pattern {
            Some(pattern) => input
                .as_value()
                .and_then(Value::as_str)
                .is_some_and(|s| pattern.is_match(s)),
            None => self.predicate.get().call(&self.bound_values(), input),
        }
    }

    fn bound_values(&self) -> Vec<Arg> {
        let bound = self.args.len().saturating_sub(1);
        self.args[..bound].iter().map(|b| b.value.clone()).collect()
    }

    fn call_with(&self, input: Arg, negated: bool) -> PredicateCall {
        let mut args = self.args.clone();
        if let Some(slot) = args.last_mut() {
            slot.value = input;
        }
        PredicateCall {
            name: self.name().to_owned(),
            args,
            negated,
        }
    }

    fn input_at(&self, input: Option<&Value>) -> Arg {
        Arg::from(input.and_then(|v| self.path.resolve(v)))
    }
}

// ============================================================================
// RULE NODE
// ============================================================================

/// An immutable validation rule.
///
/// Trees built from the same declarations compare equal; predicate handles
/// compare by name.
///
/// # Examples
///
/// ```
/// use nebula_rules::predicates::{Arg, PredicateCatalog};
/// use nebula_rules::rule::RuleNode;
/// use serde_json::json;
///
/// let catalog = PredicateCatalog::builtin();
/// let age = RuleNode::predicate(&catalog, "int?", vec![])?
///     .and(RuleNode::predicate(&catalog, "gt?", vec![Arg::from(18)])?);
/// let rule = RuleNode::key("age", age);
///
/// assert!(rule.evaluate(&json!({"age": 21})).is_success());
/// assert!(rule.evaluate(&json!({"age": 18})).is_failure());
/// # Ok::<(), nebula_rules::foundation::SchemaError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RuleNode {
    /// Predicate application.
    Predicate(PredicateNode),
    /// Both sides must hold; stops at the first failure.
    And(Box<RuleNode>, Box<RuleNode>),
    /// One side must hold; stops at the first success.
    Or(Box<RuleNode>, Box<RuleNode>),
    /// The inner rule must fail.
    Not(Box<RuleNode>),
    /// When the antecedent holds, the consequent must hold.
    Implication(Box<RuleNode>, Box<RuleNode>),
    /// Every member is evaluated against the same value.
    Set {
        /// Set name.
        name: String,
        /// Members in declaration order.
        children: Vec<RuleNode>,
    },
    /// The inner rule is applied to every element of a sequence.
    Each {
        /// Location of the sequence relative to the evaluated value.
        path: Path,
        /// Element rule.
        inner: Box<RuleNode>,
    },
    /// The inner rule is applied to the value under a map key.
    Key {
        /// Key name.
        name: String,
        /// Rule for the value.
        inner: Box<RuleNode>,
    },
}

impl RuleNode {
    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    /// Applies a catalog predicate to the evaluated value.
    ///
    /// Fails when the predicate is unknown, too many arguments are supplied,
    /// or an argument has a shape the predicate rejects.
    pub fn predicate(
        catalog: &PredicateCatalog,
        name: &str,
        args: Vec<Arg>,
    ) -> Result<Self, SchemaError> {
        Self::predicate_at(catalog, name, Path::root(), args)
    }

    /// Applies a catalog predicate to the value at `path`.
    pub fn predicate_at(
        catalog: &PredicateCatalog,
        name: &str,
        path: Path,
        args: Vec<Arg>,
    ) -> Result<Self, SchemaError> {
        let predicate = catalog.get(name)?;
        let args = catalog.arg_list(name, args)?;
        let mut node = PredicateNode {
            predicate,
            path,
            args,
            pattern: None,
        };
        let bound = node.bound_values();
        node.predicate.get().check_args(&bound)?;
        node.pattern = node.predicate.get().compile_pattern(&bound)?;
        Ok(Self::Predicate(node))
    }

    /// Conjunction of `self` and `other`.
    #[must_use]
    pub fn and(self, other: RuleNode) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Disjunction of `self` and `other`.
    #[must_use]
    pub fn or(self, other: RuleNode) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Negation of `self`.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// `self` implies `consequent`.
    #[must_use]
    pub fn then(self, consequent: RuleNode) -> Self {
        Self::Implication(Box::new(self), Box::new(consequent))
    }

    /// A named set of rules evaluated against the same value.
    pub fn set(name: impl Into<String>, children: Vec<RuleNode>) -> Self {
        Self::Set {
            name: name.into(),
            children,
        }
    }

    /// Applies `inner` to every element of the evaluated sequence.
    #[must_use]
    pub fn each(inner: RuleNode) -> Self {
        Self::each_at(Path::root(), inner)
    }

    /// Applies `inner` to every element of the sequence at `path`.
    #[must_use]
    pub fn each_at(path: Path, inner: RuleNode) -> Self {
        Self::Each {
            path,
            inner: Box::new(inner),
        }
    }

    /// Applies `inner` to the value under key `name`.
    pub fn key(name: impl Into<String>, inner: RuleNode) -> Self {
        Self::Key {
            name: name.into(),
            inner: Box::new(inner),
        }
    }

    // ------------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------------

    /// Evaluates the rule against `input`.
    #[must_use]
    pub fn evaluate(&self, input: &Value) -> RuleResult {
        self.eval(Some(input), &Path::root()).into()
    }

    fn eval(&self, input: Option<&Value>, at: &Path) -> Option<Failure> {
        match self {
            Self::Predicate(node) => {
                let value = node.input_at(input);
                if node.matches(&value) {
                    None
                } else {
                    Some(Failure::predicate(
                        at.join(&node.path),
                        node.call_with(value, false),
                    ))
                }
            }
            Self::And(left, right) => left
                .eval(input, at)
                .or_else(|| right.eval(input, at))
                .map(|failure| Failure::composite(at.clone(), Operation::And, vec![failure])),
            Self::Or(left, right) => {
                let left_failure = left.eval(input, at)?;
                let right_failure = right.eval(input, at)?;
                Some(Failure::composite(
                    at.clone(),
                    Operation::Or,
                    vec![left_failure, right_failure],
                ))
            }
            Self::Not(inner) => match inner.eval(input, at) {
                Some(_) => None,
                None => Some(Failure::composite(
                    at.clone(),
                    Operation::Not,
                    inner.describe_success(input, at),
                )),
            },
            Self::Implication(antecedent, consequent) => {
                if antecedent.eval(input, at).is_some() {
                    return None;
                }
                consequent
                    .eval(input, at)
                    .map(|f| Failure::composite(at.clone(), Operation::Implication, vec![f]))
            }
            Self::Set { name, children } => {
                let failures: Vec<Failure> = children
                    .iter()
                    .filter_map(|child| child.eval(input, at))
                    .collect();
                (!failures.is_empty())
                    .then(|| Failure::composite(at.clone(), Operation::Set(name.clone()), failures))
            }
            Self::Each { path, inner } => {
                let here = at.join(path);
                let value = input.and_then(|v| path.resolve(v));
                let Some(Value::Array(items)) = value else {
                    return Some(type_failure(BuiltinPredicate::Array, here, value));
                };
                let failures: Vec<Failure> = items
                    .iter()
                    .enumerate()
                    .filter_map(|(index, item)| inner.eval(Some(item), &here.child(index)))
                    .collect();
                (!failures.is_empty())
                    .then(|| Failure::composite(here, Operation::Each, failures))
            }
            Self::Key { name, inner } => {
                let here = at.child(name.as_str());
                match input {
                    Some(Value::Object(map)) if map.contains_key(name) => inner
                        .eval(map.get(name), &here)
                        .map(|f| Failure::composite(here, Operation::Key(name.clone()), vec![f])),
                    _ => Some(missing_key(name, here, input)),
                }
            }
        }
    }

    /// Describes why this rule held, as negated leaf failures.
    ///
    /// Only called after the rule succeeded against `input`.
    fn describe_success(&self, input: Option<&Value>, at: &Path) -> Vec<Failure> {
        match self {
            Self::Predicate(node) => vec![Failure::predicate(
                at.join(&node.path),
                node.call_with(node.input_at(input), true),
            )],
            Self::And(left, right) => {
                let mut failures = left.describe_success(input, at);
                failures.extend(right.describe_success(input, at));
                failures
            }
            Self::Or(left, right) => {
                if left.eval(input, at).is_none() {
                    left.describe_success(input, at)
                } else {
                    right.describe_success(input, at)
                }
            }
            Self::Not(inner) => inner.eval(input, at).into_iter().collect(),
            Self::Implication(antecedent, consequent) => match antecedent.eval(input, at) {
                None => consequent.describe_success(input, at),
                Some(failure) => vec![failure],
            },
            Self::Set { children, .. } => children
                .iter()
                .flat_map(|child| child.describe_success(input, at))
                .collect(),
            Self::Each { path, inner } => {
                let here = at.join(path);
                match input.and_then(|v| path.resolve(v)) {
                    Some(Value::Array(items)) => items
                        .iter()
                        .enumerate()
                        .flat_map(|(i, item)| inner.describe_success(Some(item), &here.child(i)))
                        .collect(),
                    _ => Vec::new(),
                }
            }
            Self::Key { name, inner } => {
                let value = match input {
                    Some(Value::Object(map)) => map.get(name),
                    _ => None,
                };
                inner.describe_success(value, &at.child(name.as_str()))
            }
        }
    }

    // ------------------------------------------------------------------------
    // AST
    // ------------------------------------------------------------------------

    /// Serializes the tree.
    #[must_use]
    pub fn to_ast(&self) -> Ast {
        match self {
            Self::Predicate(node) => Ast::Predicate {
                name: node.name().to_owned(),
                path: node.path.clone(),
                args: node.args.clone(),
            },
            Self::And(l, r) => Ast::And(Box::new(l.to_ast()), Box::new(r.to_ast())),
            Self::Or(l, r) => Ast::Or(Box::new(l.to_ast()), Box::new(r.to_ast())),
            Self::Not(inner) => Ast::Not(Box::new(inner.to_ast())),
            Self::Implication(l, r) => {
                Ast::Implication(Box::new(l.to_ast()), Box::new(r.to_ast()))
            }
            Self::Set { name, children } => Ast::Set {
                name: name.clone(),
                rules: children.iter().map(RuleNode::to_ast).collect(),
            },
            Self::Each { path, inner } => Ast::Each {
                path: path.clone(),
                rule: Box::new(inner.to_ast()),
            },
            Self::Key { name, inner } => Ast::Key {
                name: name.clone(),
                rule: Box::new(inner.to_ast()),
            },
        }
    }

    /// Rebuilds a tree from its AST, resolving predicates in `catalog`.
    pub fn from_ast(ast: &Ast, catalog: &PredicateCatalog) -> Result<Self, SchemaError> {
        let node = |ast: &Ast| Self::from_ast(ast, catalog).map(Box::new);
        Ok(match ast {
            Ast::Predicate { name, path, args } => {
                let bound = args.len().saturating_sub(1);
                let values = args[..bound].iter().map(|b| b.value.clone()).collect();
                return Self::predicate_at(catalog, name, path.clone(), values);
            }
            Ast::And(l, r) => Self::And(node(l.as_ref())?, node(r.as_ref())?),
            Ast::Or(l, r) => Self::Or(node(l.as_ref())?, node(r.as_ref())?),
            Ast::Not(inner) => Self::Not(node(inner.as_ref())?),
            Ast::Implication(l, r) => Self::Implication(node(l.as_ref())?, node(r.as_ref())?),
            Ast::Set { name, rules } => Self::Set {
                name: name.clone(),
                children: rules
                    .iter()
                    .map(|rule| Self::from_ast(rule, catalog))
                    .collect::<Result<_, _>>()?,
            },
            Ast::Each { path, rule } => Self::Each {
                path: path.clone(),
                inner: node(rule.as_ref())?,
            },
            Ast::Key { name, rule } => Self::Key {
                name: name.clone(),
                inner: node(rule.as_ref())?,
            },
        })
    }
}

// ============================================================================
// STRUCTURAL FAILURES
// ============================================================================

fn type_failure(predicate: BuiltinPredicate, path: Path, value: Option<&Value>) -> Failure {
    Failure::predicate(
        path,
        PredicateCall {
            name: predicate.as_str().to_owned(),
            args: vec![ArgBinding::new("input", Arg::from(value))],
            negated: false,
        },
    )
}

fn missing_key(name: &str, path: Path, parent: Option<&Value>) -> Failure {
    Failure::predicate(
        path,
        PredicateCall {
            name: BuiltinPredicate::Key.as_str().to_owned(),
            args: vec![
                ArgBinding::new("name", Arg::from(name)),
                ArgBinding::new("input", Arg::from(parent)),
            ],
            negated: false,
        },
    )
}
