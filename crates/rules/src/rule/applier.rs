//! Ordered application of named rules

use serde_json::Value;

use crate::foundation::{PathSegment, SchemaError};
use crate::messages::{ErrorReport, MessageCompiler};
use crate::rule::{Ast, Failure, RuleNode};

/// Name of the set an applier serializes to.
pub const ROOT_SET: &str = "root";

/// A top-level rule and the name it is registered under.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRule {
    /// Rule name, usually the key the rule validates.
    pub name: String,
    /// The rule.
    pub rule: RuleNode,
}

impl NamedRule {
    /// Creates a named rule.
    pub fn new(name: impl Into<String>, rule: RuleNode) -> Self {
        Self {
            name: name.into(),
            rule,
        }
    }
}

/// A failure and the rule that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFailure {
    /// Name of the failed rule.
    pub rule: String,
    /// The failure tree.
    pub failure: Failure,
}

impl RuleFailure {
    /// Returns `true` if this failure sits under top-level key `name`, or was
    /// produced by the rule called `name`.
    #[must_use]
    pub fn concerns(&self, name: &str) -> bool {
        self.rule == name
            || self
                .failure
                .leaves()
                .iter()
                .any(|(path, _)| path.first().and_then(PathSegment::as_key) == Some(name))
    }
}

/// Input being validated plus the failures collected so far.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationInput {
    output: Value,
    failures: Vec<RuleFailure>,
}

impl ValidationInput {
    /// Wraps a value with no failures.
    #[must_use]
    pub fn new(output: Value) -> Self {
        Self {
            output,
            failures: Vec::new(),
        }
    }

    /// The validated value.
    #[must_use]
    pub fn output(&self) -> &Value {
        &self.output
    }

    /// Consumes the input and returns the value.
    #[must_use]
    pub fn into_output(self) -> Value {
        self.output
    }

    /// Failures in the order they were recorded.
    #[must_use]
    pub fn failures(&self) -> &[RuleFailure] {
        &self.failures
    }

    /// Consumes the input and returns the value and failures.
    #[must_use]
    pub fn into_parts(self) -> (Value, Vec<RuleFailure>) {
        (self.output, self.failures)
    }

    /// Returns `true` if a failure concerning `name` was recorded.
    #[must_use]
    pub fn has_error(&self, name: &str) -> bool {
        self.failures.iter().any(|f| f.concerns(name))
    }

    /// Returns `true` if no failure was recorded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Appends failures in order.
    pub fn concat(&mut self, failures: impl IntoIterator<Item = RuleFailure>) {
        self.failures.extend(failures);
    }
}

/// Evaluates named rules in declaration order.
///
/// A rule is skipped when the input already carries a failure for its name,
/// so a key rejected by an earlier rule reports once. Failures of the rules
/// that run are appended to the input in order.
///
/// # Examples
///
/// ```
/// use nebula_rules::predicates::{Arg, PredicateCatalog};
/// use nebula_rules::rule::{NamedRule, RuleApplier, RuleNode};
/// use serde_json::json;
///
/// let catalog = PredicateCatalog::builtin();
/// let applier = RuleApplier::new(vec![
///     NamedRule::new("email", RuleNode::key("email", RuleNode::predicate(&catalog, "filled?", vec![])?)),
///     NamedRule::new(
///         "age",
///         RuleNode::key("age", RuleNode::predicate(&catalog, "gt?", vec![Arg::from(18)])?),
///     ),
/// ])?;
///
/// let report = applier.call(&json!({"email": "", "age": 18}));
/// assert_eq!(
///     report.to_json(),
///     json!({"email": ["must be filled"], "age": ["must be greater than 18"]})
/// );
/// # Ok::<(), nebula_rules::foundation::SchemaError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RuleApplier {
    rules: Vec<NamedRule>,
    compiler: MessageCompiler,
}

impl RuleApplier {
    /// Creates an applier with the bundled English messages.
    ///
    /// Rule names must be unique.
    pub fn new(rules: Vec<NamedRule>) -> Result<Self, SchemaError> {
        Self::with_compiler(rules, MessageCompiler::default())
    }

    /// Creates an applier that compiles reports with `compiler`.
    pub fn with_compiler(
        rules: Vec<NamedRule>,
        compiler: MessageCompiler,
    ) -> Result<Self, SchemaError> {
        for (i, rule) in rules.iter().enumerate() {
            if rules[..i].iter().any(|earlier| earlier.name == rule.name) {
                return Err(SchemaError::DuplicateKey {
                    name: rule.name.clone(),
                });
            }
        }
        tracing::debug!(rules = rules.len(), "built rule applier");
        Ok(Self { rules, compiler })
    }

    /// Replaces the compiler used by [`RuleApplier::call`].
    #[must_use]
    pub fn with_messages(mut self, compiler: MessageCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[NamedRule] {
        &self.rules
    }

    /// Looks up a rule by name.
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&RuleNode> {
        self.rules.iter().find(|r| r.name == name).map(|r| &r.rule)
    }

    /// The compiler used by [`RuleApplier::call`].
    #[must_use]
    pub fn compiler(&self) -> &MessageCompiler {
        &self.compiler
    }

    /// Runs every rule against `input` and records the failures.
    #[must_use]
    pub fn apply(&self, mut input: ValidationInput) -> ValidationInput {
        let mut failures = Vec::new();
        for NamedRule { name, rule } in &self.rules {
            if input.has_error(name) {
                tracing::debug!(rule = %name, "skipping rule, input already has an error for it");
                continue;
            }
            if let Some(failure) = rule.evaluate(&input.output).into_failure() {
                tracing::trace!(rule = %name, %failure, "rule failed");
                failures.push(RuleFailure {
                    rule: name.clone(),
                    failure,
                });
            }
        }
        input.concat(failures);
        input
    }

    /// Validates `value` and compiles the error report.
    #[must_use]
    pub fn call(&self, value: &Value) -> ErrorReport {
        let input = self.apply(ValidationInput::new(value.clone()));
        self.compiler.compile(input.failures())
    }

    /// Serializes the rules as a set.
    #[must_use]
    pub fn to_ast(&self) -> Ast {
        Ast::Set {
            name: ROOT_SET.to_owned(),
            rules: self.rules.iter().map(|r| r.rule.to_ast()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Path;
    use crate::predicates::{Arg, PredicateCatalog};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn pred(name: &str, args: Vec<Arg>) -> RuleNode {
        RuleNode::predicate(&PredicateCatalog::builtin(), name, args).unwrap()
    }

    fn failure_at(rule: &str, key: &str) -> RuleFailure {
        let failure = RuleNode::key(key, pred("filled?", vec![]))
            .evaluate(&json!({}))
            .into_failure()
            .unwrap();
        RuleFailure {
            rule: rule.to_owned(),
            failure,
        }
    }

    #[test]
    fn rules_run_in_declaration_order() {
        let applier = RuleApplier::new(vec![
            NamedRule::new("b", RuleNode::key("b", pred("filled?", vec![]))),
            NamedRule::new("a", RuleNode::key("a", pred("filled?", vec![]))),
        ])
        .unwrap();
        let input = applier.apply(ValidationInput::new(json!({})));
        let names: Vec<&str> = input.failures().iter().map(|f| f.rule.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn rules_with_existing_errors_are_skipped() {
        let applier = RuleApplier::new(vec![NamedRule::new(
            "email",
            RuleNode::key("email", pred("str?", vec![])),
        )])
        .unwrap();

        let mut input = ValidationInput::new(json!({"email": 1}));
        input.concat([failure_at("coercion", "email")]);
        let input = applier.apply(input);
        assert_eq!(input.failures().len(), 1);
        assert_eq!(input.failures()[0].rule, "coercion");
    }

    #[test]
    fn valid_input_has_no_failures() {
        let applier = RuleApplier::new(vec![NamedRule::new(
            "email",
            RuleNode::key("email", pred("filled?", vec![])),
        )])
        .unwrap();
        let input = applier.apply(ValidationInput::new(json!({"email": "a@b.c"})));
        assert!(input.is_success());
        assert!(applier.call(&json!({"email": "a@b.c"})).is_empty());
    }

    #[test]
    fn duplicate_rule_names_are_rejected() {
        let rule = RuleNode::key("a", pred("filled?", vec![]));
        let err = RuleApplier::new(vec![
            NamedRule::new("a", rule.clone()),
            NamedRule::new("a", rule),
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateKey { name: "a".into() });
    }

    #[test]
    fn has_error_matches_rule_or_key() {
        let mut input = ValidationInput::new(json!({}));
        input.concat([failure_at("adult", "age")]);
        assert!(input.has_error("adult"));
        assert!(input.has_error("age"));
        assert!(!input.has_error("email"));
    }

    #[test]
    fn serializes_to_root_set() {
        let applier = RuleApplier::new(vec![
            NamedRule::new("email", RuleNode::key("email", pred("filled?", vec![]))),
            NamedRule::new("age", RuleNode::key("age", pred("int?", vec![]))),
        ])
        .unwrap();
        let Ast::Set { name, rules } = applier.to_ast() else {
            panic!("expected a set");
        };
        assert_eq!(name, ROOT_SET);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].predicates(), ["int?"]);
        assert!(applier.rule("age").is_some());
    }

    #[test]
    fn call_compiles_messages() {
        let applier = RuleApplier::new(vec![NamedRule::new(
            "tags",
            RuleNode::key("tags", RuleNode::each(pred("filled?", vec![]))),
        )])
        .unwrap();
        let report = applier.call(&json!({"tags": ["a", ""]}));
        assert_eq!(
            report.messages_at(&Path::root().child("tags").child(1usize)),
            ["must be filled"]
        );
    }
}
