//! Failure trees to error reports

use std::sync::Arc;

use crate::foundation::{Path, PathSegment};
use crate::messages::{ErrorReport, LookupOptions, MessageBackend, StaticMessages};
use crate::rule::{Failure, Operation, PredicateCall, RuleFailure};

/// Builds [`ErrorReport`]s from failure trees.
///
/// Leaves are resolved through the backend, interpolated with the failed
/// call's arguments and inserted at their path, so failures from sibling
/// rules that target the same path concatenate. When both sides of a failed
/// disjunction produce one message for the same path, the two are joined with
/// the localized `or` word.
///
/// # Examples
///
/// ```
/// use nebula_rules::messages::MessageCompiler;
/// use nebula_rules::predicates::PredicateCatalog;
/// use nebula_rules::rule::RuleNode;
/// use serde_json::json;
///
/// let catalog = PredicateCatalog::builtin();
/// let rule = RuleNode::key("email", RuleNode::predicate(&catalog, "filled?", vec![])?);
/// let failure = rule.evaluate(&json!({"email": ""})).into_failure().unwrap();
///
/// let report = MessageCompiler::default().compile_failure(&failure);
/// assert_eq!(report.to_json(), json!({"email": ["must be filled"]}));
/// # Ok::<(), nebula_rules::foundation::SchemaError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MessageCompiler {
    backend: Arc<dyn MessageBackend>,
    locale: Option<String>,
    full: bool,
}

impl MessageCompiler {
    /// Creates a compiler over `backend`.
    pub fn new(backend: Arc<dyn MessageBackend>) -> Self {
        Self {
            backend,
            locale: None,
            full: false,
        }
    }

    /// Requests messages in `locale`, falling back to the backend default.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Prefixes every message with the localized rule name.
    #[must_use]
    pub fn with_full_messages(mut self) -> Self {
        self.full = true;
        self
    }

    /// The message backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn MessageBackend> {
        &self.backend
    }

    /// The requested locale, if any.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Compiles the failures of named rules, in order.
    #[must_use]
    pub fn compile(&self, failures: &[RuleFailure]) -> ErrorReport {
        let mut report = ErrorReport::new();
        for failure in failures {
            for (path, message) in self.messages(&failure.failure, Some(&failure.rule)) {
                report.insert(&path, message);
            }
        }
        report
    }

    /// Compiles a single failure tree.
    #[must_use]
    pub fn compile_failure(&self, failure: &Failure) -> ErrorReport {
        let mut report = ErrorReport::new();
        for (path, message) in self.messages(failure, None) {
            report.insert(&path, message);
        }
        report
    }

    fn messages(&self, failure: &Failure, rule: Option<&str>) -> Vec<(Path, String)> {
        let mut out = Vec::new();
        self.visit(failure, rule, &mut out);
        out
    }

    fn visit(&self, failure: &Failure, rule: Option<&str>, out: &mut Vec<(Path, String)>) {
        match failure {
            Failure::Predicate { path, call } => {
                out.push((path.clone(), self.leaf_message(path, call, rule)));
            }
            Failure::Composite {
                path,
                operation,
                children,
            } if children.is_empty() => {
                out.push((path.clone(), self.operation_message(path, operation, rule)));
            }
            Failure::Composite {
                operation: Operation::Or,
                children,
                ..
            } => {
                let sides: Vec<_> = children.iter().map(|c| self.messages(c, rule)).collect();
                if let [left, right] = sides.as_slice()
                    && let ([(left_path, left_text)], [(right_path, right_text)]) =
                        (left.as_slice(), right.as_slice())
                    && left_path == right_path
                {
                    let or = self.backend.or_word(self.locale());
                    out.push((left_path.clone(), format!("{left_text} {or} {right_text}")));
                    return;
                }
                out.extend(sides.into_iter().flatten());
            }
            Failure::Composite { children, .. } => {
                for child in children {
                    self.visit(child, rule, out);
                }
            }
        }
    }

    fn options(&self, path: &Path, rule: Option<&str>) -> LookupOptions {
        LookupOptions {
            path: path.clone(),
            rule: rule_override(path, rule).map(str::to_owned),
            locale: self.locale.clone(),
            ..LookupOptions::default()
        }
    }

    fn leaf_message(&self, path: &Path, call: &PredicateCall, rule: Option<&str>) -> String {
        let options = LookupOptions {
            negated: call.negated,
            arg_shape: call.arg_shape(),
            val_shape: Some(call.input_shape()),
            ..self.options(path, rule)
        };
        let text = match self.backend.resolve(&call.name, &options) {
            Some(template) => template.render(call),
            None => self.missing(&call.name, &options),
        };
        self.decorate(path, rule, text)
    }

    fn operation_message(&self, path: &Path, operation: &Operation, rule: Option<&str>) -> String {
        let options = self.options(path, rule);
        let predicate = operation.as_str();
        let text = match self.backend.resolve(predicate, &options) {
            Some(template) => template.text().to_owned(),
            None => self.missing(predicate, &options),
        };
        self.decorate(path, rule, text)
    }

    fn missing(&self, predicate: &str, options: &LookupOptions) -> String {
        let key = self.backend.missing_key(predicate, options);
        tracing::warn!(predicate, path = %options.path, key = %key, "translation missing");
        format!("translation missing: {key}")
    }

    fn decorate(&self, path: &Path, rule: Option<&str>, text: String) -> String {
        if !self.full {
            return text;
        }
        let name = rule_override(path, rule).or_else(|| {
            path.segments()
                .iter()
                .rev()
                .find_map(PathSegment::as_key)
        });
        match name {
            Some(name) => {
                let label = self
                    .backend
                    .rule_name(name, self.locale())
                    .unwrap_or_else(|| name.to_owned());
                format!("{label} {text}")
            }
            None => text,
        }
    }
}

impl Default for MessageCompiler {
    fn default() -> Self {
        Self::new(Arc::new(StaticMessages::builtin()))
    }
}

/// The applier's rule name when it differs from the key the failure sits
/// under.
fn rule_override<'a>(path: &Path, rule: Option<&'a str>) -> Option<&'a str> {
    rule.filter(|rule| path.first().and_then(PathSegment::as_key) != Some(*rule))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::TemplateTree;
    use crate::predicates::{Arg, PredicateCatalog};
    use crate::rule::RuleNode;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn catalog() -> PredicateCatalog {
        PredicateCatalog::builtin()
    }

    fn pred(name: &str, args: Vec<Arg>) -> RuleNode {
        RuleNode::predicate(&catalog(), name, args).unwrap()
    }

    fn failures(rules: Vec<(&str, RuleNode)>, input: &Value) -> Vec<RuleFailure> {
        rules
            .into_iter()
            .filter_map(|(name, rule)| {
                rule.evaluate(input).into_failure().map(|failure| RuleFailure {
                    rule: name.to_owned(),
                    failure,
                })
            })
            .collect()
    }

    #[test]
    fn interpolates_arguments() {
        let rules = vec![(
            "age",
            RuleNode::key("age", pred("int?", vec![]).and(pred("gt?", vec![Arg::from(18)]))),
        )];
        let report = MessageCompiler::default().compile(&failures(rules, &json!({"age": 18})));
        assert_eq!(report.to_json(), json!({"age": ["must be greater than 18"]}));
    }

    #[test]
    fn range_arguments_pick_range_templates() {
        let rules = vec![
            ("tags", RuleNode::key("tags", pred("size?", vec![Arg::range(1, 2)]))),
            ("name", RuleNode::key("name", pred("size?", vec![Arg::range(2, 5)]))),
        ];
        let input = json!({"tags": [1, 2, 3], "name": "x"});
        let report = MessageCompiler::default().compile(&failures(rules, &input));
        assert_eq!(
            report.to_json(),
            json!({
                "tags": ["size must be within 1 - 2"],
                "name": ["length must be within 2 - 5"]
            })
        );
    }

    #[test]
    fn sibling_rules_concatenate_at_same_path() {
        let rules = vec![
            ("age", RuleNode::key("age", pred("int?", vec![]))),
            ("adult", RuleNode::key("age", pred("gt?", vec![Arg::from(18)]))),
        ];
        let report = MessageCompiler::default().compile(&failures(rules, &json!({"age": 1.5})));
        assert_eq!(
            report.messages_at(&Path::from("age")),
            ["must be an integer", "must be greater than 18"]
        );
    }

    #[test]
    fn rule_override_selects_rule_templates() {
        let tree = TemplateTree::from_yaml_str(
            "en:\n  errors:\n    rules:\n      adult:\n        gt?: \"you must be an adult\"\n",
        )
        .unwrap();
        let backend = Arc::new(StaticMessages::builtin().merge(tree));
        let rules = vec![
            ("adult", RuleNode::key("age", pred("gt?", vec![Arg::from(18)]))),
            ("age", RuleNode::key("age", pred("lt?", vec![Arg::from(10)]))),
        ];
        let report = MessageCompiler::new(backend).compile(&failures(rules, &json!({"age": 12})));
        assert_eq!(
            report.messages_at(&Path::from("age")),
            ["you must be an adult", "must be less than 10"]
        );
    }

    #[test]
    fn or_messages_are_joined() {
        let rules = vec![(
            "age",
            RuleNode::key("age", pred("int?", vec![]).or(pred("nil?", vec![]))),
        )];
        let report = MessageCompiler::default().compile(&failures(rules, &json!({"age": "x"})));
        assert_eq!(
            report.to_json(),
            json!({"age": ["must be an integer or cannot be defined"]})
        );
    }

    #[test]
    fn or_word_is_localized() {
        let tree = TemplateTree::from_yaml_str(
            "pl:\n  errors:\n    int?: \"musi być liczbą całkowitą\"\n    float?: \"musi być liczbą\"\n    or: \"lub\"\n",
        )
        .unwrap();
        let backend = Arc::new(StaticMessages::builtin().merge(tree));
        let rule = RuleNode::key("n", pred("int?", vec![]).or(pred("float?", vec![])));
        let failure = rule.evaluate(&json!({"n": "x"})).into_failure().unwrap();
        let report = MessageCompiler::new(backend).with_locale("pl").compile_failure(&failure);
        assert_eq!(
            report.messages_at(&Path::from("n")),
            ["musi być liczbą całkowitą lub musi być liczbą"]
        );
    }

    #[test]
    fn negated_failures_use_not_templates() {
        let rule = RuleNode::key("name", pred("empty?", vec![]).negate());
        let failure = rule.evaluate(&json!({"name": ""})).into_failure().unwrap();
        let report = MessageCompiler::default().compile_failure(&failure);
        assert_eq!(report.to_json(), json!({"name": ["cannot be empty"]}));
    }

    #[test]
    fn missing_translation_is_reported_not_dropped() {
        let backend = Arc::new(StaticMessages::from_yaml_str("en:\n  errors: {}\n").unwrap());
        let rule = RuleNode::key("email", pred("filled?", vec![]));
        let failure = rule.evaluate(&json!({"email": ""})).into_failure().unwrap();
        let report = MessageCompiler::new(backend).compile_failure(&failure);
        assert_eq!(
            report.messages_at(&Path::from("email")),
            ["translation missing: errors.rules.email.filled?.arg.default"]
        );
    }

    #[test]
    fn full_messages_prefix_rule_names() {
        let tree = TemplateTree::from_yaml_str("en:\n  rules:\n    email: \"E-mail\"\n").unwrap();
        let backend = Arc::new(StaticMessages::builtin().merge(tree));
        let rules = vec![
            ("email", RuleNode::key("email", pred("filled?", vec![]))),
            ("age", RuleNode::key("age", pred("int?", vec![]))),
        ];
        let input = json!({"email": "", "age": "x"});
        let report = MessageCompiler::new(backend)
            .with_full_messages()
            .compile(&failures(rules, &input));
        assert_eq!(
            report.to_json(),
            json!({"email": ["E-mail must be filled"], "age": ["age must be an integer"]})
        );
    }

    #[test]
    fn each_failures_are_indexed() {
        let rule = RuleNode::key("tags", RuleNode::each(pred("str?", vec![])));
        let failure = rule.evaluate(&json!({"tags": ["a", 1, "b", null]})).into_failure().unwrap();
        let report = MessageCompiler::default().compile_failure(&failure);
        assert_eq!(
            report.to_json(),
            json!({"tags": {"1": ["must be a string"], "3": ["must be a string"]}})
        );
    }
}
