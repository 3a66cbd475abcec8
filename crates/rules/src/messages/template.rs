//! Message templates and `%{name}` interpolation

use std::collections::HashMap;
use std::fmt;

use crate::predicates::Arg;
use crate::rule::PredicateCall;

/// Replaces every `%{name}` in `template` with `lookup(name)`.
///
/// Placeholders `lookup` does not know, and an unterminated `%{`, are copied
/// through unchanged.
pub fn interpolate(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        match lookup(&after[..end]) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + end + 3]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// A resolved message template and the key it was found under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    key: String,
    text: String,
}

impl MessageTemplate {
    /// Creates a template.
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }

    /// Candidate key that matched.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw template text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Interpolates the template with a failed call's arguments.
    #[must_use]
    pub fn render(&self, call: &PredicateCall) -> String {
        let vars = TemplateVars::from_call(call);
        interpolate(&self.text, |name| vars.get(name).map(str::to_owned))
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Interpolation variables for one predicate call.
///
/// Every binding is available under its parameter name. Range arguments also
/// expose their bounds as `<name>_left` and `<name>_right`, and the validated
/// input is available as both `input` and `value`.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    vars: HashMap<String, String>,
}

impl TemplateVars {
    /// Collects variables from a call.
    #[must_use]
    pub fn from_call(call: &PredicateCall) -> Self {
        let mut vars = HashMap::with_capacity(call.args.len() + 2);
        for binding in &call.args {
            if let Arg::Range { start, end } = binding.value {
                vars.insert(format!("{}_left", binding.name), start.to_string());
                vars.insert(format!("{}_right", binding.name), end.to_string());
            }
            vars.insert(binding.name.clone(), binding.value.to_string());
        }
        vars.insert("value".to_owned(), call.input().to_string());
        Self { vars }
    }

    /// Looks up a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}
