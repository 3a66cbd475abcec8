//! Lookup options and candidate key rendering

use crate::foundation::{Path, ValueShape};
use crate::messages::MessagesConfig;
use crate::messages::template::interpolate;
use crate::rule::PredicateCall;

/// Everything besides the predicate name that selects a message.
///
/// Two lookups with equal options for the same predicate always resolve to the
/// same template, so the pair is the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LookupOptions {
    /// Where the failure happened.
    pub path: Path,
    /// Rule name overriding the dotted path in `rules.*` keys.
    pub rule: Option<String>,
    /// Look under `<root>.not` instead of `<root>`.
    pub negated: bool,
    /// Shape of the single bound argument, if there is exactly one.
    pub arg_shape: Option<ValueShape>,
    /// Shape of the validated input.
    pub val_shape: Option<ValueShape>,
    /// Message type; the configured default when `None`.
    pub message_type: Option<String>,
    /// Requested locale; the backend default when `None`.
    pub locale: Option<String>,
}

impl LookupOptions {
    /// Options for a failed predicate call at `path`.
    #[must_use]
    pub fn for_call(path: &Path, call: &PredicateCall) -> Self {
        Self {
            path: path.clone(),
            negated: call.negated,
            arg_shape: call.arg_shape(),
            val_shape: Some(call.input_shape()),
            ..Self::default()
        }
    }

    /// Sets the rule name override.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Sets the requested locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Sets the message type.
    #[must_use]
    pub fn with_message_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_type = Some(message_type.into());
        self
    }
}

/// Values substituted into candidate key patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTokens {
    /// Root namespace, with `.not` appended for negated lookups.
    pub root: String,
    /// Predicate name.
    pub predicate: String,
    /// Rule name or dotted path.
    pub path: String,
    /// Argument tag.
    pub arg_type: String,
    /// Input tag.
    pub val_type: String,
    /// Message type.
    pub message_type: String,
}

impl LookupTokens {
    /// Derives tokens from a lookup request.
    #[must_use]
    pub fn new(config: &MessagesConfig, predicate: &str, options: &LookupOptions) -> Self {
        let root = if options.negated {
            format!("{}.not", config.root)
        } else {
            config.root.clone()
        };
        let val_type = options
            .val_shape
            .map_or(config.val_type_default.as_str(), |shape| config.val_type(shape));

        Self {
            root,
            predicate: predicate.to_owned(),
            path: options
                .rule
                .clone()
                .unwrap_or_else(|| options.path.to_string()),
            arg_type: config.arg_type(options.arg_shape).to_owned(),
            val_type: val_type.to_owned(),
            message_type: options
                .message_type
                .clone()
                .unwrap_or_else(|| config.message_type.clone()),
        }
    }

    fn get(&self, token: &str) -> Option<&str> {
        Some(match token {
            "root" => self.root.as_str(),
            "predicate" => self.predicate.as_str(),
            "path" => self.path.as_str(),
            "arg_type" => self.arg_type.as_str(),
            "val_type" => self.val_type.as_str(),
            "message_type" => self.message_type.as_str(),
            _ => return None,
        })
    }

    /// Renders one pattern. Unknown placeholders are left as written.
    #[must_use]
    pub fn render(&self, pattern: &str) -> String {
        interpolate(pattern, |name| self.get(name).map(str::to_owned))
    }

    /// Renders every pattern in order.
    #[must_use]
    pub fn render_all(&self, patterns: &[String]) -> Vec<String> {
        patterns.iter().map(|p| self.render(p)).collect()
    }
}
