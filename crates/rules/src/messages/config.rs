//! Message backend configuration

use std::collections::BTreeMap;
use std::path::Path as FsPath;

use serde::{Deserialize, Serialize};

use crate::foundation::{MessagesError, ValueShape};

/// Candidate key patterns, most specific first.
pub const DEFAULT_LOOKUP_PATHS: [&str; 9] = [
    "%{root}.rules.%{path}.%{predicate}.arg.%{arg_type}",
    "%{root}.rules.%{path}.%{predicate}",
    "%{root}.%{predicate}.%{message_type}",
    "%{root}.%{predicate}.value.%{path}.arg.%{arg_type}",
    "%{root}.%{predicate}.value.%{path}",
    "%{root}.%{predicate}.value.%{val_type}.arg.%{arg_type}",
    "%{root}.%{predicate}.value.%{val_type}",
    "%{root}.%{predicate}.arg.%{arg_type}",
    "%{root}.%{predicate}",
];

/// Settings shared by every message backend.
///
/// Every field has a default, so a YAML document only needs the settings it
/// changes:
///
/// ```
/// use nebula_rules::messages::MessagesConfig;
///
/// let config = MessagesConfig::from_yaml_str("root: validation\ndefault_locale: pl\n")?;
/// assert_eq!(config.root, "validation");
/// assert_eq!(config.lookup_paths.len(), 9);
/// # Ok::<(), nebula_rules::foundation::MessagesError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Namespace every candidate key starts with.
    pub root: String,
    /// Locale used when none is requested, and as the fallback locale.
    pub default_locale: String,
    /// Ordered candidate key patterns.
    pub lookup_paths: Vec<String>,
    /// Tags for argument shapes; unlisted shapes use `arg_type_default`.
    pub arg_types: BTreeMap<ValueShape, String>,
    /// Tags for input shapes; unlisted shapes use `val_type_default`.
    pub val_types: BTreeMap<ValueShape, String>,
    /// Fallback argument tag.
    pub arg_type_default: String,
    /// Fallback input tag.
    pub val_type_default: String,
    /// Message type used when a lookup does not name one.
    pub message_type: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            root: "errors".into(),
            default_locale: "en".into(),
            lookup_paths: DEFAULT_LOOKUP_PATHS.iter().map(|p| (*p).to_owned()).collect(),
            arg_types: BTreeMap::from([(ValueShape::Range, "range".to_owned())]),
            val_types: BTreeMap::from([
                (ValueShape::Range, "range".to_owned()),
                (ValueShape::String, "string".to_owned()),
            ]),
            arg_type_default: "default".into(),
            val_type_default: "default".into(),
            message_type: "failure".into(),
        }
    }
}

impl MessagesConfig {
    /// Parses a configuration from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, MessagesError> {
        serde_yaml::from_str(yaml).map_err(|source| MessagesError::Parse { path: None, source })
    }

    /// Reads a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<FsPath>) -> Result<Self, MessagesError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MessagesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| MessagesError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    /// Sets the root namespace.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Sets the default locale.
    #[must_use]
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    /// Replaces the candidate key patterns.
    #[must_use]
    pub fn with_lookup_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lookup_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Tags an argument shape.
    #[must_use]
    pub fn with_arg_type(mut self, shape: ValueShape, tag: impl Into<String>) -> Self {
        self.arg_types.insert(shape, tag.into());
        self
    }

    /// Tags an input shape.
    #[must_use]
    pub fn with_val_type(mut self, shape: ValueShape, tag: impl Into<String>) -> Self {
        self.val_types.insert(shape, tag.into());
        self
    }

    /// Tag for an argument shape; `None` means no single argument.
    #[must_use]
    pub fn arg_type(&self, shape: Option<ValueShape>) -> &str {
        shape
            .and_then(|s| self.arg_types.get(&s))
            .map_or(&self.arg_type_default, |tag| tag)
    }

    /// Tag for an input shape.
    #[must_use]
    pub fn val_type(&self, shape: ValueShape) -> &str {
        self.val_types
            .get(&shape)
            .map_or(&self.val_type_default, |tag| tag)
    }
}
