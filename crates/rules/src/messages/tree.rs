//! Locale-keyed template trees
//!
//! Template sources are nested tables whose first level names a locale:
//!
//! ```yaml
//! en:
//!   errors:
//!     filled?: "must be filled"
//!     size?:
//!       arg:
//!         default: "size must be %{size}"
//! ```
//!
//! Keys are addressed with dots (`errors.size?.arg.default`) under a locale.

use std::path::Path as FsPath;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::foundation::MessagesError;

/// A node of a template tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    /// A message template.
    Text(String),
    /// A nested table.
    Table(IndexMap<String, TemplateNode>),
}

impl TemplateNode {
    fn from_yaml(value: &YamlValue) -> Option<Self> {
        match value {
            YamlValue::Mapping(map) => Some(Self::Table(
                map.iter()
                    .filter_map(|(k, v)| Some((yaml_key(k)?, Self::from_yaml(v)?)))
                    .collect(),
            )),
            YamlValue::Tagged(tagged) => Self::from_yaml(&tagged.value),
            other => yaml_key(other).map(Self::Text),
        }
    }

    fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Object(map) => Some(Self::Table(
                map.iter()
                    .filter_map(|(k, v)| Some((k.clone(), Self::from_json(v)?)))
                    .collect(),
            )),
            JsonValue::String(s) => Some(Self::Text(s.clone())),
            JsonValue::Number(n) => Some(Self::Text(n.to_string())),
            JsonValue::Bool(b) => Some(Self::Text(b.to_string())),
            JsonValue::Null | JsonValue::Array(_) => None,
        }
    }

    fn merge(&mut self, other: TemplateNode) {
        match (self, other) {
            (Self::Table(mine), Self::Table(theirs)) => {
                for (key, node) in theirs {
                    match mine.get_mut(&key) {
                        Some(existing) => existing.merge(node),
                        None => {
                            mine.insert(key, node);
                        }
                    }
                }
            }
            (slot, other) => *slot = other,
        }
    }

    fn count_texts(&self) -> usize {
        match self {
            Self::Text(_) => 1,
            Self::Table(map) => map.values().map(Self::count_texts).sum(),
        }
    }
}

fn yaml_key(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn yaml_kind(value: &YamlValue) -> &'static str {
    match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "a boolean",
        YamlValue::Number(_) => "a number",
        YamlValue::String(_) => "a string",
        YamlValue::Sequence(_) => "a sequence",
        YamlValue::Mapping(_) => "a mapping",
        YamlValue::Tagged(_) => "a tagged value",
    }
}

/// Templates for every loaded locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateTree {
    locales: IndexMap<String, TemplateNode>,
}

impl TemplateTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a YAML source.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, MessagesError> {
        let value: YamlValue = serde_yaml::from_str(yaml)
            .map_err(|source| MessagesError::Parse { path: None, source })?;
        Self::from_yaml_value(&value)
    }

    /// Reads a YAML file.
    pub fn from_yaml_file(path: impl AsRef<FsPath>) -> Result<Self, MessagesError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MessagesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: YamlValue = serde_yaml::from_str(&text).map_err(|source| MessagesError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })?;
        Self::from_yaml_value(&value)
    }

    fn from_yaml_value(value: &YamlValue) -> Result<Self, MessagesError> {
        let YamlValue::Mapping(map) = value else {
            return Err(MessagesError::InvalidTree {
                found: yaml_kind(value),
            });
        };
        let mut locales = IndexMap::with_capacity(map.len());
        for (key, node) in map {
            let (Some(locale), YamlValue::Mapping(_)) = (yaml_key(key), node) else {
                return Err(MessagesError::InvalidTree {
                    found: yaml_kind(node),
                });
            };
            if let Some(node) = TemplateNode::from_yaml(node) {
                locales.insert(locale, node);
            }
        }
        Ok(Self { locales })
    }

    /// Builds a tree from JSON, e.g. `{"en": {"errors": {...}}}`.
    pub fn from_json(value: &JsonValue) -> Result<Self, MessagesError> {
        let JsonValue::Object(map) = value else {
            return Err(MessagesError::InvalidTree {
                found: "a non-object value",
            });
        };
        let mut locales = IndexMap::with_capacity(map.len());
        for (locale, node) in map {
            match TemplateNode::from_json(node) {
                Some(node @ TemplateNode::Table(_)) => {
                    locales.insert(locale.clone(), node);
                }
                _ => {
                    return Err(MessagesError::InvalidTree {
                        found: "a non-object locale",
                    });
                }
            }
        }
        Ok(Self { locales })
    }

    /// Looks up the node at a dotted key.
    #[must_use]
    pub fn get(&self, locale: &str, key: &str) -> Option<&TemplateNode> {
        let root = self.locales.get(locale)?;
        key.split('.').try_fold(root, |node, segment| match node {
            TemplateNode::Table(map) => map.get(segment),
            TemplateNode::Text(_) => None,
        })
    }

    /// Returns `true` if anything, text or table, lives at `key`.
    #[must_use]
    pub fn contains(&self, locale: &str, key: &str) -> bool {
        self.get(locale, key).is_some()
    }

    /// Returns the template at `key` if it is text rather than a table.
    #[must_use]
    pub fn text(&self, locale: &str, key: &str) -> Option<&str> {
        match self.get(locale, key)? {
            TemplateNode::Text(text) => Some(text.as_str()),
            TemplateNode::Table(_) => None,
        }
    }

    /// Deep-merges `other` into this tree; `other` wins on conflicts.
    pub fn merge(&mut self, other: TemplateTree) {
        for (locale, node) in other.locales {
            match self.locales.get_mut(&locale) {
                Some(existing) => existing.merge(node),
                None => {
                    self.locales.insert(locale, node);
                }
            }
        }
    }

    /// Loaded locales in load order.
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.locales.keys().map(String::as_str)
    }

    /// Number of text templates across every locale.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locales.values().map(TemplateNode::count_texts).sum()
    }

    /// Returns `true` if no template is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SOURCE: &str = r#"
en:
  errors:
    filled?: "must be filled"
    size?:
      arg:
        default: "size must be %{size}"
    rules:
      tags:
        0: "first tag"
"#;

    #[test]
    fn walks_dotted_keys() {
        let tree = TemplateTree::from_yaml_str(SOURCE).unwrap();
        assert_eq!(tree.text("en", "errors.filled?"), Some("must be filled"));
        assert_eq!(tree.text("en", "errors.size?.arg.default"), Some("size must be %{size}"));
        assert_eq!(tree.text("en", "errors.rules.tags.0"), Some("first tag"));
        assert_eq!(tree.text("pl", "errors.filled?"), None);
    }

    #[test]
    fn tables_exist_but_are_not_text() {
        let tree = TemplateTree::from_yaml_str(SOURCE).unwrap();
        assert!(tree.contains("en", "errors.size?"));
        assert_eq!(tree.text("en", "errors.size?"), None);
        assert!(!tree.contains("en", "errors.filled?.failure"));
    }

    #[test]
    fn merge_is_deep_and_later_wins() {
        let mut tree = TemplateTree::from_yaml_str(SOURCE).unwrap();
        let other = TemplateTree::from_json(&json!({
            "en": {"errors": {"filled?": "is required", "size?": {"arg": {"range": "between"}}}},
            "pl": {"errors": {"filled?": "musi być wypełnione"}}
        }))
        .unwrap();
        tree.merge(other);

        assert_eq!(tree.text("en", "errors.filled?"), Some("is required"));
        assert_eq!(tree.text("en", "errors.size?.arg.default"), Some("size must be %{size}"));
        assert_eq!(tree.text("en", "errors.size?.arg.range"), Some("between"));
        assert_eq!(tree.text("pl", "errors.filled?"), Some("musi być wypełnione"));
        assert_eq!(tree.locales().collect::<Vec<_>>(), ["en", "pl"]);
    }

    #[test]
    fn top_level_must_be_locales() {
        assert!(matches!(
            TemplateTree::from_yaml_str("- a\n- b\n"),
            Err(MessagesError::InvalidTree { found: "a sequence" })
        ));
        assert!(matches!(
            TemplateTree::from_yaml_str("en: hello\n"),
            Err(MessagesError::InvalidTree { found: "a string" })
        ));
        assert!(matches!(
            TemplateTree::from_yaml_str("en: [\n"),
            Err(MessagesError::Parse { .. })
        ));
    }

    #[test]
    fn counts_texts() {
        let tree = TemplateTree::from_yaml_str(SOURCE).unwrap();
        assert_eq!(tree.len(), 3);
        assert!(TemplateTree::new().is_empty());
    }
}
