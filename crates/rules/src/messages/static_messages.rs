//! In-memory message backend

use std::path::Path as FsPath;

use crate::foundation::MessagesError;
use crate::messages::{MessageBackend, MessageCache, MessagesConfig, TemplateTree};

/// Templates bundled with the crate.
pub const DEFAULT_ERRORS: &str = include_str!("../../config/errors.yml");

/// Immutable templates held in memory.
///
/// Merging produces a new backend with a fresh cache, so resolutions cached
/// against the old templates never leak into the new one.
///
/// # Examples
///
/// ```
/// use nebula_rules::messages::{LookupOptions, MessageBackend, StaticMessages};
///
/// let messages = StaticMessages::builtin();
/// let template = messages.resolve("filled?", &LookupOptions::default()).unwrap();
/// assert_eq!(template.text(), "must be filled");
/// ```
#[derive(Debug)]
pub struct StaticMessages {
    tree: TemplateTree,
    config: MessagesConfig,
    cache: MessageCache,
}

impl StaticMessages {
    /// Creates a backend over `tree`.
    #[must_use]
    pub fn from_tree(tree: TemplateTree, config: MessagesConfig) -> Self {
        Self {
            tree,
            config,
            cache: MessageCache::new(),
        }
    }

    /// Parses a YAML template source with the default configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, MessagesError> {
        Ok(Self::from_tree(
            TemplateTree::from_yaml_str(yaml)?,
            MessagesConfig::default(),
        ))
    }

    /// The bundled English templates.
    ///
    /// Falls back to an empty tree, logging the parse error, if the bundled
    /// source is ever malformed; every lookup then reports a missing
    /// translation.
    #[must_use]
    pub fn builtin() -> Self {
        let tree = TemplateTree::from_yaml_str(DEFAULT_ERRORS).unwrap_or_else(|error| {
            tracing::error!(%error, "bundled message templates failed to parse");
            TemplateTree::new()
        });
        Self::from_tree(tree, MessagesConfig::default())
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(self, config: MessagesConfig) -> Self {
        Self::from_tree(self.tree, config)
    }

    /// Returns a backend with `other` merged over these templates.
    #[must_use]
    pub fn merge(self, other: TemplateTree) -> Self {
        let Self { mut tree, config, .. } = self;
        tracing::info!(templates = other.len(), "merging message templates");
        tree.merge(other);
        Self::from_tree(tree, config)
    }

    /// Returns a backend with a YAML file merged over these templates.
    pub fn merge_file(self, path: impl AsRef<FsPath>) -> Result<Self, MessagesError> {
        let path = path.as_ref();
        let other = TemplateTree::from_yaml_file(path)?;
        tracing::info!(path = %path.display(), "loaded message file");
        Ok(self.merge(other))
    }

    /// The loaded templates.
    #[must_use]
    pub fn tree(&self) -> &TemplateTree {
        &self.tree
    }
}

impl Default for StaticMessages {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MessageBackend for StaticMessages {
    fn config(&self) -> &MessagesConfig {
        &self.config
    }

    fn cache(&self) -> &MessageCache {
        &self.cache
    }

    fn key_exists(&self, key: &str, locale: &str) -> bool {
        self.tree.contains(locale, key)
    }

    fn text(&self, key: &str, locale: &str) -> Option<String> {
        self.tree.text(locale, key).map(str::to_owned)
    }
}
