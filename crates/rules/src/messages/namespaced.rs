//! Namespaced message lookups

use std::sync::Arc;

use crate::messages::{LookupTokens, MessageBackend, MessageCache, MessagesConfig};

/// Tries `<root>.<namespace>` keys before the wrapped backend's own keys.
///
/// Useful when one template source serves several schemas that need to
/// override a few messages each.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use nebula_rules::messages::{
///     LookupOptions, MessageBackend, NamespacedMessages, StaticMessages, TemplateTree,
/// };
///
/// let tree = TemplateTree::from_yaml_str(
///     "en:\n  errors:\n    filled?: \"must be filled\"\n    user:\n      filled?: \"please fill in\"\n",
/// )?;
/// let base = Arc::new(StaticMessages::builtin().merge(tree));
/// let user = NamespacedMessages::new("user", base.clone());
///
/// let options = LookupOptions::default();
/// assert_eq!(user.resolve("filled?", &options).unwrap().text(), "please fill in");
/// assert_eq!(user.resolve("int?", &options).unwrap().text(), "must be an integer");
/// assert_eq!(base.resolve("filled?", &options).unwrap().text(), "must be filled");
/// # Ok::<(), nebula_rules::foundation::MessagesError>(())
/// ```
#[derive(Debug)]
pub struct NamespacedMessages {
    namespace: String,
    inner: Arc<dyn MessageBackend>,
    cache: MessageCache,
}

impl NamespacedMessages {
    /// Wraps `inner` under `namespace`.
    pub fn new(namespace: impl Into<String>, inner: Arc<dyn MessageBackend>) -> Self {
        Self {
            namespace: namespace.into(),
            inner,
            cache: MessageCache::new(),
        }
    }

    /// The namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl MessageBackend for NamespacedMessages {
    fn config(&self) -> &MessagesConfig {
        self.inner.config()
    }

    fn cache(&self) -> &MessageCache {
        &self.cache
    }

    fn key_exists(&self, key: &str, locale: &str) -> bool {
        self.inner.key_exists(key, locale)
    }

    fn text(&self, key: &str, locale: &str) -> Option<String> {
        self.inner.text(key, locale)
    }

    fn default_locale(&self) -> &str {
        self.inner.default_locale()
    }

    fn lookup_paths(&self, tokens: &LookupTokens) -> Vec<String> {
        let namespaced = LookupTokens {
            root: format!("{}.{}", tokens.root, self.namespace),
            ..tokens.clone()
        };
        let mut paths = self.inner.lookup_paths(&namespaced);
        paths.extend(self.inner.lookup_paths(tokens));
        paths
    }

    fn rule_name(&self, name: &str, locale: Option<&str>) -> Option<String> {
        self.inner
            .rule_name(&format!("{}.{name}", self.namespace), locale)
            .or_else(|| self.inner.rule_name(name, locale))
    }
}
