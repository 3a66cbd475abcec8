//! Message backend delegating to a localization library

use std::fmt;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::foundation::MessagesError;
use crate::messages::{MessageBackend, MessageCache, MessagesConfig, TemplateTree};

/// A localization library the message backend can delegate to.
pub trait Translator: fmt::Debug + Send + Sync {
    /// Returns `true` if `key` is defined for `locale`.
    fn exists(&self, key: &str, locale: &str) -> bool;

    /// Returns the text at `key` for `locale`, or `None` for absent keys and
    /// non-text entries.
    fn translate(&self, key: &str, locale: &str) -> Option<String>;

    /// Loads an additional template source.
    fn load_path(&self, path: &FsPath) -> Result<(), MessagesError>;
}

// ============================================================================
// CATALOG TRANSLATOR
// ============================================================================

/// Translator backed by YAML template files.
///
/// Sources can be added while the translator is shared; later sources win on
/// conflicting keys.
#[derive(Debug, Default)]
pub struct CatalogTranslator {
    tree: RwLock<TemplateTree>,
    load_path: RwLock<Vec<PathBuf>>,
}

impl CatalogTranslator {
    /// Creates an empty translator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a translator preloaded with `tree`.
    #[must_use]
    pub fn from_tree(tree: TemplateTree) -> Self {
        Self {
            tree: RwLock::new(tree),
            load_path: RwLock::new(Vec::new()),
        }
    }

    /// Creates a translator holding the bundled templates.
    pub fn builtin() -> Result<Self, MessagesError> {
        TemplateTree::from_yaml_str(super::static_messages::DEFAULT_ERRORS).map(Self::from_tree)
    }

    /// Merges an in-memory tree.
    pub fn add_tree(&self, tree: TemplateTree) {
        self.tree.write().merge(tree);
    }

    /// Files loaded so far, in load order.
    #[must_use]
    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.load_path.read().clone()
    }
}

impl Translator for CatalogTranslator {
    fn exists(&self, key: &str, locale: &str) -> bool {
        self.tree.read().contains(locale, key)
    }

    fn translate(&self, key: &str, locale: &str) -> Option<String> {
        self.tree.read().text(locale, key).map(str::to_owned)
    }

    fn load_path(&self, path: &FsPath) -> Result<(), MessagesError> {
        let tree = TemplateTree::from_yaml_file(path)?;
        self.tree.write().merge(tree);
        self.load_path.write().push(path.to_path_buf());
        Ok(())
    }
}

// ============================================================================
// LOCALIZED MESSAGES
// ============================================================================

/// Message backend that reads templates through a [`Translator`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use nebula_rules::messages::{
///     CatalogTranslator, LocalizedMessages, LookupOptions, MessageBackend, MessagesConfig,
/// };
///
/// let translator = Arc::new(CatalogTranslator::builtin()?);
/// let messages = LocalizedMessages::new(translator, MessagesConfig::default());
/// let template = messages.resolve("key?", &LookupOptions::default()).unwrap();
/// assert_eq!(template.text(), "is missing");
/// # Ok::<(), nebula_rules::foundation::MessagesError>(())
/// ```
#[derive(Debug)]
pub struct LocalizedMessages<T: Translator = CatalogTranslator> {
    translator: Arc<T>,
    config: MessagesConfig,
    cache: MessageCache,
}

impl<T: Translator> LocalizedMessages<T> {
    /// Creates a backend over `translator`.
    #[must_use]
    pub fn new(translator: Arc<T>, config: MessagesConfig) -> Self {
        Self {
            translator,
            config,
            cache: MessageCache::new(),
        }
    }

    /// The wrapped translator.
    #[must_use]
    pub fn translator(&self) -> &Arc<T> {
        &self.translator
    }

    /// Loads templates from `path` into the translator.
    ///
    /// Cached resolutions are dropped, since new templates can change which
    /// candidate wins.
    pub fn merge(&self, path: impl AsRef<FsPath>) -> Result<&Self, MessagesError> {
        let path = path.as_ref();
        self.translator.load_path(path)?;
        self.cache.clear();
        tracing::info!(path = %path.display(), "merged message file");
        Ok(self)
    }
}

impl<T: Translator> MessageBackend for LocalizedMessages<T> {
    fn config(&self) -> &MessagesConfig {
        &self.config
    }

    fn cache(&self) -> &MessageCache {
        &self.cache
    }

    fn key_exists(&self, key: &str, locale: &str) -> bool {
        self.translator.exists(key, locale)
    }

    fn text(&self, key: &str, locale: &str) -> Option<String> {
        self.translator.translate(key, locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::LookupOptions;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn messages() -> LocalizedMessages {
        let translator = Arc::new(CatalogTranslator::builtin().unwrap());
        LocalizedMessages::new(translator, MessagesConfig::default())
    }

    #[test]
    fn resolves_through_translator() {
        let messages = messages();
        let options = LookupOptions::default();
        assert_eq!(messages.resolve("int?", &options).unwrap().text(), "must be an integer");
        assert!(messages.key_exists("errors.size?", "en"));
        assert!(messages.text("errors.size?", "en").is_none());
    }

    #[test]
    fn merge_loads_files_and_drops_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("de.yml");
        std::fs::write(
            &path,
            "de:\n  errors:\n    filled?: \"muss ausgefüllt sein\"\nen:\n  errors:\n    filled?: \"is required\"\n",
        )
        .unwrap();

        let messages = messages();
        let options = LookupOptions::default();
        assert_eq!(messages.resolve("filled?", &options).unwrap().text(), "must be filled");

        messages.merge(&path).unwrap();
        assert_eq!(messages.cache().stats().entries, 0);
        assert_eq!(messages.resolve("filled?", &options).unwrap().text(), "is required");

        let de = LookupOptions::default().with_locale("de");
        assert_eq!(messages.resolve("filled?", &de).unwrap().text(), "muss ausgefüllt sein");
        assert_eq!(messages.translator().loaded_paths(), vec![path]);
    }

    #[test]
    fn merge_reports_missing_files() {
        let messages = messages();
        assert!(matches!(
            messages.merge("/no/such/messages.yml"),
            Err(MessagesError::Io { .. })
        ));
    }

    #[test]
    fn translator_can_be_shared() {
        let translator = Arc::new(CatalogTranslator::new());
        let a = LocalizedMessages::new(Arc::clone(&translator), MessagesConfig::default());
        let b = LocalizedMessages::new(Arc::clone(&translator), MessagesConfig::default());
        translator.add_tree(TemplateTree::from_yaml_str("en:\n  errors:\n    odd?: \"must be odd\"\n").unwrap());
        let options = LookupOptions::default();
        assert_eq!(a.resolve("odd?", &options).unwrap().text(), "must be odd");
        assert_eq!(b.resolve("odd?", &options).unwrap().text(), "must be odd");
    }

    /// Holds the first `translate` call until the test releases it.
    #[derive(Debug)]
    struct Gated {
        text: RwLock<String>,
        held: AtomicBool,
        reached: Barrier,
        released: Barrier,
    }

    impl Gated {
        fn new(text: &str) -> Self {
            Self {
                text: RwLock::new(text.to_owned()),
                held: AtomicBool::new(false),
                reached: Barrier::new(2),
                released: Barrier::new(2),
            }
        }
    }

    impl Translator for Gated {
        fn exists(&self, key: &str, _locale: &str) -> bool {
            key == "errors.filled?"
        }

        fn translate(&self, key: &str, _locale: &str) -> Option<String> {
            if key != "errors.filled?" {
                return None;
            }
            let text = self.text.read().clone();
            if !self.held.swap(true, Ordering::SeqCst) {
                self.reached.wait();
                self.released.wait();
            }
            Some(text)
        }

        fn load_path(&self, _path: &FsPath) -> Result<(), MessagesError> {
            *self.text.write() = "NEW".to_owned();
            Ok(())
        }
    }

    #[test]
    fn lookup_in_flight_during_merge_is_not_cached() {
        let translator = Arc::new(Gated::new("OLD"));
        let messages = LocalizedMessages::new(Arc::clone(&translator), MessagesConfig::default());
        let options = LookupOptions::default();

        let in_flight = std::thread::scope(|scope| {
            let lookup = scope.spawn(|| messages.resolve("filled?", &options));
            translator.reached.wait();
            messages.merge("new.yml").unwrap();
            translator.released.wait();
            lookup.join().unwrap()
        });

        assert_eq!(in_flight.unwrap().text(), "OLD");
        assert_eq!(messages.resolve("filled?", &options).unwrap().text(), "NEW");
        assert_eq!(messages.cache().stats().entries, 1);
    }

    /// Answers every key, but only reports `errors.filled?` as existing.
    #[derive(Debug, Default)]
    struct Sparse {
        reads: AtomicUsize,
    }

    impl Translator for Sparse {
        fn exists(&self, key: &str, _locale: &str) -> bool {
            key == "errors.filled?"
        }

        fn translate(&self, key: &str, _locale: &str) -> Option<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Some(format!("text of {key}"))
        }

        fn load_path(&self, _path: &FsPath) -> Result<(), MessagesError> {
            Ok(())
        }
    }

    #[test]
    fn absent_keys_are_not_read() {
        let translator = Arc::new(Sparse::default());
        let messages = LocalizedMessages::new(Arc::clone(&translator), MessagesConfig::default());
        let options = LookupOptions {
            path: crate::foundation::Path::from("email"),
            ..LookupOptions::default()
        };

        let template = messages.resolve("filled?", &options).unwrap();
        assert_eq!(template.key(), "errors.filled?");
        assert_eq!(template.text(), "text of errors.filled?");
        assert_eq!(translator.reads.load(Ordering::SeqCst), 1);
    }
}
