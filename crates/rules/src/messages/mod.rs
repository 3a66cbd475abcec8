//! Localized error messages
//!
//! A [`MessageBackend`] turns a failed predicate into a template by rendering
//! an ordered list of candidate keys and returning the first one that exists
//! as text, trying the requested locale before the default one. Resolutions
//! are memoized per backend instance in a [`MessageCache`].
//!
//! Backends:
//!
//! - [`StaticMessages`]: immutable in-memory templates, the bundled English
//!   set by default
//! - [`LocalizedMessages`]: delegates to a [`Translator`], e.g. the YAML-file
//!   backed [`CatalogTranslator`]
//! - [`NamespacedMessages`]: tries `<root>.<namespace>` keys before those of
//!   the backend it wraps
//!
//! [`MessageCompiler`] walks failure trees and builds an [`ErrorReport`].

pub mod cache;
pub mod compiler;
pub mod config;
pub mod localized;
pub mod lookup;
pub mod namespaced;
pub mod report;
pub mod static_messages;
pub mod template;
pub mod tree;

use std::fmt;
use std::sync::Arc;

pub use cache::{CacheStats, MessageCache};
pub use compiler::MessageCompiler;
pub use config::{DEFAULT_LOOKUP_PATHS, MessagesConfig};
pub use localized::{CatalogTranslator, LocalizedMessages, Translator};
pub use lookup::{LookupOptions, LookupTokens};
pub use namespaced::NamespacedMessages;
pub use report::{ErrorReport, ReportKey};
pub use static_messages::StaticMessages;
pub use template::{MessageTemplate, TemplateVars};
pub use tree::{TemplateNode, TemplateTree};

/// Resolves message templates for failed predicates.
///
/// Implementors provide raw key access; candidate rendering, locale fallback
/// and caching are provided.
pub trait MessageBackend: fmt::Debug + Send + Sync {
    /// Backend configuration.
    fn config(&self) -> &MessagesConfig;

    /// Resolution cache owned by this backend.
    fn cache(&self) -> &MessageCache;

    /// Returns `true` if anything, text or table, lives at `key` in `locale`.
    fn key_exists(&self, key: &str, locale: &str) -> bool;

    /// Returns the text at `key` in `locale`, or `None` for absent keys and
    /// tables.
    fn text(&self, key: &str, locale: &str) -> Option<String>;

    /// Locale used when a lookup does not request one.
    fn default_locale(&self) -> &str {
        &self.config().default_locale
    }

    /// Renders the candidate keys for `tokens`, most specific first.
    fn lookup_paths(&self, tokens: &LookupTokens) -> Vec<String> {
        tokens.render_all(&self.config().lookup_paths)
    }

    /// Walks the candidate keys without consulting the cache.
    ///
    /// A candidate matches when it exists in the locale and holds text; keys
    /// that are absent are never read.
    fn lookup(&self, predicate: &str, options: &LookupOptions) -> Option<MessageTemplate> {
        let tokens = LookupTokens::new(self.config(), predicate, options);
        let requested = options.locale.as_deref().unwrap_or_else(|| self.default_locale());
        let fallback = self.default_locale();

        for key in self.lookup_paths(&tokens) {
            for locale in locales(requested, fallback) {
                if !self.key_exists(&key, locale) {
                    continue;
                }
                if let Some(text) = self.text(&key, locale) {
                    tracing::trace!(predicate, key = %key, locale, "resolved message");
                    return Some(MessageTemplate::new(key, text));
                }
            }
        }
        None
    }

    /// Resolves a template, memoized by predicate and options.
    fn resolve(&self, predicate: &str, options: &LookupOptions) -> Option<Arc<MessageTemplate>> {
        self.cache()
            .get_or_resolve(predicate, options, || self.lookup(predicate, options))
    }

    /// The most specific candidate key, reported when nothing resolves.
    fn missing_key(&self, predicate: &str, options: &LookupOptions) -> String {
        let tokens = LookupTokens::new(self.config(), predicate, options);
        self.lookup_paths(&tokens)
            .into_iter()
            .next()
            .unwrap_or_else(|| format!("{}.{predicate}", tokens.root))
    }

    /// Localized display name of a rule, from `rules.<name>`.
    fn rule_name(&self, name: &str, locale: Option<&str>) -> Option<String> {
        let key = format!("rules.{name}");
        let requested = locale.unwrap_or_else(|| self.default_locale());
        locales(requested, self.default_locale()).find_map(|locale| self.text(&key, locale))
    }

    /// Localized word joining the sides of a failed disjunction.
    fn or_word(&self, locale: Option<&str>) -> String {
        let key = format!("{}.or", self.config().root);
        let requested = locale.unwrap_or_else(|| self.default_locale());
        locales(requested, self.default_locale())
            .find_map(|locale| self.text(&key, locale))
            .unwrap_or_else(|| "or".to_owned())
    }
}

/// The requested locale, then the fallback when it differs.
fn locales<'a>(requested: &'a str, fallback: &'a str) -> impl Iterator<Item = &'a str> {
    std::iter::once(requested).chain((requested != fallback).then_some(fallback))
}
