//! Memoized message resolution

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::messages::{LookupOptions, MessageTemplate};

/// Full lookup signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    predicate: String,
    options: LookupOptions,
}

/// Per-backend resolution cache.
///
/// Entries live as long as the backend and are never evicted. Misses are
/// cached too, so a signature walks the candidate chain once. The map is
/// sharded, so concurrent validations only contend on the shard they touch.
#[derive(Debug, Default)]
pub struct MessageCache {
    entries: DashMap<CacheKey, Option<Arc<MessageTemplate>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    generation: AtomicU64,
}

impl MessageCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached resolution, or computes and stores it.
    ///
    /// `resolve` runs without any shard lock held. When two threads race on
    /// the same signature both compute it and the first stored value wins;
    /// resolution is deterministic, so they agree.
    ///
    /// A resolution that overlaps [`MessageCache::clear`] is returned to its
    /// caller but not stored, since it may have read templates the clear was
    /// meant to invalidate.
    pub fn get_or_resolve(
        &self,
        predicate: &str,
        options: &LookupOptions,
        resolve: impl FnOnce() -> Option<MessageTemplate>,
    ) -> Option<Arc<MessageTemplate>> {
        let key = CacheKey {
            predicate: predicate.to_owned(),
            options: options.clone(),
        };
        if let Some(entry) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(predicate, path = %options.path, "message cache hit");
            return entry.value().clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(predicate, path = %options.path, "message cache miss");
        let generation = self.generation.load(Ordering::Acquire);
        let resolved = resolve().map(Arc::new);
        if self.generation.load(Ordering::Acquire) != generation {
            tracing::trace!(predicate, "cache cleared during resolution, not storing");
            return resolved;
        }
        let stored = self.entries.entry(key.clone()).or_insert(resolved).value().clone();
        // A clear between the check above and the insert bumps the generation
        // before it empties the map, so this catches what it missed.
        if self.generation.load(Ordering::Acquire) != generation {
            self.entries.remove(&key);
        }
        stored
    }

    /// Drops every entry and resets the counters.
    ///
    /// Resolutions still in flight when this runs are not stored.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len() as u64,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Statistics about the message cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached signatures.
    pub entries: u64,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that walked the candidate chain.
    pub misses: u64,
}

impl CacheStats {
    /// Total number of lookups.
    #[must_use]
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups answered from the cache (0.0 to 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.lookups();
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Path;
    use std::cell::Cell;

    #[test]
    fn resolves_each_signature_once() {
        let cache = MessageCache::new();
        let options = LookupOptions {
            path: Path::from("email"),
            ..LookupOptions::default()
        };
        let walks = Cell::new(0);
        let resolve = || {
            walks.set(walks.get() + 1);
            Some(MessageTemplate::new("errors.filled?", "must be filled"))
        };

        let first = cache.get_or_resolve("filled?", &options, resolve);
        let second = cache.get_or_resolve("filled?", &options, resolve);
        assert_eq!(first, second);
        assert_eq!(walks.get(), 1);

        let stats = cache.stats();
        assert_eq!((stats.entries, stats.hits, stats.misses), (1, 1, 1));
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn misses_are_cached() {
        let cache = MessageCache::new();
        let options = LookupOptions::default();
        assert!(cache.get_or_resolve("nope?", &options, || None).is_none());
        let again = cache.get_or_resolve("nope?", &options, || {
            Some(MessageTemplate::new("k", "never used"))
        });
        assert!(again.is_none());
    }

    #[test]
    fn signature_includes_every_option() {
        let cache = MessageCache::new();
        let plain = LookupOptions::default();
        let negated = LookupOptions {
            negated: true,
            ..LookupOptions::default()
        };
        cache.get_or_resolve("empty?", &plain, || Some(MessageTemplate::new("a", "must be empty")));
        let hit = cache.get_or_resolve("empty?", &negated, || {
            Some(MessageTemplate::new("b", "cannot be empty"))
        });
        assert_eq!(hit.unwrap().text(), "cannot be empty");
        assert_eq!(cache.stats().entries, 2);
    }

    #[test]
    fn resolutions_overlapping_clear_are_not_stored() {
        let cache = MessageCache::new();
        let options = LookupOptions::default();
        let stale = cache.get_or_resolve("filled?", &options, || {
            cache.clear();
            Some(MessageTemplate::new("errors.filled?", "OLD"))
        });
        assert_eq!(stale.unwrap().text(), "OLD");
        assert_eq!(cache.stats().entries, 0);

        let fresh = cache.get_or_resolve("filled?", &options, || {
            Some(MessageTemplate::new("errors.filled?", "NEW"))
        });
        assert_eq!(fresh.unwrap().text(), "NEW");
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn clear_resets_counters() {
        let cache = MessageCache::new();
        cache.get_or_resolve("x?", &LookupOptions::default(), || None);
        cache.clear();
        assert_eq!(cache.stats().lookups(), 0);
        assert_eq!(cache.stats().entries, 0);
    }
}
