//! Predicate catalog for looking up predicates by name.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::foundation::SchemaError;
use crate::predicates::{Arg, ArgBinding, BuiltinPredicate, Predicate, PredicateRef};

/// Thread-safe registry of predicates.
///
/// The catalog is an explicitly constructed value: schemas borrow it while
/// they are built and keep [`PredicateRef`] handles afterwards, so there is no
/// process-wide registry.
///
/// # Examples
///
/// ```
/// use nebula_rules::predicates::PredicateCatalog;
///
/// let catalog = PredicateCatalog::builtin();
/// assert!(catalog.contains("filled?"));
/// assert_eq!(catalog.params("gt?").unwrap(), vec!["num", "input"]);
/// ```
#[derive(Debug)]
pub struct PredicateCatalog {
    predicates: DashMap<String, PredicateRef>,
}

impl PredicateCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            predicates: DashMap::new(),
        }
    }

    /// Creates a catalog holding every [`BuiltinPredicate`].
    #[must_use]
    pub fn builtin() -> Self {
        let catalog = Self::new();
        for predicate in BuiltinPredicate::ALL {
            catalog.predicates.insert(
                predicate.as_str().to_owned(),
                PredicateRef::new(Arc::new(*predicate)),
            );
        }
        catalog
    }

    /// Registers a predicate.
    ///
    /// Names are unique; registering a name twice is a schema construction
    /// error rather than a silent replacement.
    pub fn register(&self, predicate: Arc<dyn Predicate>) -> Result<(), SchemaError> {
        match self.predicates.entry(predicate.name().to_owned()) {
            Entry::Occupied(slot) => Err(SchemaError::DuplicatePredicate {
                name: slot.key().clone(),
            }),
            Entry::Vacant(slot) => {
                tracing::debug!(
                    predicate = %slot.key(),
                    arity = predicate.arity(),
                    "registered predicate"
                );
                slot.insert(PredicateRef::new(predicate));
                Ok(())
            }
        }
    }

    /// Looks up a predicate by name.
    pub fn get(&self, name: &str) -> Result<PredicateRef, SchemaError> {
        self.predicates
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SchemaError::unknown_predicate(name))
    }

    /// Checks if a predicate is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Returns the ordered parameter names of a predicate.
    pub fn params(&self, name: &str) -> Result<Vec<&'static str>, SchemaError> {
        self.get(name).map(|p| p.get().params().to_vec())
    }

    /// Pairs declared parameter names with supplied values.
    ///
    /// Missing trailing arguments, including the input slot, are padded with
    /// [`Arg::Undefined`]. Supplying more values than there are parameters
    /// besides the input is an arity error.
    pub fn arg_list(&self, name: &str, values: Vec<Arg>) -> Result<Vec<ArgBinding>, SchemaError> {
        let predicate = self.get(name)?;
        let params = predicate.get().params();
        let bindable = params.len().saturating_sub(1);
        if values.len() > bindable {
            return Err(SchemaError::ArityMismatch {
                name: name.to_owned(),
                expected: bindable,
                given: values.len(),
            });
        }

        let mut values = values.into_iter();
        Ok(params
            .iter()
            .map(|param| ArgBinding::new(*param, values.next().unwrap_or(Arg::Undefined)))
            .collect())
    }

    /// Number of registered predicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// All registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.predicates.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl Default for PredicateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
