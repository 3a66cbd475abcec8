//! Error reports shaped like the validated input

use std::fmt;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::foundation::{Path, PathSegment};

/// Key of a report entry: a map key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReportKey {
    /// A map key.
    Name(String),
    /// A zero-based sequence index.
    Index(usize),
}

impl From<&PathSegment> for ReportKey {
    fn from(segment: &PathSegment) -> Self {
        match segment {
            PathSegment::Key(key) => Self::Name(key.clone()),
            PathSegment::Index(index) => Self::Index(*index),
        }
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Nested error messages mirroring the shape of the validated input.
///
/// Every level holds its own messages plus child reports keyed by map key or
/// sequence index. Keys appear in the order their first message was
/// inserted. A child without children of its own serializes as a plain
/// message list; a level with both messages and children serializes its
/// messages under the empty key.
///
/// # Examples
///
/// ```
/// use nebula_rules::foundation::Path;
/// use nebula_rules::messages::ErrorReport;
/// use serde_json::json;
///
/// let mut report = ErrorReport::new();
/// report.insert(&Path::root().child("data").child(0usize).child("info"), "is missing");
/// report.insert(&Path::from("email"), "must be filled");
///
/// assert_eq!(
///     report.to_json(),
///     json!({"data": {"0": {"info": ["is missing"]}}, "email": ["must be filled"]})
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    base: Vec<String>,
    entries: IndexMap<ReportKey, ErrorReport>,
}

impl ErrorReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message at `path`.
    pub fn insert(&mut self, path: &Path, message: impl Into<String>) {
        let report = path.segments().iter().fold(self, |report, segment| {
            report.entries.entry(ReportKey::from(segment)).or_default()
        });
        report.base.push(message.into());
    }

    /// Merges `other` into this report; lists at the same path concatenate.
    pub fn merge(&mut self, other: ErrorReport) {
        self.base.extend(other.base);
        for (key, entry) in other.entries {
            self.entries.entry(key).or_default().merge(entry);
        }
    }

    /// Returns the report at `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&ErrorReport> {
        path.segments()
            .iter()
            .try_fold(self, |report, segment| report.entries.get(&ReportKey::from(segment)))
    }

    /// Messages reported directly at `path`.
    #[must_use]
    pub fn messages_at(&self, path: &Path) -> &[String] {
        self.get(path)
            .map(|report| report.base.as_slice())
            .unwrap_or_default()
    }

    /// Messages attached to this level itself.
    #[must_use]
    pub fn base(&self) -> &[String] {
        &self.base
    }

    /// Iterates over child reports in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ReportKey, &ErrorReport)> {
        self.entries.iter()
    }

    /// Number of keys at this level.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the report holds no message at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.entries.values().all(ErrorReport::is_empty)
    }

    /// Every message with its path, depth-first.
    #[must_use]
    pub fn flatten(&self) -> Vec<(Path, &str)> {
        let mut out = Vec::new();
        self.flatten_into(&Path::root(), &mut out);
        out
    }

    fn flatten_into<'a>(&'a self, at: &Path, out: &mut Vec<(Path, &'a str)>) {
        out.extend(self.base.iter().map(|m| (at.clone(), m.as_str())));
        for (key, entry) in &self.entries {
            let here = match key {
                ReportKey::Name(name) => at.child(name.as_str()),
                ReportKey::Index(index) => at.child(*index),
            };
            entry.flatten_into(&here, out);
        }
    }

    /// Converts the report to JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for ErrorReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let base = usize::from(!self.base.is_empty());
        let mut map = serializer.serialize_map(Some(self.entries.len() + base))?;
        if !self.base.is_empty() {
            map.serialize_entry("", &self.base)?;
        }
        for (key, entry) in &self.entries {
            map.serialize_entry(&key.to_string(), &Entry(entry))?;
        }
        map.end()
    }
}

/// A child report; leaves serialize as message lists.
struct Entry<'a>(&'a ErrorReport);

impl Serialize for Entry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.entries.is_empty() {
            self.0.base.serialize(serializer)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (path, message)) in self.flatten().into_iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            if path.is_root() {
                f.write_str(message)?;
            } else {
                write!(f, "{path}: {message}")?;
            }
        }
        Ok(())
    }
}
