use std::borrow::Cow;
use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use kanon_core::Value;

use super::{AccessError, Accessor, PathSegment, Probe, Scalar};

/// String key/value data addressed with dotted keys.
///
/// Nested members use `a.b`, indexed elements `items.0.name`, and a key
/// repeated in the source yields one element per occurrence
/// (`tags=a&tags=b` reads as `tags.0 = a`, `tags.1 = b`).
///
/// ```
/// use kanon_extract::{Accessor, FlatSource, PathSegment, Probe};
///
/// let form = FlatSource::from_pairs([("tags", "a"), ("tags", "b"), ("owner.name", "ann")]);
/// let tag = [PathSegment::Key("tags".into()), PathSegment::Index(1)];
/// assert!(matches!(form.probe(&tag).unwrap(), Probe::Scalar(_)));
/// assert_eq!(form.probe(&[PathSegment::Key("owner".into())]).unwrap(), Probe::Object);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlatSource {
    entries: IndexMap<String, Vec<String>>,
    /// Every proper dotted prefix of a key, so `a.b.c` marks `a` and `a.b`.
    parents: HashSet<String>,
    fold_case: bool,
}

impl FlatSource {
    /// Creates an empty, case-sensitive source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty source whose keys match case-insensitively, as
    /// header names do.
    #[must_use]
    pub fn case_insensitive() -> Self {
        Self {
            fold_case: true,
            ..Self::default()
        }
    }

    /// Builds a case-sensitive source from pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut source = Self::new();
        for (key, value) in pairs {
            source.push(key, value);
        }
        source
    }

    /// Appends a value under `key`.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = self.fold(key.into());
        for (dot, _) in key.match_indices('.') {
            self.parents.insert(key[..dot].to_string());
        }
        self.entries.entry(key).or_default().push(value.into());
    }

    /// Returns `true` if no value was pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fold(&self, key: String) -> String {
        if self.fold_case {
            key.to_ascii_lowercase()
        } else {
            key
        }
    }

    fn key(&self, path: &[PathSegment]) -> String {
        let mut key = String::new();
        for (i, segment) in path.iter().enumerate() {
            if i > 0 {
                key.push('.');
            }
            match segment {
                PathSegment::Key(k) if self.fold_case => key.push_str(&k.to_ascii_lowercase()),
                PathSegment::Key(k) => key.push_str(k),
                PathSegment::Index(index) => key.push_str(&index.to_string()),
            }
        }
        key
    }

    fn has_children(&self, key: &str) -> bool {
        key.is_empty() || self.parents.contains(key)
    }

    fn text(value: &str) -> Probe<'_> {
        Probe::Scalar(Scalar::Text(Cow::Borrowed(value)))
    }
}

impl Accessor for FlatSource {
    fn probe(&self, path: &[PathSegment]) -> Result<Probe<'_>, AccessError> {
        let key = self.key(path);
        if let Some(values) = self.entries.get(&key) {
            return Ok(values.first().map_or(Probe::Absent, |v| Self::text(v)));
        }
        if let Some((PathSegment::Index(index), parent)) = path.split_last() {
            if let Some(values) = self.entries.get(&self.key(parent)) {
                return Ok(values.get(*index).map_or(Probe::Absent, |v| Self::text(v)));
            }
        }
        if self.has_children(&key) {
            return Ok(Probe::Object);
        }
        Ok(Probe::Absent)
    }

    fn keys(&self, path: &[PathSegment]) -> Result<Vec<String>, AccessError> {
        let key = self.key(path);
        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{key}.")
        };
        let keys: IndexSet<String> = self
            .entries
            .keys()
            .filter_map(|k| k.strip_prefix(prefix.as_str()))
            .map(|rest| rest.split('.').next().unwrap_or(rest).to_string())
            .collect();
        Ok(keys.into_iter().collect())
    }

    fn elements(&self, path: &[PathSegment]) -> Result<Option<Vec<Probe<'_>>>, AccessError> {
        Ok(self
            .entries
            .get(&self.key(path))
            .map(|values| values.iter().map(|v| Self::text(v)).collect()))
    }

    fn materialize(&self, path: &[PathSegment]) -> Result<Option<Value>, AccessError> {
        Ok(match self.entries.get(&self.key(path)) {
            Some(values) if values.len() > 1 => Some(Value::List(
                values.iter().map(|v| Value::String(v.clone())).collect(),
            )),
            Some(values) => values.first().map(|v| Value::String(v.clone())),
            None => None,
        })
    }

    fn is_textual(&self) -> bool {
        true
    }
}
