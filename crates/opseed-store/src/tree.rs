//! Flattened data tree: leaf path → value
//!
//! Paths are `/`-separated element local names. The first sibling with a
//! given name keeps the bare name; later ones get a 1-based positional
//! predicate: `/interfaces/interface`, `/interfaces/interface[2]`, ...
//! A single-instance element therefore has the same path whether or not
//! another file later adds more instances, which is what lets a later
//! snapshot overwrite an earlier one leaf by leaf.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered set of leaves from one or more snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataTree {
    leaves: BTreeMap<String, String>,
}

impl DataTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a leaf, returning the previous value.
    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.leaves.insert(path.into(), value.into())
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.leaves.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.leaves.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay `other` onto `self`; `other` wins on conflicting leaves.
    pub fn merge(&mut self, other: &DataTree) {
        for (path, value) in &other.leaves {
            self.leaves.insert(path.clone(), value.clone());
        }
    }

    /// Leaves selected by a simple absolute path.
    ///
    /// `/` (or an empty string) selects everything. `/a/b` selects `/a/b`
    /// itself, everything below it, and every instance `/a/b[n]`.
    pub fn subtree(&self, xpath: &str) -> DataTree {
        let prefix = xpath.trim_end_matches('/');
        if prefix.is_empty() {
            return self.clone();
        }
        let leaves = self
            .leaves
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(k, _)| selects(prefix, k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        DataTree { leaves }
    }
}

/// `key` starts with `prefix`; check the match ends on a segment boundary.
fn selects(prefix: &str, key: &str) -> bool {
    match key.as_bytes().get(prefix.len()) {
        None | Some(b'/') => true,
        // `/a/b` also selects instances `/a/b[2]`, but `/a/b[2]` must not
        // select `/a/b[20]`
        Some(b'[') => !prefix.ends_with(']'),
        Some(_) => false,
    }
}

impl std::fmt::Display for DataTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (path, value) in &self.leaves {
            writeln!(f, "{path} = {value}")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DataTree {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let leaves = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { leaves }
    }
}
