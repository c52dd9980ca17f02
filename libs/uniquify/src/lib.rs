//! A library for assigning unique names.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

/// A set of unique names.
///
/// Each key of type `K` is assigned a unique name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Names<K: Hash + Eq> {
    names: HashSet<ArcStr>,
    assignments: HashMap<K, ArcStr>,
    /// Next free index per base name, for [`Names::assign_indexed`].
    counters: HashMap<ArcStr, u64>,
}

impl<K: Hash + Eq> Default for Names<K> {
    fn default() -> Self {
        Self {
            names: HashSet::new(),
            assignments: HashMap::new(),
            counters: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq> Names<K> {
    /// Creates a new, empty name set.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the name associated with this key, if it exists.
    pub fn name(&self, id: &K) -> Option<ArcStr> {
        self.assignments.get(id).cloned()
    }

    /// Returns `true` if `name` has already been handed out.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// The number of assigned names.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Returns `true` if no names have been assigned.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Allocates a new, unique name associated with the given ID.
    ///
    /// The name will be based on the given `base_name`.
    /// If `base_name` is free it is used as-is; otherwise a numeric suffix is appended.
    ///
    /// ```
    /// # use uniquify::Names;
    /// let mut names = Names::new();
    /// assert_eq!(names.assign_name(0, "inv"), "inv");
    /// assert_eq!(names.assign_name(1, "inv"), "inv_1");
    /// ```
    pub fn assign_name(&mut self, id: K, base_name: &str) -> ArcStr {
        let name = if self.names.contains(base_name) {
            let mut i = 1;
            loop {
                let new_name = arcstr::format!("{}_{}", base_name, i);
                if !self.names.contains(&new_name) {
                    break new_name;
                }
                i += 1;
            }
        } else {
            base_name.into()
        };
        self.insert(id, name)
    }

    /// Allocates a name of the form `base@N` with the smallest unused index `N`.
    ///
    /// Every name produced this way carries an index, so generated objects
    /// never collide with a user-supplied bare name.
    ///
    /// ```
    /// # use uniquify::Names;
    /// let mut names = Names::new();
    /// assert_eq!(names.assign_indexed(0, "metal-1-pin"), "metal-1-pin@0");
    /// assert_eq!(names.assign_indexed(1, "metal-1-pin"), "metal-1-pin@1");
    /// assert_eq!(names.assign_indexed(2, "via1"), "via1@0");
    /// ```
    pub fn assign_indexed(&mut self, id: K, base_name: &str) -> ArcStr {
        let counter = self.counters.entry(ArcStr::from(base_name)).or_insert(0);
        let name = loop {
            let candidate = arcstr::format!("{}@{}", base_name, *counter);
            *counter += 1;
            if !self.names.contains(&candidate) {
                break candidate;
            }
        };
        self.insert(id, name)
    }

    fn insert(&mut self, id: K, name: ArcStr) -> ArcStr {
        self.names.insert(name.clone());
        self.assignments.insert(id, name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_names_skip_taken_names() {
        let mut names = Names::new();
        names.assign_name(0, "pin@0");
        assert_eq!(names.assign_indexed(1, "pin"), "pin@1");
        assert_eq!(names.name(&1).as_deref(), Some("pin@1"));
        assert!(names.contains("pin@0"));
        assert_eq!(names.len(), 2);
    }
}
