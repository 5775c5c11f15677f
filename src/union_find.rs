//! Disjoint-set forest used to merge clusters that sit within a zoom
//! level's merge distance of each other.

use std::collections::HashMap;
use std::hash::Hash;

/// Union-Find over arbitrary hashable keys.
///
/// Roots are chosen by key order (the smaller key wins), so the grouping
/// does not depend on the order in which unions are applied.
#[derive(Debug, Clone, Default)]
pub struct UnionFind<T> {
    parent: HashMap<T, T>,
}

impl<T> UnionFind<T>
where
    T: Clone + Eq + Hash + Ord,
{
    pub fn new() -> Self {
        Self {
            parent: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parent: HashMap::with_capacity(capacity),
        }
    }

    /// Add `item` as its own singleton set. Existing items are left alone.
    pub fn make_set(&mut self, item: T) {
        self.parent.entry(item.clone()).or_insert(item);
    }

    /// Root of the set holding `item`, compressing the path on the way.
    /// Unknown items are their own root.
    pub fn find(&mut self, item: &T) -> T {
        let mut root = item.clone();
        while let Some(parent) = self.parent.get(&root) {
            if *parent == root {
                break;
            }
            root = parent.clone();
        }

        let mut current = item.clone();
        while current != root {
            match self.parent.insert(current, root.clone()) {
                Some(next) => current = next,
                None => break,
            }
        }
        root
    }

    pub fn union(&mut self, a: &T, b: &T) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        let (root, child) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent.insert(child, root);
    }

    pub fn connected(&mut self, a: &T, b: &T) -> bool {
        self.find(a) == self.find(b)
    }

    /// Sets keyed by root, members sorted.
    pub fn groups(&mut self) -> HashMap<T, Vec<T>> {
        let items: Vec<T> = self.parent.keys().cloned().collect();
        let mut groups: HashMap<T, Vec<T>> = HashMap::new();
        for item in items {
            let root = self.find(&item);
            groups.entry(root).or_default().push(item);
        }
        for members in groups.values_mut() {
            members.sort();
        }
        groups
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}
