//! Union-find seeded from externally supplied set labels.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use super::{DisjointSetStruct, ParentArray, ROOT};
use crate::collections::paged::{AtomicPagedArray, PagedArray};
use crate::mem::{hash_map_bytes, MemoryRange};

/// A mapping from node id to an externally provided set label.
pub trait NodeLabels {
    /// Label of `node`, or `None` if the node carries none.
    fn label_of(&self, node: u64) -> Option<u64>;
}

impl<S: BuildHasher> NodeLabels for HashMap<u64, u64, S> {
    fn label_of(&self, node: u64) -> Option<u64> {
        self.get(&node).copied()
    }
}

impl NodeLabels for BTreeMap<u64, u64> {
    fn label_of(&self, node: u64) -> Option<u64> {
        self.get(&node).copied()
    }
}

impl NodeLabels for [Option<u64>] {
    fn label_of(&self, node: u64) -> Option<u64> {
        usize::try_from(node)
            .ok()
            .and_then(|index| self.get(index))
            .copied()
            .flatten()
    }
}

impl NodeLabels for Vec<Option<u64>> {
    fn label_of(&self, node: u64) -> Option<u64> {
        self.as_slice().label_of(node)
    }
}

impl NodeLabels for PagedArray<Option<u64>> {
    fn label_of(&self, node: u64) -> Option<u64> {
        self.try_get(node).ok().copied().flatten()
    }
}

impl<L: NodeLabels + ?Sized> NodeLabels for &L {
    fn label_of(&self, node: u64) -> Option<u64> {
        (**self).label_of(node)
    }
}

/// Adapts a closure into [`NodeLabels`].
pub struct LabelFn<F>(pub F);

impl<F: Fn(u64) -> Option<u64>> NodeLabels for LabelFn<F> {
    fn label_of(&self, node: u64) -> Option<u64> {
        (self.0)(node)
    }
}

/// Union-find whose initial sets come from a label mapping.
///
/// Nodes sharing a label start in one set rooted at the first (smallest) such node,
/// and that root carries the label as its public set id. Unlabeled nodes start as
/// singletons and report their own id. Merges follow the min-id-wins rule, so a merged
/// set reports the label of whichever root has the smaller node id.
pub struct RemappingDisjointSetStruct<L> {
    parents: ParentArray,
    internal_to_provided: HashMap<u64, u64>,
    labels: L,
}

impl<L: NodeLabels> RemappingDisjointSetStruct<L> {
    /// Creates a structure over `[0, capacity)` seeded from `labels`.
    pub fn new(capacity: u64, labels: L) -> Self {
        let mut dss = Self {
            parents: ParentArray::new(capacity),
            internal_to_provided: HashMap::new(),
            labels,
        };
        dss.seed();
        dss
    }

    /// Estimated bytes for `capacity` elements: the hash map ranges from empty to
    /// one entry per node.
    pub fn memory_estimation(capacity: u64) -> MemoryRange {
        let parent = ParentArray::memory_estimation(capacity);
        let labels = hash_map_bytes(capacity, core::mem::size_of::<(u64, u64)>());
        MemoryRange::between(parent, parent.saturating_add(labels))
    }

    /// Raw parent cells, `-1` for roots.
    pub fn parent(&self) -> &AtomicPagedArray {
        self.parents.cells()
    }

    /// Label mapping this structure was seeded from.
    pub fn labels(&self) -> &L {
        &self.labels
    }

    fn seed(&mut self) {
        let mut label_roots: HashMap<u64, u64> = HashMap::new();
        let labels = &self.labels;
        let provided = &mut self.internal_to_provided;
        provided.clear();
        self.parents
            .cells()
            .set_all(|node| match labels.label_of(node) {
                None => ROOT,
                Some(label) => match label_roots.entry(label) {
                    Entry::Occupied(root) => *root.get() as i64,
                    Entry::Vacant(slot) => {
                        slot.insert(node);
                        provided.insert(node, label);
                        ROOT
                    }
                },
            });
    }
}

impl<L: NodeLabels + Send + Sync> DisjointSetStruct for RemappingDisjointSetStruct<L> {
    fn capacity(&self) -> u64 {
        self.parents.capacity()
    }

    fn find(&self, node: u64) -> u64 {
        self.parents.find(node)
    }

    fn find_no_opt(&self, node: u64) -> u64 {
        self.parents.find_no_opt(node)
    }

    fn union(&self, p: u64, q: u64) {
        self.parents.union(p, q);
    }

    fn set_id_of(&self, node: u64) -> u64 {
        let root = self.parents.find_no_opt(node);
        self.internal_to_provided
            .get(&root)
            .copied()
            .unwrap_or(root)
    }

    fn reset(&mut self) {
        self.seed();
    }
}
