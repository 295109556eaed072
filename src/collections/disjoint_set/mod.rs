//! Concurrent union-find over node ids.
//!
//! Parent pointers live in an [`AtomicPagedArray`]; `-1` marks a root. Merges always
//! re-point the larger root id at the smaller one (min-id-wins) instead of using
//! union-by-rank, so the representative of a set is always its smallest member and
//! stays stable across runs.
//!
//! `find` compresses paths by pointer halving. `find_no_opt`, which `union` and
//! `set_id_of` use, walks without writing. Repeated `find` calls shorten long chains;
//! merges leave them alone.
//!
//! All operations may run concurrently from many workers. `reset` takes `&mut self`
//! and therefore only runs in single-threaded setup.

mod remapping;

#[cfg(test)]
mod tests;

pub use remapping::{LabelFn, NodeLabels, RemappingDisjointSetStruct};

use crossbeam_utils::Backoff;

use crate::collections::paged::{assert_in_bounds, AtomicPagedArray};
use crate::error::{check_index, Result};
use crate::mem::MemoryRange;

/// Parent value of a set root.
pub(crate) const ROOT: i64 = -1;

/// A union-find structure over the ids `[0, capacity)`.
pub trait DisjointSetStruct: Send + Sync {
    /// Number of elements.
    fn capacity(&self) -> u64;

    /// Root of the set containing `node`, compressing the walked path.
    ///
    /// # Panics
    /// Panics if `node >= capacity()`.
    fn find(&self, node: u64) -> u64;

    /// Root of the set containing `node`, without writing.
    ///
    /// # Panics
    /// Panics if `node >= capacity()`.
    fn find_no_opt(&self, node: u64) -> u64;

    /// Merges the sets of `p` and `q`. `union(p, p)` is a no-op.
    ///
    /// # Panics
    /// Panics if either id is `>= capacity()`.
    fn union(&self, p: u64, q: u64);

    /// Public id of the set containing `node`.
    ///
    /// # Panics
    /// Panics if `node >= capacity()`.
    fn set_id_of(&self, node: u64) -> u64;

    /// Restores the initial partitioning of the id space.
    fn reset(&mut self);

    /// Returns `true` if `p` and `q` are currently in the same set.
    fn same_set(&self, p: u64, q: u64) -> bool {
        self.find(p) == self.find(q)
    }

    /// Like [`union`](Self::union), but reports out-of-range ids as an error.
    fn try_union(&self, p: u64, q: u64) -> Result<()> {
        check_index(p, self.capacity())?;
        check_index(q, self.capacity())?;
        self.union(p, q);
        Ok(())
    }

    /// Like [`set_id_of`](Self::set_id_of), but reports out-of-range ids as an error.
    fn try_set_id_of(&self, node: u64) -> Result<u64> {
        check_index(node, self.capacity())?;
        Ok(self.set_id_of(node))
    }

    /// Number of distinct sets.
    fn set_count(&self) -> u64 {
        (0..self.capacity())
            .filter(|&node| self.find_no_opt(node) == node)
            .count() as u64
    }
}

/// Parent array shared by the union-find implementations.
pub(crate) struct ParentArray {
    cells: AtomicPagedArray,
}

impl ParentArray {
    pub(crate) fn new(capacity: u64) -> Self {
        Self {
            cells: AtomicPagedArray::with_value(capacity, ROOT),
        }
    }

    pub(crate) fn memory_estimation(capacity: u64) -> u64 {
        AtomicPagedArray::memory_estimation(capacity)
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> u64 {
        self.cells.capacity()
    }

    #[inline(always)]
    pub(crate) fn cells(&self) -> &AtomicPagedArray {
        &self.cells
    }

    #[track_caller]
    pub(crate) fn find_no_opt(&self, node: u64) -> u64 {
        assert_in_bounds(node, self.capacity());
        let mut current = node;
        loop {
            let parent = self.cells.get(current);
            if parent == ROOT {
                return current;
            }
            current = parent as u64;
        }
    }

    /// Path halving: every visited node is re-pointed at its grandparent.
    ///
    /// The exchange only succeeds if the node still points at the parent that was read,
    /// and a grandparent is always an ancestor, so concurrent merges are never undone.
    #[track_caller]
    pub(crate) fn find(&self, node: u64) -> u64 {
        assert_in_bounds(node, self.capacity());
        let mut current = node;
        loop {
            let parent = self.cells.get(current);
            if parent == ROOT {
                return current;
            }
            let grandparent = self.cells.get(parent as u64);
            if grandparent == ROOT {
                return parent as u64;
            }
            self.cells.compare_and_exchange(current, parent, grandparent);
            current = grandparent as u64;
        }
    }

    /// Min-id-wins merge.
    ///
    /// The larger root is re-pointed only while it is still a root; losing that race
    /// means another worker merged it first, so both roots are resolved again.
    #[track_caller]
    pub(crate) fn union(&self, p: u64, q: u64) {
        assert_in_bounds(p, self.capacity());
        assert_in_bounds(q, self.capacity());
        let backoff = Backoff::new();
        loop {
            let p_root = self.find_no_opt(p);
            let q_root = self.find_no_opt(q);
            if p_root == q_root {
                return;
            }
            let (low, high) = if p_root < q_root {
                (p_root, q_root)
            } else {
                (q_root, p_root)
            };
            if self.cells.compare_and_exchange(high, ROOT, low as i64) == ROOT {
                return;
            }
            backoff.spin();
        }
    }

    pub(crate) fn reset(&self) {
        self.cells.fill(ROOT);
    }
}

/// Union-find whose set ids are the root node ids.
pub struct PagedDisjointSetStruct {
    parents: ParentArray,
}

impl PagedDisjointSetStruct {
    /// Creates a structure of `capacity` singleton sets.
    pub fn new(capacity: u64) -> Self {
        Self {
            parents: ParentArray::new(capacity),
        }
    }

    /// Estimated bytes for `capacity` elements.
    pub fn memory_estimation(capacity: u64) -> MemoryRange {
        MemoryRange::of(ParentArray::memory_estimation(capacity))
    }

    /// Raw parent cells, `-1` for roots.
    pub fn parent(&self) -> &AtomicPagedArray {
        self.parents.cells()
    }
}

impl DisjointSetStruct for PagedDisjointSetStruct {
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
        self.parents.find_no_opt(node)
    }

    fn reset(&mut self) {
        self.parents.reset();
    }
}
