//! Page-backed arrays addressed by 64-bit indices.
//!
//! ## Layout
//!
//! Elements live in a `Vec` of boxed pages. Every page except the last holds exactly
//! `1 << shift` elements, where the shift is derived from the element width so that a
//! page stays within [`PAGE_SIZE_IN_BYTES`](crate::mem::PAGE_SIZE_IN_BYTES). The last
//! page holds the remainder, so the pages cover the capacity exactly.
//!
//! Index decomposition is a shift and a mask:
//!
//! ```text
//! page   = index >> shift
//! offset = index & ((1 << shift) - 1)
//! ```
//!
//! ## Capacity
//!
//! Capacity is fixed at construction. Out-of-range indices panic in the plain accessors
//! and return [`Error::IndexOutOfBounds`](crate::Error::IndexOutOfBounds) in the `try_`
//! accessors. Nothing is ever clamped or wrapped.

mod atomic_paged_array;
mod paged_array;


pub use atomic_paged_array::AtomicPagedArray;
pub use paged_array::PagedArray;

use crate::mem::{page_count_for, page_shift_for};

/// Shift/mask pair of a page layout plus the page count for a capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageLayout {
    pub(crate) shift: u32,
    pub(crate) mask: u64,
    pub(crate) pages: usize,
}

impl PageLayout {
    pub(crate) const fn new(capacity: u64, element_width: usize) -> Self {
        let shift = page_shift_for(element_width);
        Self {
            shift,
            mask: (1u64 << shift) - 1,
            pages: page_count_for(capacity, element_width) as usize,
        }
    }

    #[inline(always)]
    pub(crate) const fn page_size(&self) -> u64 {
        1u64 << self.shift
    }

    /// Length of page `page` for an array of `capacity` elements.
    #[inline]
    pub(crate) fn page_len(&self, capacity: u64, page: usize) -> usize {
        let start = (page as u64) << self.shift;
        (capacity - start).min(self.page_size()) as usize
    }

    /// First global index stored in `page`.
    #[inline(always)]
    pub(crate) const fn page_base(&self, page: usize) -> u64 {
        (page as u64) << self.shift
    }

    #[inline(always)]
    pub(crate) const fn split(&self, index: u64) -> (usize, usize) {
        ((index >> self.shift) as usize, (index & self.mask) as usize)
    }
}

#[track_caller]
#[inline(always)]
pub(crate) fn assert_in_bounds(index: u64, capacity: u64) {
    assert!(
        index < capacity,
        "index {index} is out of bounds for capacity {capacity}"
    );
}
