//! `AtomicPagedArray`: paged 64-bit cells with per-slot atomic operations.
//!
//! Every element operation is a single hardware atomic on one cell, so operations on
//! the same slot are totally ordered. Nothing orders operations on different slots.
//!
//! Ordering:
//! - loads use `Acquire`, stores `Release`
//! - read-modify-write operations use `AcqRel` (`Acquire` on a failed exchange)

use core::fmt;
use core::sync::atomic::{AtomicI64, Ordering};

use crossbeam_utils::Backoff;
use rayon::prelude::*;

use super::{assert_in_bounds, PageLayout, PagedArray};
use crate::error::{check_index, Result};
use crate::mem::{paged_array_bytes, MemoryGauge};

/// A fixed-capacity array of `AtomicI64` cells addressed by `u64` indices.
///
/// [`get_and_add`](Self::get_and_add) and
/// [`compare_and_exchange`](Self::compare_and_exchange) are the only operations meant
/// for cells shared between workers; [`set`](Self::set) belongs to single-writer setup.
pub struct AtomicPagedArray {
    capacity: u64,
    layout: PageLayout,
    pages: Vec<Box<[AtomicI64]>>,
}

impl AtomicPagedArray {
    /// Creates an array of `capacity` zeroed cells.
    pub fn new(capacity: u64) -> Self {
        Self::with_value(capacity, 0)
    }

    /// Creates an array of `capacity` cells set to `value`.
    ///
    /// Pages are allocated in parallel.
    pub fn with_value(capacity: u64, value: i64) -> Self {
        let layout = PageLayout::new(capacity, core::mem::size_of::<AtomicI64>());
        let pages = (0..layout.pages)
            .into_par_iter()
            .map(|page| {
                (0..layout.page_len(capacity, page))
                    .map(|_| AtomicI64::new(value))
                    .collect::<Vec<_>>()
                    .into_boxed_slice()
            })
            .collect();
        Self {
            capacity,
            layout,
            pages,
        }
    }

    /// Reserves the estimated footprint from `gauge`, then allocates.
    pub fn new_in(capacity: u64, gauge: &MemoryGauge) -> Result<Self> {
        gauge.try_reserve(Self::memory_estimation(capacity))?;
        Ok(Self::new(capacity))
    }

    /// Estimated bytes of an array with `capacity` cells.
    pub const fn memory_estimation(capacity: u64) -> u64 {
        paged_array_bytes(capacity, core::mem::size_of::<AtomicI64>())
    }

    /// Number of addressable cells.
    #[inline(always)]
    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of allocated pages.
    #[inline(always)]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[track_caller]
    #[inline(always)]
    fn cell(&self, index: u64) -> &AtomicI64 {
        assert_in_bounds(index, self.capacity);
        let (page, offset) = self.layout.split(index);
        // SAFETY: `index < capacity` and the pages cover `capacity` exactly.
        unsafe { self.pages.get_unchecked(page).get_unchecked(offset) }
    }

    /// Loads cell `index`.
    ///
    /// # Panics
    /// Panics if `index >= capacity()`.
    #[track_caller]
    #[inline]
    pub fn get(&self, index: u64) -> i64 {
        self.cell(index).load(Ordering::Acquire)
    }

    /// Stores `value` into cell `index`.
    ///
    /// # Panics
    /// Panics if `index >= capacity()`.
    #[track_caller]
    #[inline]
    pub fn set(&self, index: u64, value: i64) {
        self.cell(index).store(value, Ordering::Release);
    }

    /// Adds `delta` to cell `index` and returns the previous value.
    ///
    /// # Panics
    /// Panics if `index >= capacity()`.
    #[track_caller]
    #[inline]
    pub fn get_and_add(&self, index: u64, delta: i64) -> i64 {
        self.cell(index).fetch_add(delta, Ordering::AcqRel)
    }

    /// Replaces cell `index` with `new` if it holds `expected`.
    ///
    /// Returns the witness: the value observed in the cell. The exchange happened iff
    /// the witness equals `expected`.
    ///
    /// # Panics
    /// Panics if `index >= capacity()`.
    #[track_caller]
    #[inline]
    pub fn compare_and_exchange(&self, index: u64, expected: i64, new: i64) -> i64 {
        match self
            .cell(index)
            .compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(witness) | Err(witness) => witness,
        }
    }

    /// Raises cell `index` to `candidate` unless it already holds a value `>= candidate`.
    ///
    /// Returns `true` if this call wrote `candidate`. Concurrent callers never lose an
    /// update: the cell ends at the maximum candidate offered.
    #[track_caller]
    pub fn update_max(&self, index: u64, candidate: i64) -> bool {
        let mut current = self.get(index);
        let backoff = Backoff::new();
        while candidate > current {
            let witness = self.compare_and_exchange(index, current, candidate);
            if witness == current {
                return true;
            }
            current = witness;
            backoff.spin();
        }
        false
    }

    /// Like [`get`](Self::get), but reports out-of-range indices as an error.
    pub fn try_get(&self, index: u64) -> Result<i64> {
        check_index(index, self.capacity)?;
        Ok(self.get(index))
    }

    /// Like [`set`](Self::set), but reports out-of-range indices as an error.
    pub fn try_set(&self, index: u64, value: i64) -> Result<()> {
        check_index(index, self.capacity)?;
        self.set(index, value);
        Ok(())
    }

    /// Stores `value` into every cell.
    pub fn fill(&self, value: i64) {
        self.pages.par_iter().for_each(|page| {
            for cell in page.iter() {
                cell.store(value, Ordering::Release);
            }
        });
    }

    /// Stores `generator(index)` into every cell, in index order.
    pub fn set_all(&self, mut generator: impl FnMut(u64) -> i64) {
        for (page_index, page) in self.pages.iter().enumerate() {
            let base = self.layout.page_base(page_index);
            for (offset, cell) in page.iter().enumerate() {
                cell.store(generator(base + offset as u64), Ordering::Release);
            }
        }
    }

    /// Stores `generator(index)` into every cell, pages in parallel.
    ///
    /// Correct only if `generator` is a pure function of the index.
    pub fn par_set_all(&self, generator: impl Fn(u64) -> i64 + Sync) {
        let layout = self.layout;
        self.pages
            .par_iter()
            .enumerate()
            .for_each(|(page_index, page)| {
                let base = layout.page_base(page_index);
                for (offset, cell) in page.iter().enumerate() {
                    cell.store(generator(base + offset as u64), Ordering::Release);
                }
            });
    }

    /// Takes a plain snapshot of the current values.
    pub fn to_paged_array(&self) -> PagedArray<i64> {
        let mut out = PagedArray::new(self.capacity);
        out.par_set_all(|index| self.get(index));
        out
    }

    /// Copies the current values into a `Vec`.
    pub fn copy_to_vec(&self) -> Vec<i64> {
        self.pages
            .iter()
            .flat_map(|page| page.iter().map(|cell| cell.load(Ordering::Acquire)))
            .collect()
    }

    /// Drops every page and returns the estimated number of bytes freed.
    pub fn release(self) -> u64 {
        Self::memory_estimation(self.capacity)
    }
}

impl fmt::Debug for AtomicPagedArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicPagedArray")
            .field("capacity", &self.capacity)
            .field("pages", &self.pages.len())
            .finish()
    }
}
