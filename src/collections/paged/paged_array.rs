//! `PagedArray`: a fixed-capacity array of pages.

use core::fmt;
use core::ops::{Index, IndexMut};

use rayon::prelude::*;

use super::{assert_in_bounds, PageLayout};
use crate::error::{check_index, Result};
use crate::mem::{paged_array_bytes, MemoryGauge};

/// A fixed-capacity sequence of `T` addressed by `u64` indices.
///
/// ### Performance Characteristics
/// | Operation | Complexity | Notes |
/// |-----------|------------|-------|
/// | `get` / `set` | \(O(1)\) | shift + mask, one bounds check |
/// | `fill` / `set_all` | \(O(n)\) | page-wise, sequential |
/// | `par_set_all` | \(O(n / p)\) | one rayon job per page |
///
/// The array owns its pages exclusively; [`release`](Self::release) consumes it.
pub struct PagedArray<T> {
    capacity: u64,
    layout: PageLayout,
    pages: Vec<Box<[T]>>,
}

impl<T: Clone> PagedArray<T> {
    /// Creates an array of `capacity` elements, all set to `value`.
    pub fn with_value(capacity: u64, value: T) -> Self {
        let layout = PageLayout::new(capacity, core::mem::size_of::<T>());
        let pages = (0..layout.pages)
            .map(|page| vec![value.clone(); layout.page_len(capacity, page)].into_boxed_slice())
            .collect();
        Self {
            capacity,
            layout,
            pages,
        }
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: T) {
        for page in &mut self.pages {
            page.fill(value.clone());
        }
    }

    /// Copies the elements into a `Vec`.
    ///
    /// Only meaningful for arrays that fit into a single allocation.
    pub fn copy_to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.capacity as usize);
        for page in &self.pages {
            out.extend_from_slice(page);
        }
        out
    }
}

impl<T: Clone + Default> PagedArray<T> {
    /// Creates an array of `capacity` default elements.
    pub fn new(capacity: u64) -> Self {
        Self::with_value(capacity, T::default())
    }

    /// Reserves the estimated footprint from `gauge`, then allocates.
    ///
    /// Fails before any page is allocated if the gauge refuses the reservation.
    pub fn new_in(capacity: u64, gauge: &MemoryGauge) -> Result<Self> {
        gauge.try_reserve(Self::memory_estimation(capacity))?;
        Ok(Self::new(capacity))
    }
}

impl<T> PagedArray<T> {
    /// Estimated bytes of an array with `capacity` elements of `T`.
    pub const fn memory_estimation(capacity: u64) -> u64 {
        paged_array_bytes(capacity, core::mem::size_of::<T>())
    }

    /// Number of addressable elements.
    #[inline(always)]
    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of allocated pages.
    #[inline(always)]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Elements per full page.
    #[inline(always)]
    pub const fn page_size(&self) -> u64 {
        self.layout.page_size()
    }

    /// Returns a reference to element `index`.
    ///
    /// # Panics
    /// Panics if `index >= capacity()`.
    #[track_caller]
    #[inline]
    pub fn get(&self, index: u64) -> &T {
        assert_in_bounds(index, self.capacity);
        let (page, offset) = self.layout.split(index);
        // SAFETY: `index < capacity` and the pages cover `capacity` exactly, so `page`
        // names an allocated page and `offset` is within its length.
        unsafe { self.pages.get_unchecked(page).get_unchecked(offset) }
    }

    /// Returns a mutable reference to element `index`.
    ///
    /// # Panics
    /// Panics if `index >= capacity()`.
    #[track_caller]
    #[inline]
    pub fn get_mut(&mut self, index: u64) -> &mut T {
        assert_in_bounds(index, self.capacity);
        let (page, offset) = self.layout.split(index);
        // SAFETY: see `get`.
        unsafe {
            self.pages
                .get_unchecked_mut(page)
                .get_unchecked_mut(offset)
        }
    }

    /// Stores `value` at `index`.
    ///
    /// # Panics
    /// Panics if `index >= capacity()`.
    #[track_caller]
    #[inline]
    pub fn set(&mut self, index: u64, value: T) {
        *self.get_mut(index) = value;
    }

    /// Like [`get`](Self::get), but reports out-of-range indices as an error.
    pub fn try_get(&self, index: u64) -> Result<&T> {
        check_index(index, self.capacity)?;
        Ok(self.get(index))
    }

    /// Like [`set`](Self::set), but reports out-of-range indices as an error.
    pub fn try_set(&mut self, index: u64, value: T) -> Result<()> {
        check_index(index, self.capacity)?;
        self.set(index, value);
        Ok(())
    }

    /// Sets every element to `generator(index)`, in index order.
    ///
    /// The generator may carry state across calls.
    pub fn set_all(&mut self, mut generator: impl FnMut(u64) -> T) {
        let layout = self.layout;
        for (page_index, page) in self.pages.iter_mut().enumerate() {
            let base = layout.page_base(page_index);
            for (offset, slot) in page.iter_mut().enumerate() {
                *slot = generator(base + offset as u64);
            }
        }
    }

    /// Sets every element to `generator(index)`, pages in parallel.
    ///
    /// Correct only if `generator` is a pure function of the index.
    pub fn par_set_all<F>(&mut self, generator: F)
    where
        T: Send,
        F: Fn(u64) -> T + Sync,
    {
        let layout = self.layout;
        self.pages
            .par_iter_mut()
            .enumerate()
            .for_each(|(page_index, page)| {
                let base = layout.page_base(page_index);
                for (offset, slot) in page.iter_mut().enumerate() {
                    *slot = generator(base + offset as u64);
                }
            });
    }

    /// Iterates the elements in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.pages.iter().flat_map(|page| page.iter())
    }

    /// Drops every page and returns the estimated number of bytes freed.
    pub fn release(self) -> u64 {
        Self::memory_estimation(self.capacity)
    }
}

impl<T> Index<u64> for PagedArray<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: u64) -> &T {
        self.get(index)
    }
}

impl<T> IndexMut<u64> for PagedArray<T> {
    #[track_caller]
    fn index_mut(&mut self, index: u64) -> &mut T {
        self.get_mut(index)
    }
}

impl<T> fmt::Debug for PagedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedArray")
            .field("capacity", &self.capacity)
            .field("pages", &self.pages.len())
            .field("page_size", &self.layout.page_size())
            .finish()
    }
}
