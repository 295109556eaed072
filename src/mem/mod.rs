//! Memory estimation and reservation.
//!
//! Every paged structure exposes a pure estimation function so callers can check the
//! footprint of a run before allocating anything. [`MemoryGauge`] turns an estimate into a
//! reservation against a shared budget and refuses it when headroom is insufficient.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::Backoff;
use serde::Serialize;

use crate::error::{Error, Result};

/// Upper bound for the byte size of a single page.
pub const PAGE_SIZE_IN_BYTES: usize = 1 << 15;

/// Fixed bookkeeping of a paged array (capacity, shift, page vector header).
const PAGED_ARRAY_HEADER_BYTES: u64 = 48;

/// Per-page bookkeeping: one boxed-slice fat pointer.
const PAGE_POINTER_BYTES: u64 = core::mem::size_of::<Box<[u8]>>() as u64;

/// An inclusive byte range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MemoryRange {
    min: u64,
    max: u64,
}

impl MemoryRange {
    /// The empty range.
    pub const EMPTY: Self = Self { min: 0, max: 0 };

    /// A range with a single exact value.
    pub const fn of(bytes: u64) -> Self {
        Self {
            min: bytes,
            max: bytes,
        }
    }

    /// A range between `min` and `max`.
    ///
    /// # Panics
    /// Panics if `min > max`.
    pub fn between(min: u64, max: u64) -> Self {
        assert!(min <= max, "min {min} must not exceed max {max}");
        Self { min, max }
    }

    /// Lower bound in bytes.
    #[inline]
    pub const fn min(&self) -> u64 {
        self.min
    }

    /// Upper bound in bytes.
    #[inline]
    pub const fn max(&self) -> u64 {
        self.max
    }

    /// Component-wise sum.
    pub const fn add(self, other: Self) -> Self {
        Self {
            min: self.min.saturating_add(other.min),
            max: self.max.saturating_add(other.max),
        }
    }

    /// Scales both bounds by `factor`.
    pub const fn times(self, factor: u64) -> Self {
        Self {
            min: self.min.saturating_mul(factor),
            max: self.max.saturating_mul(factor),
        }
    }
}

impl fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{} bytes", self.min)
        } else {
            write!(f, "[{} bytes ... {} bytes]", self.min, self.max)
        }
    }
}

/// Page shift for elements of `element_width` bytes.
///
/// The page holds the largest power-of-two number of elements that fits into
/// [`PAGE_SIZE_IN_BYTES`], and at least one element.
pub const fn page_shift_for(element_width: usize) -> u32 {
    let width = if element_width == 0 { 1 } else { element_width };
    let elements = PAGE_SIZE_IN_BYTES / width;
    if elements <= 1 {
        0
    } else {
        elements.ilog2()
    }
}

/// Number of pages needed to hold `capacity` elements of `element_width` bytes.
pub const fn page_count_for(capacity: u64, element_width: usize) -> u64 {
    let page_size = 1u64 << page_shift_for(element_width);
    capacity.div_ceil(page_size)
}

/// Estimated bytes of a paged array with `capacity` elements of `element_width` bytes.
///
/// Pure function of its inputs: nothing is allocated.
pub const fn paged_array_bytes(capacity: u64, element_width: usize) -> u64 {
    let pages = page_count_for(capacity, element_width);
    PAGED_ARRAY_HEADER_BYTES
        .saturating_add(pages.saturating_mul(PAGE_POINTER_BYTES))
        .saturating_add(capacity.saturating_mul(element_width as u64))
}

/// Estimated bytes of a `HashMap` holding `entries` entries of `entry_width` bytes.
pub fn hash_map_bytes(entries: u64, entry_width: usize) -> u64 {
    if entries == 0 {
        return 0;
    }
    // hashbrown keeps the load factor at 7/8 and a power-of-two bucket count.
    let buckets = if entries < 4 {
        4
    } else if entries < 8 {
        8
    } else {
        (entries.saturating_mul(8) / 7).next_power_of_two()
    };
    // One control byte per bucket plus a trailing group.
    buckets
        .saturating_mul(entry_width as u64 + 1)
        .saturating_add(16)
}

/// A shared budget of available bytes.
///
/// Reservations are checked against the current headroom and refused without side
/// effects when they do not fit.
#[derive(Debug)]
pub struct MemoryGauge {
    available: AtomicU64,
}

impl MemoryGauge {
    /// Creates a gauge with `available` bytes of headroom.
    pub const fn new(available: u64) -> Self {
        Self {
            available: AtomicU64::new(available),
        }
    }

    /// Currently available bytes.
    pub fn available(&self) -> u64 {
        self.available.load(Ordering::Acquire)
    }

    /// Reserves `bytes`, returning the remaining headroom.
    ///
    /// Fails with [`Error::MemoryReservationExceeded`] if `bytes` exceeds the headroom
    /// observed at the time of the attempt.
    pub fn try_reserve(&self, bytes: u64) -> Result<u64> {
        let backoff = Backoff::new();
        let mut current = self.available.load(Ordering::Acquire);
        loop {
            if bytes > current {
                return Err(Error::MemoryReservationExceeded {
                    requested: bytes,
                    available: current,
                });
            }
            let remaining = current - bytes;
            match self.available.compare_exchange_weak(
                current,
                remaining,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(remaining),
                Err(witness) => {
                    current = witness;
                    backoff.spin();
                }
            }
        }
    }

    /// Returns `bytes` to the budget.
    pub fn release(&self, bytes: u64) {
        self.available.fetch_add(bytes, Ordering::AcqRel);
    }
}
