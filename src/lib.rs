//! # `pagegraph` - Parallel Graph Analytics Substrate
//!
//! Shared building blocks for graph algorithms that process graphs with up to billions
//! of nodes inside one process: paged containers, partitioning of the node id space,
//! a scheduler for flat and fork/join parallel phases, and a concurrent union-find.
//!
//! ## Guarantees
//!
//! ### Containers
//! - **Fixed capacity**: paged arrays are sized before a parallel phase starts and never
//!   grow. Indices at or beyond the capacity panic, or return
//!   [`Error::IndexOutOfBounds`] through the `try_` accessors.
//! - **Bounded pages**: no page exceeds [`mem::PAGE_SIZE_IN_BYTES`], so a capacity of
//!   several billion elements never needs one huge allocation.
//! - **Atomic cells**: [`AtomicPagedArray`] offers `get_and_add`,
//!   `compare_and_exchange` and `update_max` with acquire/release semantics.
//!
//! ### Parallel phases
//! - **Full cover**: every partitioning policy returns consecutive, non-overlapping
//!   partitions covering `[0, node_count)`.
//! - **Cooperative cancellation**: a [`TerminationFlag`] is polled at partition and task
//!   boundaries; a cancelled phase fails with [`Error::Terminated`].
//! - **Drained fork/join**: [`Scheduler::fork_join`] returns only after every forked
//!   descendant of every seed has completed.
//!
//! ### Union-find
//! - **No lost merges**: concurrent unions re-point the larger root at the smaller one
//!   with a compare-and-exchange and retry until one succeeds.
//! - **Seeding**: [`RemappingDisjointSetStruct`] starts from externally supplied set
//!   labels and reports them back as set ids.
//!
//! ## Architecture
//!
//! 1. **Memory** (`mem`): page geometry, byte estimates and a [`MemoryGauge`].
//! 2. **Collections** (`collections`): [`PagedArray`], [`AtomicPagedArray`],
//!    [`AtomicBitSet`] and the union-find structures.
//! 3. **Partitioning** (`partition`): range and degree-balanced [`Partition`]s.
//! 4. **Concurrency** (`concurrency`): [`Scheduler`], progress and termination.
//! 5. **Algorithms** (`algo`): [`TopologicalSort`] and [`Wcc`] on any [`Graph`].
//!
//! ## Example
//!
//! ```rust
//! use pagegraph::{
//!     CsrGraph, EmptyProgressTracker, Scheduler, TerminationFlag, TopologicalSort,
//!     TopologicalSortConfig,
//! };
//!
//! // 0 -> 1 -> 2
//! let graph = CsrGraph::from_edges(3, &[(0, 1), (1, 2)]);
//! let scheduler = Scheduler::new(2)?;
//! let mut config = TopologicalSortConfig::default();
//! config.parallel.concurrency = 2;
//! config.compute_longest_path_distances = true;
//!
//! let result = TopologicalSort::new(&graph, config, &EmptyProgressTracker, TerminationFlag::running())
//!     .compute(&scheduler)?;
//! assert_eq!(result.sorted_nodes().collect::<Vec<_>>(), vec![0, 1, 2]);
//! assert_eq!(result.longest_path_distance(2), Some(2));
//! # Ok::<(), pagegraph::Error>(())
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]

pub mod algo;
pub mod collections;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod graph;
pub mod mem;
pub mod partition;

pub use algo::{LongestPathDistances, TopologicalSort, TopologicalSortResult, Wcc};
pub use collections::{
    AtomicBitSet, AtomicPagedArray, DisjointSetStruct, LabelFn, NodeLabels, PagedArray,
    PagedDisjointSetStruct, RemappingDisjointSetStruct,
};
pub use concurrency::{
    EmptyProgressTracker, ForkContext, ForkJoinStats, LoggingProgressTracker, ProgressTracker,
    Scheduler, TerminationFlag,
};
pub use config::{ParallelConfig, PartitionPolicy, TopologicalSortConfig, WccConfig};
pub use error::{Error, Result};
pub use graph::{CsrGraph, Graph};
pub use mem::{MemoryGauge, MemoryRange};
pub use partition::{Partition, MAX_NODE_COUNT};

// Compile-time checks of layout and page geometry.
const _: () = {
    use core::mem::size_of;

    // Partitions are two words and cheap to copy into tasks.
    assert!(size_of::<Partition>() == 2 * size_of::<u64>());

    // A page of any supported element fits the page budget.
    assert!((1usize << mem::page_shift_for(size_of::<u8>())) * size_of::<u8>() <= mem::PAGE_SIZE_IN_BYTES);
    assert!((1usize << mem::page_shift_for(size_of::<u64>())) * size_of::<u64>() <= mem::PAGE_SIZE_IN_BYTES);
    assert!(
        (1usize << mem::page_shift_for(size_of::<core::sync::atomic::AtomicI64>())) * 8
            <= mem::PAGE_SIZE_IN_BYTES
    );

    // The partition ceiling leaves headroom below `i32::MAX`.
    assert!(MAX_NODE_COUNT == 1_073_741_807);
};
