//! Containers sized for graphs beyond single-array limits.
//!
//! - `paged`: [`PagedArray`] and its atomic counterpart [`AtomicPagedArray`]
//! - `disjoint_set`: concurrent union-find on top of an atomic paged array
//! - `atomic_bitset`: word-packed membership flags

pub mod atomic_bitset;
pub mod disjoint_set;
pub mod paged;

pub use atomic_bitset::AtomicBitSet;
pub use disjoint_set::{
    DisjointSetStruct, LabelFn, NodeLabels, PagedDisjointSetStruct, RemappingDisjointSetStruct,
};
pub use paged::{AtomicPagedArray, PagedArray};
