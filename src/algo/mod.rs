//! Graph algorithms built on the substrate.
//!
//! [`TopologicalSort`] is the fork/join consumer; [`Wcc`] drives the union-find from a
//! partition-parallel phase.

pub mod topological_sort;
pub mod wcc;

pub use topological_sort::{LongestPathDistances, TopologicalSort, TopologicalSortResult};
pub use wcc::Wcc;
