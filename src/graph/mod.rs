//! The graph capability consumed by the substrate.
//!
//! The substrate never owns topology; it reads it through [`Graph`]. Every task that
//! walks relationships gets its own [`Graph::concurrent_copy`], handed over when the
//! task is constructed, so no two tasks share iteration state.

pub mod csr_graph;

pub use csr_graph::CsrGraph;

/// Read access to a directed graph over node ids `[0, node_count)`.
pub trait Graph: Send + Sync {
    /// Number of nodes.
    fn node_count(&self) -> u64;

    /// Number of relationships.
    fn relationship_count(&self) -> u64;

    /// Out-degree of `node`.
    fn degree(&self, node: u64) -> u64;

    /// Calls `visitor(node, target)` for every outgoing relationship of `node` until the
    /// visitor returns `false`.
    fn for_each_relationship<F>(&self, node: u64, visitor: F)
    where
        F: FnMut(u64, u64) -> bool;

    /// A copy that is safe to hand to another task. Must be cheap.
    fn concurrent_copy(&self) -> Self
    where
        Self: Sized;

    /// Id of `node` in the host database.
    fn to_original_node_id(&self, node: u64) -> u64;
}
