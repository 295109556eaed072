//! Splitting the node id space into units of parallel work.
//!
//! Both policies return a full, non-overlapping, order-preserving cover of
//! `[0, node_count)` and return no partitions for an empty graph:
//!
//! - **range**: equally sized spans, the last one taking the remainder;
//! - **degree**: spans closed once their accumulated degree reaches
//!   `ceil(total_degree / concurrency)`, so skewed graphs still spread their
//!   relationships evenly.

use core::fmt;
use core::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::Graph;

/// Ceiling on the node count of one partition.
pub const MAX_NODE_COUNT: u64 = (i32::MAX as u64 - 32) >> 1;

/// A contiguous span of node ids processed as one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PartitionDocument")]
pub struct Partition {
    start_node: u64,
    node_count: u64,
}

impl Partition {
    /// Creates a partition.
    ///
    /// Fails with [`Error::InvalidPartition`] if `node_count` is zero or exceeds
    /// [`MAX_NODE_COUNT`].
    pub fn new(start_node: u64, node_count: u64) -> Result<Self> {
        if node_count == 0 || node_count > MAX_NODE_COUNT || start_node.checked_add(node_count).is_none() {
            return Err(Error::InvalidPartition {
                start_node,
                node_count,
            });
        }
        Ok(Self {
            start_node,
            node_count,
        })
    }

    /// Invariants are upheld by the partitioning functions of this module.
    const fn new_unchecked(start_node: u64, node_count: u64) -> Self {
        Self {
            start_node,
            node_count,
        }
    }

    /// First node id.
    #[inline(always)]
    pub const fn start_node(&self) -> u64 {
        self.start_node
    }

    /// Number of node ids.
    #[inline(always)]
    pub const fn node_count(&self) -> u64 {
        self.node_count
    }

    /// One past the last node id.
    #[inline(always)]
    pub const fn end_node(&self) -> u64 {
        self.start_node + self.node_count
    }

    /// The node ids of this partition.
    #[inline]
    pub const fn nodes(&self) -> Range<u64> {
        self.start_node..self.end_node()
    }

    /// Whether this partition can join `other_partitions_count` others in one task set.
    pub const fn fits(&self, other_partitions_count: u64) -> bool {
        match MAX_NODE_COUNT.checked_sub(other_partitions_count) {
            Some(room) => room >= self.node_count,
            None => false,
        }
    }
}

/// Unchecked JSON shape of a [`Partition`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartitionDocument {
    start_node: u64,
    node_count: u64,
}

impl TryFrom<PartitionDocument> for Partition {
    type Error = Error;

    fn try_from(document: PartitionDocument) -> Result<Self> {
        Self::new(document.start_node, document.node_count)
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Partition{{startNode={}, nodeCount={}}}",
            self.start_node, self.node_count
        )
    }
}

/// Batch size that yields about `concurrency` batches, never below `min_batch_size`.
///
/// # Panics
/// Panics if `concurrency == 0`.
pub fn adjusted_batch_size(node_count: u64, concurrency: usize, min_batch_size: u64) -> u64 {
    assert!(concurrency != 0, "concurrency must be > 0");
    node_count
        .div_ceil(concurrency as u64)
        .max(min_batch_size)
        .clamp(1, MAX_NODE_COUNT)
}

/// Consecutive partitions of `batch_size` nodes; the last takes the remainder.
///
/// # Panics
/// Panics if `batch_size == 0` or `batch_size > MAX_NODE_COUNT`.
pub fn range_partition_with_batch_size(node_count: u64, batch_size: u64) -> Vec<Partition> {
    assert!(batch_size != 0, "batch size must be > 0");
    assert!(
        batch_size <= MAX_NODE_COUNT,
        "batch size {batch_size} exceeds {MAX_NODE_COUNT}"
    );
    let mut partitions = Vec::with_capacity(node_count.div_ceil(batch_size) as usize);
    let mut start = 0;
    while start < node_count {
        let count = batch_size.min(node_count - start);
        partitions.push(Partition::new_unchecked(start, count));
        start += count;
    }
    partitions
}

/// Uniform partitioning into roughly `concurrency` partitions.
pub fn range_partition(node_count: u64, concurrency: usize, min_batch_size: u64) -> Vec<Partition> {
    let batch_size = adjusted_batch_size(node_count, concurrency, min_batch_size);
    range_partition_with_batch_size(node_count, batch_size)
}

/// Degree-balanced partitioning of `graph`.
pub fn degree_partition<G: Graph>(graph: &G, concurrency: usize) -> Vec<Partition> {
    degree_partition_by(graph.node_count(), concurrency, |node| graph.degree(node))
}

/// Degree-balanced partitioning with degrees supplied by `degree`.
///
/// A partition is closed as soon as its degree sum reaches
/// `max(1, ceil(total / concurrency))`, or when one more node would break
/// [`Partition::fits`] for the partitions emitted so far. No partition's degree sum
/// exceeds the threshold by more than the largest single degree.
///
/// # Panics
/// Panics if `concurrency == 0`.
pub fn degree_partition_by(
    node_count: u64,
    concurrency: usize,
    degree: impl Fn(u64) -> u64,
) -> Vec<Partition> {
    assert!(concurrency != 0, "concurrency must be > 0");
    if node_count == 0 {
        return Vec::new();
    }
    let total: u64 = (0..node_count).map(&degree).fold(0u64, u64::saturating_add);
    let threshold = total.div_ceil(concurrency as u64).max(1);

    let mut partitions = Vec::with_capacity(concurrency);
    let mut start = 0u64;
    let mut sum = 0u64;
    for node in 0..node_count {
        let count = node - start;
        if count > 0 && !Partition::new_unchecked(start, count + 1).fits(partitions.len() as u64) {
            partitions.push(Partition::new_unchecked(start, count));
            start = node;
            sum = 0;
        }
        sum = sum.saturating_add(degree(node));
        if sum >= threshold {
            partitions.push(Partition::new_unchecked(start, node + 1 - start));
            start = node + 1;
            sum = 0;
        }
    }
    if start < node_count {
        partitions.push(Partition::new_unchecked(start, node_count - start));
    }
    partitions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_node_count_value() {
        assert_eq!(MAX_NODE_COUNT, 1_073_741_807);
    }

    #[test]
    fn fits_boundary() {
        let p = Partition::new(0, 100).unwrap();
        let k = MAX_NODE_COUNT - 100;
        assert!(p.fits(k));
        assert!(!p.fits(k + 1));
        assert!(!p.fits(u64::MAX));
    }

    #[test]
    fn new_rejects_degenerate_spans() {
        assert!(matches!(
            Partition::new(3, 0),
            Err(Error::InvalidPartition { start_node: 3, node_count: 0 })
        ));
        assert!(Partition::new(0, MAX_NODE_COUNT + 1).is_err());
        assert!(Partition::new(u64::MAX, 2).is_err());
        assert_eq!(Partition::new(5, 3).unwrap().nodes(), 5..8);
    }

    #[test]
    fn deserialization_validates() {
        let p: Partition = serde_json::from_str(r#"{"startNode": 4, "nodeCount": 2}"#).unwrap();
        assert_eq!(p, Partition::new(4, 2).unwrap());
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"startNode":4,"nodeCount":2}"#);
        assert!(serde_json::from_str::<Partition>(r#"{"startNode": 0, "nodeCount": 0}"#).is_err());
        let too_big = format!(r#"{{"startNode": 0, "nodeCount": {}}}"#, MAX_NODE_COUNT + 1);
        assert!(serde_json::from_str::<Partition>(&too_big).is_err());
    }

    #[test]
    fn adjusted_batch_size_respects_minimum() {
        assert_eq!(adjusted_batch_size(1_000, 4, 10), 250);
        assert_eq!(adjusted_batch_size(1_000, 4, 500), 500);
        assert_eq!(adjusted_batch_size(0, 4, 0), 1);
        assert_eq!(adjusted_batch_size(u64::MAX, 1, 1), MAX_NODE_COUNT);
    }

    #[test]
    fn range_partition_remainder_goes_last() {
        let partitions = range_partition_with_batch_size(10, 4);
        let spans: Vec<_> = partitions.iter().map(|p| (p.start_node(), p.node_count())).collect();
        assert_eq!(spans, vec![(0, 4), (4, 4), (8, 2)]);
        assert!(range_partition(0, 4, 1).is_empty());
    }

    #[test]
    fn degree_partition_balances_skew() {
        // One hub followed by many leaves.
        let degrees = |node: u64| if node == 0 { 100 } else { 1 };
        let partitions = degree_partition_by(101, 2, degrees);
        assert_eq!(partitions[0], Partition::new(0, 1).unwrap());
        assert_eq!(partitions[1], Partition::new(1, 100).unwrap());
    }

    #[test]
    fn zero_degrees_form_one_partition() {
        let partitions = degree_partition_by(1_000, 8, |_| 0);
        assert_eq!(partitions, vec![Partition::new(0, 1_000).unwrap()]);
    }

    #[test]
    fn display_matches_debug_fields() {
        let p = Partition::new(2, 3).unwrap();
        assert_eq!(p.to_string(), "Partition{startNode=2, nodeCount=3}");
    }
}
