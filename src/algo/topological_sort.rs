//! Parallel topological sort with optional longest path distances.
//!
//! Nodes on a cycle, and every node reachable from one, never reach in-degree zero and
//! are left out of the result. A result smaller than the node count therefore
//! signals a cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::collections::{AtomicBitSet, AtomicPagedArray};
use crate::concurrency::{ProgressTracker, Scheduler, TerminationFlag};
use crate::config::TopologicalSortConfig;
use crate::error::Result;
use crate::graph::Graph;
use crate::mem::MemoryRange;

/// Longest path distance per node, if requested.
#[derive(Debug)]
pub enum LongestPathDistances {
    /// Distances were not requested.
    Disabled,
    /// Distance from the farthest source, per node.
    Enabled(AtomicPagedArray),
}

impl LongestPathDistances {
    fn new(node_count: u64, enabled: bool) -> Self {
        if enabled {
            Self::Enabled(AtomicPagedArray::new(node_count))
        } else {
            Self::Disabled
        }
    }

    /// Raises the distance of `target` to at least one more than that of `source`.
    #[inline]
    fn relax(&self, source: u64, target: u64) {
        if let Self::Enabled(distances) = self {
            distances.update_max(target, distances.get(source) + 1);
        }
    }

    /// Whether distances are tracked.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }
}

/// Output of [`TopologicalSort::compute`].
#[derive(Debug)]
pub struct TopologicalSortResult {
    sorted_nodes: AtomicPagedArray,
    len: AtomicU64,
    in_output: AtomicBitSet,
    distances: LongestPathDistances,
}

impl TopologicalSortResult {
    fn new(node_count: u64, longest_path: bool) -> Self {
        Self {
            sorted_nodes: AtomicPagedArray::new(node_count),
            len: AtomicU64::new(0),
            in_output: AtomicBitSet::new(node_count),
            distances: LongestPathDistances::new(node_count, longest_path),
        }
    }

    fn push(&self, node: u64) {
        let slot = self.len.fetch_add(1, Ordering::AcqRel);
        self.sorted_nodes.set(slot, node as i64);
        self.in_output.test_and_set(node);
    }

    /// Number of sorted nodes.
    pub fn size(&self) -> u64 {
        self.len.load(Ordering::Acquire)
    }

    /// Sorted nodes: every node appears after all of its predecessors.
    pub fn sorted_nodes(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.size()).map(|slot| self.sorted_nodes.get(slot) as u64)
    }

    /// Whether `node` was sorted.
    pub fn contains(&self, node: u64) -> bool {
        self.in_output.get(node)
    }

    /// Longest path distance of `node`.
    ///
    /// `None` if distances were not requested or `node` was excluded by a cycle.
    pub fn longest_path_distance(&self, node: u64) -> Option<i64> {
        match &self.distances {
            LongestPathDistances::Enabled(distances) if self.contains(node) => {
                Some(distances.get(node))
            }
            _ => None,
        }
    }

    /// The distance store.
    pub fn longest_path_distances(&self) -> &LongestPathDistances {
        &self.distances
    }
}

/// Kahn's algorithm with in-degree counters decremented concurrently.
pub struct TopologicalSort<'a, G> {
    graph: &'a G,
    config: TopologicalSortConfig,
    progress: &'a dyn ProgressTracker,
    termination: TerminationFlag,
}

impl<'a, G: Graph> TopologicalSort<'a, G> {
    /// Prepares a sort of `graph`.
    pub fn new(
        graph: &'a G,
        config: TopologicalSortConfig,
        progress: &'a dyn ProgressTracker,
        termination: TerminationFlag,
    ) -> Self {
        Self {
            graph,
            config,
            progress,
            termination,
        }
    }

    /// Estimated bytes for a graph of `node_count` nodes.
    pub fn memory_estimation(node_count: u64, longest_path: bool) -> MemoryRange {
        let array = AtomicPagedArray::memory_estimation(node_count);
        let bits = node_count.div_ceil(64) * 8;
        let distances = if longest_path { array } else { 0 };
        // In-degrees plus sorted nodes.
        MemoryRange::of(2 * array + bits + distances)
    }

    /// Sorts the graph.
    pub fn compute(&self, scheduler: &Scheduler) -> Result<TopologicalSortResult> {
        self.config.validate()?;
        let node_count = self.graph.node_count();
        tracing::info!(
            node_count,
            longest_path = self.config.compute_longest_path_distances,
            "topological sort started"
        );
        self.progress.begin_sub_task("TopologicalSort");

        let in_degrees = AtomicPagedArray::new(node_count);
        let partitions = self.config.parallel.partitions(self.graph);

        self.progress
            .begin_sub_task_with_volume("Initialization", node_count);
        scheduler.for_each_partition(&partitions, &self.termination, self.progress, |partition| {
            let graph = self.graph.concurrent_copy();
            for node in partition.nodes() {
                self.termination.assert_running()?;
                graph.for_each_relationship(node, |_, target| {
                    in_degrees.get_and_add(target, 1);
                    true
                });
            }
            Ok(partition.node_count())
        })?;
        self.progress.end_sub_task("Initialization");

        let result = TopologicalSortResult::new(node_count, self.config.compute_longest_path_distances);

        self.progress.begin_sub_task_with_volume("Traversal", node_count);
        let sources = Mutex::new(Vec::new());
        scheduler.for_each_partition(&partitions, &self.termination, self.progress, |partition| {
            let local: Vec<u64> = partition
                .nodes()
                .filter(|&node| in_degrees.get(node) == 0)
                .collect();
            sources
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .extend(local);
            Ok(0)
        })?;
        let mut sources = sources.into_inner().unwrap_or_else(|e| e.into_inner());
        sources.sort_unstable();
        let seeds = sources
            .into_iter()
            .map(|node| (node, self.graph.concurrent_copy()))
            .collect();

        let stats = scheduler.fork_join(seeds, &self.termination, self.progress, |(node, graph), ctx| {
            result.push(node);
            graph.for_each_relationship(node, |source, target| {
                // Distances are published before the decrement that may release `target`.
                result.distances.relax(source, target);
                if in_degrees.get_and_add(target, -1) == 1 {
                    ctx.fork((target, graph.concurrent_copy()));
                }
                ctx.is_running()
            });
            Ok(1)
        })?;
        self.progress.end_sub_task("Traversal");
        self.progress.end_sub_task("TopologicalSort");

        tracing::info!(
            sorted = result.size(),
            node_count,
            roots = stats.roots,
            "topological sort finished"
        );
        Ok(result)
    }
}
