//! Weakly connected components over the concurrent union-find.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::collections::disjoint_set::{
    DisjointSetStruct, NodeLabels, PagedDisjointSetStruct, RemappingDisjointSetStruct,
};
use crate::concurrency::{ProgressTracker, Scheduler, TerminationFlag};
use crate::config::WccConfig;
use crate::error::Result;
use crate::graph::Graph;
use crate::mem::MemoryRange;

/// Unions the endpoints of every relationship, one partition per task.
pub struct Wcc<'a, G> {
    graph: &'a G,
    config: WccConfig,
    progress: &'a dyn ProgressTracker,
    termination: TerminationFlag,
}

impl<'a, G: Graph> Wcc<'a, G> {
    /// Prepares a run over `graph`.
    pub fn new(
        graph: &'a G,
        config: WccConfig,
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

    /// Estimated bytes for `node_count` nodes, with or without seed labels.
    pub fn memory_estimation(node_count: u64, seeded: bool) -> MemoryRange {
        if seeded {
            RemappingDisjointSetStruct::<HashMap<u64, u64>>::memory_estimation(node_count)
        } else {
            PagedDisjointSetStruct::memory_estimation(node_count)
        }
    }

    /// Components starting from singletons.
    pub fn compute(&self, scheduler: &Scheduler) -> Result<PagedDisjointSetStruct> {
        let dss = PagedDisjointSetStruct::new(self.graph.node_count());
        self.link(scheduler, &dss)?;
        Ok(dss)
    }

    /// Components starting from the sets given by `labels`.
    ///
    /// Labelled sets keep their label as set id unless merged with a set whose root
    /// has a smaller node id.
    pub fn compute_seeded<L>(&self, scheduler: &Scheduler, labels: L) -> Result<RemappingDisjointSetStruct<L>>
    where
        L: NodeLabels + Send + Sync,
    {
        let dss = RemappingDisjointSetStruct::new(self.graph.node_count(), labels);
        self.link(scheduler, &dss)?;
        Ok(dss)
    }

    fn link<D: DisjointSetStruct>(&self, scheduler: &Scheduler, dss: &D) -> Result<()> {
        self.config.validate()?;
        let partitions = self.config.parallel.partitions(self.graph);
        tracing::info!(
            node_count = self.graph.node_count(),
            partitions = partitions.len(),
            "wcc started"
        );
        self.progress
            .begin_sub_task_with_volume("Wcc", self.graph.relationship_count());

        let linked = AtomicU64::new(0);
        scheduler.for_each_partition(&partitions, &self.termination, self.progress, |partition| {
            let graph = self.graph.concurrent_copy();
            let mut relationships = 0u64;
            for node in partition.nodes() {
                self.termination.assert_running()?;
                graph.for_each_relationship(node, |source, target| {
                    dss.union(source, target);
                    relationships += 1;
                    true
                });
            }
            linked.fetch_add(relationships, Ordering::Relaxed);
            Ok(relationships)
        })?;

        self.progress.end_sub_task("Wcc");
        tracing::info!(relationships = linked.into_inner(), "wcc finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::concurrency::EmptyProgressTracker;
    use crate::config::{ParallelConfig, PartitionPolicy};
    use crate::graph::CsrGraph;

    fn wcc(graph: &CsrGraph) -> Wcc<'_, CsrGraph> {
        let config = WccConfig {
            parallel: ParallelConfig {
                concurrency: 3,
                min_batch_size: 1,
                partitioning: PartitionPolicy::Degree,
            },
        };
        Wcc::new(graph, config, &EmptyProgressTracker, TerminationFlag::running())
    }

    /// Raises the termination flag the first time node 0 is expanded.
    #[derive(Clone)]
    struct CancellingGraph {
        inner: CsrGraph,
        termination: TerminationFlag,
    }

    impl Graph for CancellingGraph {
        fn node_count(&self) -> u64 {
            self.inner.node_count()
        }

        fn relationship_count(&self) -> u64 {
            self.inner.relationship_count()
        }

        fn degree(&self, node: u64) -> u64 {
            self.inner.degree(node)
        }

        fn for_each_relationship<F>(&self, node: u64, visitor: F)
        where
            F: FnMut(u64, u64) -> bool,
        {
            if node == 0 {
                self.termination.terminate();
            }
            self.inner.for_each_relationship(node, visitor);
        }

        fn concurrent_copy(&self) -> Self {
            self.clone()
        }

        fn to_original_node_id(&self, node: u64) -> u64 {
            self.inner.to_original_node_id(node)
        }
    }

    #[test]
    fn cancelled_mid_partition_is_an_error() {
        let edges: Vec<(u64, u64)> = (0..999).map(|n| (n, n + 1)).collect();
        let termination = TerminationFlag::running();
        let graph = CancellingGraph {
            inner: CsrGraph::from_edges(1_000, &edges),
            termination: termination.clone(),
        };
        let config = WccConfig {
            parallel: ParallelConfig {
                concurrency: 1,
                min_batch_size: 1_000,
                partitioning: PartitionPolicy::Range,
            },
        };
        let scheduler = Scheduler::new(1).unwrap();
        let result = Wcc::new(&graph, config, &EmptyProgressTracker, termination).compute(&scheduler);
        assert!(matches!(result, Err(crate::Error::Terminated)));
    }

    #[test]
    fn two_chains_two_components() {
        // 0 -> 1 -> 2 and 5 -> 4 -> 3
        let graph = CsrGraph::from_edges(6, &[(0, 1), (1, 2), (5, 4), (4, 3)]);
        let scheduler = Scheduler::new(3).unwrap();
        let dss = wcc(&graph).compute(&scheduler).unwrap();
        assert_eq!(dss.set_count(), 2);
        assert_eq!(dss.set_id_of(2), 0);
        assert_eq!(dss.set_id_of(5), 3);
    }

    #[test]
    fn seeded_labels_survive() {
        // 1 -> 2 links a labelled node to an unlabelled one; 0 and 3 are isolated.
        let graph = CsrGraph::from_edges(4, &[(1, 2)]);
        let labels: HashMap<u64, u64> = [(1, 77), (3, 77)].into_iter().collect();
        let scheduler = Scheduler::new(2).unwrap();
        let dss = wcc(&graph).compute_seeded(&scheduler, labels).unwrap();
        assert_eq!(dss.set_id_of(2), 77);
        assert_eq!(dss.set_id_of(3), 77);
        assert_eq!(dss.set_id_of(0), 0);
        assert_eq!(dss.set_count(), 2);
    }
}
