//! Run configuration, loadable from JSON.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::partition::{degree_partition, range_partition, Partition};

/// Default lower bound on the nodes per range partition.
pub const DEFAULT_MIN_BATCH_SIZE: u64 = 10_000;

/// How the node id space is split for partition-parallel phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartitionPolicy {
    /// Equally sized node ranges.
    #[default]
    Range,
    /// Node ranges of roughly equal total degree.
    Degree,
}

/// Settings shared by every parallel computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParallelConfig {
    /// Worker threads per pool.
    pub concurrency: usize,
    /// Minimum nodes per range partition.
    pub min_batch_size: u64,
    /// Partitioning policy.
    pub partitioning: PartitionPolicy,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            concurrency: std::thread::available_parallelism().map_or(4, |n| n.get()),
            min_batch_size: DEFAULT_MIN_BATCH_SIZE,
            partitioning: PartitionPolicy::Range,
        }
    }
}

impl ParallelConfig {
    /// Checks the settings.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be > 0".to_owned()));
        }
        if self.min_batch_size == 0 {
            return Err(Error::InvalidConfig("minBatchSize must be > 0".to_owned()));
        }
        Ok(())
    }

    /// Partitions `graph` according to the configured policy.
    pub fn partitions<G: Graph>(&self, graph: &G) -> Vec<Partition> {
        match self.partitioning {
            PartitionPolicy::Range => {
                range_partition(graph.node_count(), self.concurrency, self.min_batch_size)
            }
            PartitionPolicy::Degree => degree_partition(graph, self.concurrency),
        }
    }
}

/// Settings of [`TopologicalSort`](crate::algo::TopologicalSort).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopologicalSortConfig {
    /// Parallelism.
    #[serde(flatten)]
    pub parallel: ParallelConfig,
    /// Also compute the longest path distance of every sorted node.
    pub compute_longest_path_distances: bool,
}

impl TopologicalSortConfig {
    /// Checks the settings.
    pub fn validate(&self) -> Result<()> {
        self.parallel.validate()
    }

    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Settings of [`Wcc`](crate::algo::Wcc).
///
/// Unlike the other algorithms, partitioning defaults to [`PartitionPolicy::Degree`],
/// also when a JSON document leaves `partitioning` out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WccConfigDocument")]
pub struct WccConfig {
    /// Parallelism.
    #[serde(flatten)]
    pub parallel: ParallelConfig,
}

impl Default for WccConfig {
    fn default() -> Self {
        Self {
            parallel: ParallelConfig {
                partitioning: PartitionPolicy::Degree,
                ..ParallelConfig::default()
            },
        }
    }
}

/// JSON shape of [`WccConfig`]; absent keys fall back to [`WccConfig::default`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WccConfigDocument {
    concurrency: Option<usize>,
    min_batch_size: Option<u64>,
    partitioning: Option<PartitionPolicy>,
}

impl From<WccConfigDocument> for WccConfig {
    fn from(document: WccConfigDocument) -> Self {
        let defaults = Self::default().parallel;
        Self {
            parallel: ParallelConfig {
                concurrency: document.concurrency.unwrap_or(defaults.concurrency),
                min_batch_size: document.min_batch_size.unwrap_or(defaults.min_batch_size),
                partitioning: document.partitioning.unwrap_or(defaults.partitioning),
            },
        }
    }
}

impl WccConfig {
    /// Checks the settings.
    pub fn validate(&self) -> Result<()> {
        self.parallel.validate()
    }

    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
