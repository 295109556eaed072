//! Executes parallel phases over partitions and fork/join traversals.
//!
//! A [`Scheduler`] owns two rayon pools sized by the same concurrency. Flat phases run
//! on the partition pool; fork/join traversals run on the fork/join pool and rely on
//! rayon's work stealing to balance uneven subtrees.

mod fork_join;

pub use fork_join::{ForkContext, ForkJoinStats};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::progress::ProgressTracker;
use super::termination::TerminationFlag;
use crate::config::ParallelConfig;
use crate::error::{Error, Result};
use crate::partition::{Partition, MAX_NODE_COUNT};

/// Runs partition-parallel and fork/join phases.
#[derive(Debug)]
pub struct Scheduler {
    concurrency: usize,
    partition_pool: ThreadPool,
    fork_join_pool: ThreadPool,
}

impl Scheduler {
    /// Builds both pools with `concurrency` threads each.
    pub fn new(concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be > 0".to_owned()));
        }
        let partition_pool = ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("pagegraph-partition-{i}"))
            .build()?;
        let fork_join_pool = ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("pagegraph-forkjoin-{i}"))
            .build()?;
        tracing::debug!(concurrency, "scheduler ready");
        Ok(Self {
            concurrency,
            partition_pool,
            fork_join_pool,
        })
    }

    /// Builds a scheduler after validating `config`.
    pub fn from_config(config: &ParallelConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.concurrency)
    }

    /// Threads per pool.
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs `task` once per partition and waits for all of them.
    ///
    /// `task` returns the number of elements it processed, which is reported to
    /// `progress` once per partition. Termination is checked before each partition and
    /// once more after the phase joins, so a phase cancelled mid-flight never succeeds.
    /// The first failing partition stops the phase and its error is returned.
    ///
    /// # Errors
    /// [`Error::TooManyPartitions`] if more than [`MAX_NODE_COUNT`] partitions are
    /// submitted, [`Error::Terminated`] on cancellation, or the task's own error.
    pub fn for_each_partition<F>(
        &self,
        partitions: &[Partition],
        termination: &TerminationFlag,
        progress: &dyn ProgressTracker,
        task: F,
    ) -> Result<()>
    where
        F: Fn(Partition) -> Result<u64> + Sync,
    {
        let count = partitions.len() as u64;
        if count > MAX_NODE_COUNT {
            return Err(Error::TooManyPartitions {
                count,
                max: MAX_NODE_COUNT,
            });
        }
        termination.assert_running()?;
        tracing::debug!(partitions = count, "partition phase started");

        let result = self.partition_pool.install(|| {
            partitions.par_iter().try_for_each(|&partition| {
                termination.assert_running()?;
                let processed = task(partition).inspect_err(|error| {
                    tracing::warn!(%partition, %error, "partition task failed");
                })?;
                progress.log_progress(processed);
                Ok(())
            })
        });
        // A partition may have finished after termination was requested.
        let result = result.and_then(|()| termination.assert_running());

        tracing::debug!(partitions = count, ok = result.is_ok(), "partition phase finished");
        result
    }
}

#[cfg(test)]
mod tests;
