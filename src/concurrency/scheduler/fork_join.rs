//! Dynamic fork/join traversal with per-root completion latches.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_utils::CachePadded;
use rayon::Scope;

use super::Scheduler;
use crate::concurrency::progress::ProgressTracker;
use crate::concurrency::termination::TerminationFlag;
use crate::error::{Error, Result};

type TaskFn<'s, T> = dyn Fn(T, &ForkContext<'_, T>) -> Result<u64> + Sync + 's;

/// Handle given to a running fork/join task.
pub struct ForkContext<'c, T> {
    spawn: &'c dyn Fn(T) -> bool,
    termination: &'c TerminationFlag,
}

impl<T> ForkContext<'_, T> {
    /// Schedules `child` as a descendant of the current root.
    ///
    /// Returns `false` and drops `child` once the traversal is terminated or a task
    /// has failed.
    #[inline]
    pub fn fork(&self, child: T) -> bool {
        (self.spawn)(child)
    }

    /// Whether the traversal should continue.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.termination.is_running()
    }
}

/// Counters of a finished fork/join traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForkJoinStats {
    /// Seeds submitted.
    pub roots: u64,
    /// Task bodies that ran, seeds included.
    pub tasks: u64,
    /// Roots whose descendants all drained.
    pub roots_completed: u64,
}

/// Outstanding tasks of one root: the root itself plus every forked descendant.
struct TaskLatch {
    pending: CachePadded<AtomicUsize>,
}

impl TaskLatch {
    fn new() -> Self {
        Self {
            pending: CachePadded::new(AtomicUsize::new(1)),
        }
    }

    fn increment(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns `true` for the task that brings the count to zero.
    fn complete(&self) -> bool {
        self.pending.fetch_sub(1, Ordering::AcqRel) == 1
    }
}

struct Shared<'s, T> {
    task: &'s TaskFn<'s, T>,
    termination: &'s TerminationFlag,
    progress: &'s dyn ProgressTracker,
    aborted: AtomicBool,
    first_error: Mutex<Option<Error>>,
    tasks: CachePadded<AtomicU64>,
    roots_completed: CachePadded<AtomicU64>,
}

impl<T> Shared<'_, T> {
    fn accepting(&self) -> bool {
        !self.aborted.load(Ordering::Acquire) && self.termination.is_running()
    }

    fn fail(&self, error: Error) {
        self.aborted.store(true, Ordering::Release);
        let mut slot = self.first_error.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(error);
    }
}

fn spawn_task<'s, T: Send + 's>(
    scope: &Scope<'s>,
    shared: &'s Shared<'s, T>,
    latch: &Arc<TaskLatch>,
    item: T,
) -> bool {
    if !shared.accepting() {
        return false;
    }
    latch.increment();
    let latch = Arc::clone(latch);
    scope.spawn(move |scope| run_task(scope, shared, latch, item));
    true
}

fn run_task<'s, T: Send + 's>(
    scope: &Scope<'s>,
    shared: &'s Shared<'s, T>,
    latch: Arc<TaskLatch>,
    item: T,
) {
    if shared.accepting() {
        shared.tasks.fetch_add(1, Ordering::Relaxed);
        let spawn = |child: T| spawn_task(scope, shared, &latch, child);
        let ctx = ForkContext {
            spawn: &spawn,
            termination: shared.termination,
        };
        match (shared.task)(item, &ctx) {
            Ok(processed) => shared.progress.log_progress(processed),
            Err(error) => {
                tracing::warn!(%error, "fork/join task failed");
                shared.fail(error);
            }
        }
    } else if !shared.termination.is_running() {
        shared.fail(Error::Terminated);
    }

    if latch.complete() {
        let done = shared.roots_completed.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(roots_completed = done, "root drained");
    }
}

impl Scheduler {
    /// Runs one root task per seed and every task they fork, then waits for all of
    /// them to drain.
    ///
    /// `task` receives its item and a [`ForkContext`] through which it may fork
    /// children onto the fork/join pool. The returned element count is reported to
    /// `progress` once per task. After cancellation or the first failure, queued tasks
    /// skip their body and [`ForkContext::fork`] refuses new children.
    ///
    /// # Errors
    /// [`Error::Terminated`] on cancellation, otherwise the first task error.
    pub fn fork_join<T, F>(
        &self,
        seeds: Vec<T>,
        termination: &TerminationFlag,
        progress: &dyn ProgressTracker,
        task: F,
    ) -> Result<ForkJoinStats>
    where
        T: Send,
        F: Fn(T, &ForkContext<'_, T>) -> Result<u64> + Sync,
    {
        termination.assert_running()?;
        let roots = seeds.len() as u64;
        tracing::debug!(roots, "fork/join phase started");

        let shared = Shared {
            task: &task,
            termination,
            progress,
            aborted: AtomicBool::new(false),
            first_error: Mutex::new(None),
            tasks: CachePadded::new(AtomicU64::new(0)),
            roots_completed: CachePadded::new(AtomicU64::new(0)),
        };

        self.fork_join_pool.scope(|scope| {
            let shared = &shared;
            for seed in seeds {
                let latch = Arc::new(TaskLatch::new());
                scope.spawn(move |scope| run_task(scope, shared, latch, seed));
            }
        });

        let stats = ForkJoinStats {
            roots,
            tasks: shared.tasks.load(Ordering::Acquire),
            roots_completed: shared.roots_completed.load(Ordering::Acquire),
        };
        tracing::debug!(
            roots,
            tasks = stats.tasks,
            roots_completed = stats.roots_completed,
            "fork/join phase finished"
        );

        let first_error = shared
            .first_error
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        match first_error {
            Some(error) => Err(error),
            // Forks may have been refused even if no queued task noticed.
            None if !termination.is_running() => Err(Error::Terminated),
            None => Ok(stats),
        }
    }
}
