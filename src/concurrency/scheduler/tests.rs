use std::sync::atomic::{AtomicU64, Ordering};

use super::*;
use crate::concurrency::progress::{EmptyProgressTracker, LoggingProgressTracker};
use crate::partition::range_partition_with_batch_size;

#[test]
fn zero_concurrency_is_rejected() {
    assert!(matches!(Scheduler::new(0), Err(Error::InvalidConfig(_))));
}

#[test]
fn every_partition_runs_once() {
    let scheduler = Scheduler::new(4).unwrap();
    let partitions = range_partition_with_batch_size(10_000, 333);
    let sum = AtomicU64::new(0);
    let progress = LoggingProgressTracker::new("test");
    progress.begin_sub_task_with_volume("sum", 10_000);
    scheduler
        .for_each_partition(&partitions, &TerminationFlag::running(), &progress, |partition| {
            let local: u64 = partition.nodes().sum();
            sum.fetch_add(local, Ordering::Relaxed);
            Ok(partition.node_count())
        })
        .unwrap();
    assert_eq!(sum.into_inner(), (0..10_000u64).sum::<u64>());
    assert_eq!(progress.progress(), 10_000);
}

#[test]
fn terminated_before_phase() {
    let scheduler = Scheduler::new(2).unwrap();
    let termination = TerminationFlag::running();
    termination.terminate();
    let ran = AtomicU64::new(0);
    let result = scheduler.for_each_partition(
        &range_partition_with_batch_size(100, 10),
        &termination,
        &EmptyProgressTracker,
        |_| {
            ran.fetch_add(1, Ordering::Relaxed);
            Ok(0)
        },
    );
    assert!(matches!(result, Err(Error::Terminated)));
    assert_eq!(ran.into_inner(), 0);
}

#[test]
fn terminated_during_phase() {
    let scheduler = Scheduler::new(2).unwrap();
    let termination = TerminationFlag::running();
    let result = scheduler.for_each_partition(
        &range_partition_with_batch_size(10, 10),
        &termination,
        &EmptyProgressTracker,
        |partition| {
            // The only partition completes its work after cancellation.
            termination.terminate();
            Ok(partition.node_count())
        },
    );
    assert!(matches!(result, Err(Error::Terminated)));
}

#[test]
fn partition_failure_surfaces_original_error() {
    let scheduler = Scheduler::new(4).unwrap();
    let result = scheduler.for_each_partition(
        &range_partition_with_batch_size(100, 10),
        &TerminationFlag::running(),
        &EmptyProgressTracker,
        |partition| {
            if partition.start_node() == 50 {
                Err(Error::MissingInput {
                    what: "weight",
                    node: 57,
                })
            } else {
                Ok(partition.node_count())
            }
        },
    );
    assert!(matches!(
        result,
        Err(Error::MissingInput { what: "weight", node: 57 })
    ));
}

#[test]
fn fork_join_drains_binary_tree() {
    // Every task forks two children until depth 10: 2^11 - 1 tasks per root.
    let scheduler = Scheduler::new(4).unwrap();
    let visited = AtomicU64::new(0);
    let stats = scheduler
        .fork_join(
            vec![0u32, 0, 0],
            &TerminationFlag::running(),
            &EmptyProgressTracker,
            |depth, ctx| {
                visited.fetch_add(1, Ordering::Relaxed);
                if depth < 10 {
                    assert!(ctx.fork(depth + 1));
                    assert!(ctx.fork(depth + 1));
                }
                Ok(1)
            },
        )
        .unwrap();
    assert_eq!(visited.into_inner(), 3 * 2047);
    assert_eq!(
        stats,
        ForkJoinStats {
            roots: 3,
            tasks: 3 * 2047,
            roots_completed: 3,
        }
    );
}

#[test]
fn fork_join_with_no_seeds() {
    let scheduler = Scheduler::new(1).unwrap();
    let stats = scheduler
        .fork_join(
            Vec::<u64>::new(),
            &TerminationFlag::running(),
            &EmptyProgressTracker,
            |_, _| Ok(0),
        )
        .unwrap();
    assert_eq!(stats, ForkJoinStats::default());
}

#[test]
fn fork_join_stops_forking_after_termination() {
    let scheduler = Scheduler::new(2).unwrap();
    let termination = TerminationFlag::running();
    let result = scheduler.fork_join(
        vec![0u64],
        &termination,
        &EmptyProgressTracker,
        |n, ctx| {
            if n == 100 {
                termination.terminate();
            }
            // An unbounded chain; only termination ends it.
            ctx.fork(n + 1);
            Ok(0)
        },
    );
    assert!(matches!(result, Err(Error::Terminated)));
}

#[test]
fn fork_join_reports_first_failure() {
    let scheduler = Scheduler::new(3).unwrap();
    let result = scheduler.fork_join(
        (0..64u64).collect(),
        &TerminationFlag::running(),
        &EmptyProgressTracker,
        |seed, _| {
            if seed == 13 {
                Err(Error::MissingInput {
                    what: "property",
                    node: seed,
                })
            } else {
                Ok(0)
            }
        },
    );
    assert!(matches!(
        result,
        Err(Error::MissingInput { what: "property", node: 13 })
    ));
}
