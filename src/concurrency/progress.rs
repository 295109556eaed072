//! Progress reporting sinks.
//!
//! Tasks report the number of elements they handled once per partition or once per
//! traversal task, never per element, so a sink sees a bounded number of calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crossbeam_utils::CachePadded;

/// Receives progress from running tasks.
pub trait ProgressTracker: Send + Sync {
    /// Enters a named phase of unknown volume.
    fn begin_sub_task(&self, name: &str);

    /// Enters a named phase expected to process `volume` elements.
    fn begin_sub_task_with_volume(&self, name: &str, volume: u64) {
        let _ = volume;
        self.begin_sub_task(name);
    }

    /// Leaves the phase most recently entered.
    fn end_sub_task(&self, name: &str);

    /// Records that `amount` more elements were processed.
    fn log_progress(&self, amount: u64);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyProgressTracker;

impl ProgressTracker for EmptyProgressTracker {
    fn begin_sub_task(&self, _name: &str) {}

    fn end_sub_task(&self, _name: &str) {}

    fn log_progress(&self, _amount: u64) {}
}

/// Logs phase boundaries and percentage steps through `tracing`.
///
/// The live counters belong to the innermost phase. Entering a nested phase saves the
/// enclosing phase's counters, and leaving it restores them.
#[derive(Debug)]
pub struct LoggingProgressTracker {
    task_name: String,
    phases: Mutex<Vec<Phase>>,
    volume: AtomicU64,
    progress: CachePadded<AtomicU64>,
    logged_percent: AtomicU64,
    step_percent: u64,
}

/// An entered phase and the counters of the phase enclosing it.
#[derive(Debug)]
struct Phase {
    name: String,
    outer: Counters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Counters {
    volume: u64,
    progress: u64,
    logged_percent: u64,
}

impl LoggingProgressTracker {
    /// A tracker logging every 10 percent.
    pub fn new(task_name: impl Into<String>) -> Self {
        Self::with_step(task_name, 10)
    }

    /// A tracker logging every `step_percent` percent (clamped to `1..=100`).
    pub fn with_step(task_name: impl Into<String>, step_percent: u64) -> Self {
        Self {
            task_name: task_name.into(),
            phases: Mutex::new(Vec::new()),
            volume: AtomicU64::new(0),
            progress: CachePadded::new(AtomicU64::new(0)),
            logged_percent: AtomicU64::new(0),
            step_percent: step_percent.clamp(1, 100),
        }
    }

    /// Elements processed in the current phase.
    pub fn progress(&self) -> u64 {
        self.progress.load(Ordering::Acquire)
    }

    /// Last percentage that was logged in the current phase.
    pub fn logged_percent(&self) -> u64 {
        self.logged_percent.load(Ordering::Acquire)
    }

    fn path(&self) -> String {
        let phases = self.phases.lock().unwrap_or_else(|e| e.into_inner());
        let mut path = self.task_name.clone();
        for phase in phases.iter() {
            path.push_str(" :: ");
            path.push_str(&phase.name);
        }
        path
    }

    fn counters(&self) -> Counters {
        Counters {
            volume: self.volume.load(Ordering::Acquire),
            progress: self.progress.load(Ordering::Acquire),
            logged_percent: self.logged_percent.load(Ordering::Acquire),
        }
    }

    fn store_counters(&self, counters: Counters) {
        self.volume.store(counters.volume, Ordering::Release);
        self.progress.store(counters.progress, Ordering::Release);
        self.logged_percent
            .store(counters.logged_percent, Ordering::Release);
    }
}

impl ProgressTracker for LoggingProgressTracker {
    fn begin_sub_task(&self, name: &str) {
        self.begin_sub_task_with_volume(name, 0);
    }

    fn begin_sub_task_with_volume(&self, name: &str, volume: u64) {
        {
            let mut phases = self.phases.lock().unwrap_or_else(|e| e.into_inner());
            phases.push(Phase {
                name: name.to_owned(),
                outer: self.counters(),
            });
            self.store_counters(Counters {
                volume,
                progress: 0,
                logged_percent: 0,
            });
        }
        tracing::info!(task = %self.path(), volume, "start");
    }

    fn end_sub_task(&self, name: &str) {
        let path = self.path();
        let processed = self.progress();
        {
            let mut phases = self.phases.lock().unwrap_or_else(|e| e.into_inner());
            if phases.last().map(|phase| phase.name.as_str()) == Some(name) {
                if let Some(phase) = phases.pop() {
                    self.store_counters(phase.outer);
                }
            } else {
                tracing::warn!(task = %path, ended = name, "unbalanced end of sub task");
            }
        }
        tracing::info!(task = %path, processed, "finished");
    }

    fn log_progress(&self, amount: u64) {
        let done = self.progress.fetch_add(amount, Ordering::AcqRel) + amount;
        let volume = self.volume.load(Ordering::Acquire);
        if volume == 0 {
            return;
        }
        let percent = (done.saturating_mul(100) / volume).min(100);
        let step = percent - percent % self.step_percent;
        let mut logged = self.logged_percent.load(Ordering::Acquire);
        while step > logged {
            match self.logged_percent.compare_exchange_weak(
                logged,
                step,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    tracing::info!(task = %self.path(), "{step}%");
                    return;
                }
                Err(current) => logged = current,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_steps_only_advance() {
        let tracker = LoggingProgressTracker::with_step("job", 25);
        tracker.begin_sub_task_with_volume("phase", 200);
        tracker.log_progress(10);
        assert_eq!(tracker.logged_percent(), 0);
        tracker.log_progress(60);
        assert_eq!(tracker.logged_percent(), 25);
        tracker.log_progress(500);
        assert_eq!(tracker.logged_percent(), 100);
        assert_eq!(tracker.progress(), 570);
        tracker.end_sub_task("phase");
        assert_eq!(tracker.progress(), 0);
    }

    #[test]
    fn outer_phase_keeps_its_counters() {
        let tracker = LoggingProgressTracker::new("job");
        tracker.begin_sub_task_with_volume("outer", 100);
        tracker.log_progress(30);
        assert_eq!(tracker.logged_percent(), 30);

        tracker.begin_sub_task_with_volume("inner", 10);
        assert_eq!(tracker.progress(), 0);
        tracker.log_progress(10);
        assert_eq!(tracker.logged_percent(), 100);
        tracker.end_sub_task("inner");

        assert_eq!(tracker.progress(), 30);
        assert_eq!(tracker.logged_percent(), 30);
        tracker.log_progress(20);
        assert_eq!(tracker.logged_percent(), 50);
        tracker.end_sub_task("outer");
        assert_eq!(tracker.progress(), 0);
    }

    #[test]
    fn unbalanced_end_keeps_current_phase() {
        let tracker = LoggingProgressTracker::new("job");
        tracker.begin_sub_task_with_volume("phase", 10);
        tracker.log_progress(4);
        tracker.end_sub_task("other");
        assert_eq!(tracker.path(), "job :: phase");
        assert_eq!(tracker.progress(), 4);
    }

    #[test]
    fn nested_phases_build_a_path() {
        let tracker = LoggingProgressTracker::new("job");
        tracker.begin_sub_task("outer");
        tracker.begin_sub_task("inner");
        assert_eq!(tracker.path(), "job :: outer :: inner");
        tracker.end_sub_task("inner");
        tracker.end_sub_task("outer");
        assert_eq!(tracker.path(), "job");
    }
}
