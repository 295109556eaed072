//! Task execution: the scheduler, cancellation and progress reporting.

pub mod progress;
pub mod scheduler;
pub mod termination;

pub use progress::{EmptyProgressTracker, LoggingProgressTracker, ProgressTracker};
pub use scheduler::{ForkContext, ForkJoinStats, Scheduler};
pub use termination::TerminationFlag;
