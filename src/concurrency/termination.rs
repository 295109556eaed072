//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// A shared "keep running" flag.
///
/// Clones observe the same flag. Tasks poll it at partition and task boundaries;
/// once [`terminate`](Self::terminate) is called it never flips back.
#[derive(Debug, Clone)]
pub struct TerminationFlag {
    running: Arc<AtomicBool>,
}

impl TerminationFlag {
    /// A flag in the running state.
    pub fn running() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Requests termination of every task observing this flag.
    pub fn terminate(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            tracing::debug!("termination requested");
        }
    }

    /// Whether work should continue.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// `Err(Error::Terminated)` once termination was requested.
    #[inline]
    pub fn assert_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(Error::Terminated)
        }
    }
}

impl Default for TerminationFlag {
    fn default() -> Self {
        Self::running()
    }
}
