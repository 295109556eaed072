//! Error types for the substrate.
//!
//! Every fallible operation returns [`Result<T>`]. Capacity violations are reported
//! before any mutation happens; task failures inside a parallel phase surface the
//! original error to the caller of the scheduler.

use thiserror::Error;

/// Unified error type.
#[derive(Debug, Error)]
pub enum Error {
    /// An index at or beyond the fixed capacity of a paged structure.
    #[error("index {index} is out of bounds for capacity {capacity}")]
    IndexOutOfBounds {
        /// The offending index.
        index: u64,
        /// Capacity of the structure.
        capacity: u64,
    },

    /// A partition with zero nodes or more than `MAX_NODE_COUNT` nodes.
    #[error("invalid partition starting at {start_node} with {node_count} nodes")]
    InvalidPartition {
        /// First node of the rejected partition.
        start_node: u64,
        /// Node count of the rejected partition.
        node_count: u64,
    },

    /// A partition set too large to be dispatched as one task set.
    #[error("{count} partitions exceed the maximum of {max}")]
    TooManyPartitions {
        /// Number of partitions handed to the scheduler.
        count: u64,
        /// Upper bound.
        max: u64,
    },

    /// Allocation refused by the memory gauge.
    #[error("memory reservation of {requested} bytes exceeds the available {available} bytes")]
    MemoryReservationExceeded {
        /// Bytes the caller tried to reserve.
        requested: u64,
        /// Bytes available at the time of the request.
        available: u64,
    },

    /// The termination flag was raised while work was running.
    #[error("the computation was terminated")]
    Terminated,

    /// Input required by a task was absent.
    #[error("missing {what} for node {node}")]
    MissingInput {
        /// Description of the missing input.
        what: &'static str,
        /// Node being processed when the input was found missing.
        node: u64,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be parsed.
    #[error("malformed configuration: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    /// A worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Fails with [`Error::IndexOutOfBounds`] unless `index < capacity`.
#[inline(always)]
pub(crate) fn check_index(index: u64, capacity: u64) -> Result<()> {
    if index < capacity {
        Ok(())
    } else {
        Err(Error::IndexOutOfBounds { index, capacity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_numbers() {
        let err = Error::MemoryReservationExceeded {
            requested: 128,
            available: 64,
        };
        assert_eq!(
            err.to_string(),
            "memory reservation of 128 bytes exceeds the available 64 bytes"
        );
        assert!(matches!(
            check_index(5, 5),
            Err(Error::IndexOutOfBounds { index: 5, capacity: 5 })
        ));
        assert!(check_index(4, 5).is_ok());
    }
}
