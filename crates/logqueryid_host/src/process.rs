//! Process roles.

use core::fmt;

/// Role of a backend process with respect to the query it executes.
///
/// A leader may hand parts of a query to parallel workers. Workers are
/// separate processes: they load extensions themselves at process start and
/// exit independently of the leader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProcessRole {
    /// The process that received the query.
    #[default]
    Leader,
    /// An auxiliary process executing part of a leader's query.
    ParallelWorker {
        /// Worker number within the leader's parallel context.
        number: u32,
    },
}

impl ProcessRole {
    /// Returns true for a parallel worker.
    #[must_use]
    pub fn is_parallel_worker(self) -> bool {
        matches!(self, ProcessRole::ParallelWorker { .. })
    }
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessRole::Leader => f.write_str("leader"),
            ProcessRole::ParallelWorker { number } => write!(f, "parallel worker {number}"),
        }
    }
}
