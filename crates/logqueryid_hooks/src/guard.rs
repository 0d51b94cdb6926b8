//! Parallel-worker guard.
//!
//! Hook slots are per process. A parallel worker loads the same preloaded
//! extensions as its leader, but the chain is only installed and removed in
//! the leader; workers keep whatever hooks they started with.

use logqueryid_host::process::ProcessRole;

use crate::LOG_TARGET;

/// Returns true if `role` is the process that received the query.
#[must_use]
pub fn is_leader(role: ProcessRole) -> bool {
    !role.is_parallel_worker()
}

/// Returns true if `action` may touch the hook slots of a process with
/// `role`; otherwise logs that it is skipped.
pub(crate) fn leader_only(role: ProcessRole, action: &str) -> bool {
    if is_leader(role) {
        return true;
    }
    tracing::trace!(target: LOG_TARGET, %role, "{action} skipped in parallel worker");
    false
}
