//! Executor hook slots.
//!
//! The executor exposes three extension points, one per lifecycle point. Each
//! slot holds at most one handler. An extension that wants to observe query
//! execution reads the current handler, stores it, and puts its own handler in
//! the slot; its handler is then responsible for calling the stored one (or
//! the standard implementation if the slot was empty).
//!
//! # Example
//!
//! ```
//! use logqueryid_host::executor::Executor;
//! use logqueryid_host::hooks::start_hook;
//!
//! let executor = Executor::new();
//! let previous = executor.hooks().start;
//!
//! executor.hooks_mut().start = Some(start_hook(move |executor, desc, eflags| {
//!     match &previous {
//!         Some(hook) => hook(executor, desc, eflags),
//!         None => executor.standard_start(desc, eflags),
//!     }
//! }));
//! ```

use core::fmt;
use std::sync::Arc;

use crate::error::ExecResult;
use crate::executor::Executor;
use crate::query::{ExecFlags, QueryDesc, ScanDirection};

/// Handler for the start lifecycle point.
pub type ExecutorStartHook =
    Arc<dyn Fn(&Executor, &mut QueryDesc, ExecFlags) -> ExecResult + Send + Sync>;

/// Handler for the run lifecycle point.
///
/// Arguments after the descriptor are the scan direction, the row count
/// (`0` for no limit) and the execute-once flag.
pub type ExecutorRunHook =
    Arc<dyn Fn(&Executor, &mut QueryDesc, ScanDirection, u64, bool) -> ExecResult + Send + Sync>;

/// Handler for the finish lifecycle point.
pub type ExecutorFinishHook = Arc<dyn Fn(&Executor, &mut QueryDesc) -> ExecResult + Send + Sync>;

/// Wraps a closure as an [`ExecutorStartHook`].
pub fn start_hook<F>(hook: F) -> ExecutorStartHook
where
    F: Fn(&Executor, &mut QueryDesc, ExecFlags) -> ExecResult + Send + Sync + 'static,
{
    Arc::new(hook)
}

/// Wraps a closure as an [`ExecutorRunHook`].
pub fn run_hook<F>(hook: F) -> ExecutorRunHook
where
    F: Fn(&Executor, &mut QueryDesc, ScanDirection, u64, bool) -> ExecResult
        + Send
        + Sync
        + 'static,
{
    Arc::new(hook)
}

/// Wraps a closure as an [`ExecutorFinishHook`].
pub fn finish_hook<F>(hook: F) -> ExecutorFinishHook
where
    F: Fn(&Executor, &mut QueryDesc) -> ExecResult + Send + Sync + 'static,
{
    Arc::new(hook)
}

// ─────────────────────────────────────────────────────────────────────────────
// HookPoint
// ─────────────────────────────────────────────────────────────────────────────

/// Names one of the three hookable lifecycle points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Executor start.
    Start,
    /// Executor run.
    Run,
    /// Executor finish.
    Finish,
}

impl HookPoint {
    /// All lifecycle points in invocation order.
    pub const ALL: [HookPoint; 3] = [HookPoint::Start, HookPoint::Run, HookPoint::Finish];

    /// Returns the host's name for the extension point.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            HookPoint::Start => "ExecutorStart",
            HookPoint::Run => "ExecutorRun",
            HookPoint::Finish => "ExecutorFinish",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ExecutorHooks
// ─────────────────────────────────────────────────────────────────────────────

/// The three executor hook slots.
///
/// Cloning copies the handler references, not the handlers, so a clone taken
/// before an extension is loaded can be compared with [`same_as`](Self::same_as)
/// after it is unloaded to check that every slot was restored.
#[derive(Clone, Default)]
pub struct ExecutorHooks {
    /// Start slot.
    pub start: Option<ExecutorStartHook>,
    /// Run slot.
    pub run: Option<ExecutorRunHook>,
    /// Finish slot.
    pub finish: Option<ExecutorFinishHook>,
}

impl ExecutorHooks {
    /// Creates empty slots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the slot for `point` holds a handler.
    #[must_use]
    pub fn is_installed(&self, point: HookPoint) -> bool {
        match point {
            HookPoint::Start => self.start.is_some(),
            HookPoint::Run => self.run.is_some(),
            HookPoint::Finish => self.finish.is_some(),
        }
    }

    /// Returns true if no slot holds a handler.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        HookPoint::ALL.iter().all(|point| !self.is_installed(*point))
    }

    /// Returns true if every slot holds the same handler (by identity) as the
    /// corresponding slot of `other`, or both are empty.
    #[must_use]
    pub fn same_as(&self, other: &ExecutorHooks) -> bool {
        same_slot(&self.start, &other.start)
            && same_slot(&self.run, &other.run)
            && same_slot(&self.finish, &other.finish)
    }
}

fn same_slot<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

impl fmt::Debug for ExecutorHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorHooks")
            .field("start", &self.start.is_some())
            .field("run", &self.run.is_some())
            .field("finish", &self.finish.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slots() {
        let hooks = ExecutorHooks::new();
        assert!(hooks.is_empty());
        for point in HookPoint::ALL {
            assert!(!hooks.is_installed(point));
        }
    }

    #[test]
    fn same_as_compares_identity_not_behavior() {
        let a = start_hook(|executor, desc, eflags| executor.standard_start(desc, eflags));
        let b = start_hook(|executor, desc, eflags| executor.standard_start(desc, eflags));

        let with_a = ExecutorHooks {
            start: Some(Arc::clone(&a)),
            ..ExecutorHooks::default()
        };
        let with_a_again = with_a.clone();
        let with_b = ExecutorHooks {
            start: Some(b),
            ..ExecutorHooks::default()
        };

        assert!(with_a.same_as(&with_a_again));
        assert!(!with_a.same_as(&with_b));
        assert!(!with_a.same_as(&ExecutorHooks::new()));
        assert!(ExecutorHooks::new().same_as(&ExecutorHooks::new()));
    }

    #[test]
    fn hook_point_names() {
        assert_eq!(HookPoint::Start.to_string(), "ExecutorStart");
        assert_eq!(HookPoint::Run.name(), "ExecutorRun");
        assert_eq!(HookPoint::Finish.name(), "ExecutorFinish");
    }

    #[test]
    fn debug_shows_installed_slots() {
        let hooks = ExecutorHooks {
            finish: Some(finish_hook(|executor, desc| executor.standard_finish(desc))),
            ..ExecutorHooks::default()
        };
        assert_eq!(
            format!("{hooks:?}"),
            "ExecutorHooks { start: false, run: false, finish: true }"
        );
    }
}
