//! The hooks installed in the executor slots.
//!
//! Each wrapper does its own small job and then hands the call on, exactly
//! once and with the arguments unchanged, to whatever occupied its slot
//! before it was installed, or to the host's standard implementation if the
//! slot was empty.
//!
//! | Point | Own work |
//! |-------|----------|
//! | start | log `queryId=<fingerprint>` when enabled |
//! | run | track nesting depth |
//! | finish | track nesting depth |
//!
//! Delegated results, errors included, are returned unchanged. The nesting
//! level is lowered on every way out of the run and finish wrappers: a
//! normal return, a returned error, or a panic unwinding through them.

use std::sync::Arc;

use logqueryid_host::error::ExecResult;
use logqueryid_host::executor::Executor;
use logqueryid_host::hooks::{
    ExecutorFinishHook, ExecutorHooks, ExecutorRunHook, ExecutorStartHook, HookPoint, finish_hook,
    run_hook, start_hook,
};
use logqueryid_host::query::{ExecFlags, QueryDesc, ScanDirection};

use crate::LOG_TARGET;
use crate::installer::{PrevHook, SavedHooks};
use crate::state::LogQueryIdState;

/// The three wrappers together with the state and previous hooks they use.
pub struct Interceptor {
    state: Arc<LogQueryIdState>,
    prev: SavedHooks,
}

impl Interceptor {
    /// Creates wrappers delegating to `prev`.
    #[must_use]
    pub fn new(state: Arc<LogQueryIdState>, prev: SavedHooks) -> Self {
        Self { state, prev }
    }

    /// Returns the shared state.
    #[must_use]
    pub fn state(&self) -> &Arc<LogQueryIdState> {
        &self.state
    }

    /// Start wrapper: logs the fingerprint when enabled, then delegates.
    ///
    /// # Errors
    ///
    /// Returns the delegate's error unchanged.
    pub fn on_start(&self, executor: &Executor, desc: &mut QueryDesc, eflags: ExecFlags) -> ExecResult {
        tracing::trace!(target: LOG_TARGET, query_id = %desc.query_id(), "start hook entry");

        if self.state.is_enabled() {
            tracing::info!(target: LOG_TARGET, "queryId={}", desc.query_id());
        }

        let result = match &self.prev.start {
            PrevHook::Delegate(hook) => hook(executor, desc, eflags),
            PrevHook::UseDefault => executor.standard_start(desc, eflags),
        };

        tracing::trace!(target: LOG_TARGET, ok = result.is_ok(), "start hook exit");
        result
    }

    /// Run wrapper: delegates with the nesting level raised.
    ///
    /// # Errors
    ///
    /// Returns the delegate's error unchanged.
    pub fn on_run(
        &self,
        executor: &Executor,
        desc: &mut QueryDesc,
        direction: ScanDirection,
        count: u64,
        execute_once: bool,
    ) -> ExecResult {
        tracing::trace!(target: LOG_TARGET, query_id = %desc.query_id(), "run hook entry");
        let nesting = self.state.enter(HookPoint::Run);

        let result = match &self.prev.run {
            PrevHook::Delegate(hook) => hook(executor, desc, direction, count, execute_once),
            PrevHook::UseDefault => executor.standard_run(desc, direction, count, execute_once),
        };

        drop(nesting);
        tracing::trace!(target: LOG_TARGET, ok = result.is_ok(), "run hook exit");
        result
    }

    /// Finish wrapper: delegates with the nesting level raised.
    ///
    /// # Errors
    ///
    /// Returns the delegate's error unchanged.
    pub fn on_finish(&self, executor: &Executor, desc: &mut QueryDesc) -> ExecResult {
        tracing::trace!(target: LOG_TARGET, query_id = %desc.query_id(), "finish hook entry");
        let nesting = self.state.enter(HookPoint::Finish);

        let result = match &self.prev.finish {
            PrevHook::Delegate(hook) => hook(executor, desc),
            PrevHook::UseDefault => executor.standard_finish(desc),
        };

        drop(nesting);
        tracing::trace!(target: LOG_TARGET, ok = result.is_ok(), "finish hook exit");
        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Slot handlers
    // ─────────────────────────────────────────────────────────────────────────

    /// Wraps [`on_start`](Self::on_start) as a slot handler.
    #[must_use]
    pub fn start_hook(self: &Arc<Self>) -> ExecutorStartHook {
        let this = Arc::clone(self);
        start_hook(move |executor, desc, eflags| this.on_start(executor, desc, eflags))
    }

    /// Wraps [`on_run`](Self::on_run) as a slot handler.
    #[must_use]
    pub fn run_hook(self: &Arc<Self>) -> ExecutorRunHook {
        let this = Arc::clone(self);
        run_hook(move |executor, desc, direction, count, execute_once| {
            this.on_run(executor, desc, direction, count, execute_once)
        })
    }

    /// Wraps [`on_finish`](Self::on_finish) as a slot handler.
    #[must_use]
    pub fn finish_hook(self: &Arc<Self>) -> ExecutorFinishHook {
        let this = Arc::clone(self);
        finish_hook(move |executor, desc| this.on_finish(executor, desc))
    }

    /// Returns a full set of slots occupied by these wrappers.
    #[must_use]
    pub fn hooks(self: &Arc<Self>) -> ExecutorHooks {
        ExecutorHooks {
            start: Some(self.start_hook()),
            run: Some(self.run_hook()),
            finish: Some(self.finish_hook()),
        }
    }
}

impl core::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Interceptor")
            .field("state", &self.state)
            .field("prev", &self.prev)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logqueryid_host::error::ExecutorError;
    use logqueryid_host::query::PlannedStmt;

    fn interceptor(enabled: bool, prev: SavedHooks) -> Arc<Interceptor> {
        Arc::new(Interceptor::new(Arc::new(LogQueryIdState::new(enabled)), prev))
    }

    #[test]
    fn default_delegation_runs_standard_executor() {
        let executor = Executor::new();
        let interceptor = interceptor(true, SavedHooks::default());
        *executor.hooks_mut() = interceptor.hooks();

        let mut desc = QueryDesc::new("select", PlannedStmt::new(1).scan(4));
        let rows = executor
            .execute(&mut desc, ExecFlags::empty())
            .expect("execution should succeed");

        assert_eq!(rows, 4);
        assert_eq!(interceptor.state().nesting_level(), 0);
    }

    #[test]
    fn run_error_passes_through_and_restores_level() {
        let executor = Executor::new();
        let interceptor = interceptor(false, SavedHooks::default());
        *executor.hooks_mut() = interceptor.hooks();

        let mut desc = QueryDesc::new("select", PlannedStmt::new(1).raise("out of memory"));
        let err = executor
            .execute(&mut desc, ExecFlags::empty())
            .expect_err("raise should propagate");

        assert_eq!(err, ExecutorError::raise("out of memory"));
        assert_eq!(interceptor.state().nesting_level(), 0);
    }

    #[test]
    fn start_error_from_delegate_is_unchanged() {
        let executor = Executor::new();
        let prev = SavedHooks {
            start: PrevHook::Delegate(start_hook(|_, _, _| Err(ExecutorError::QueryCanceled))),
            ..SavedHooks::default()
        };
        let interceptor = interceptor(true, prev);
        *executor.hooks_mut() = interceptor.hooks();

        let mut desc = QueryDesc::new("select", PlannedStmt::new(1));
        let err = executor
            .execute(&mut desc, ExecFlags::empty())
            .expect_err("start should fail");
        assert_eq!(err, ExecutorError::QueryCanceled);
    }
}
