//! The query executor and its standard lifecycle implementation.
//!
//! Every statement goes through four calls, in this order:
//!
//! 1. [`executor_start`](Executor::executor_start) - set up execution state
//! 2. [`executor_run`](Executor::executor_run) - produce rows (may be called
//!    several times, e.g. by a cursor)
//! 3. [`executor_finish`](Executor::executor_finish) - fire after-triggers
//! 4. [`executor_end`](Executor::executor_end) - release execution state
//!
//! The first three dispatch through the [`ExecutorHooks`] slots: if a slot
//! holds a handler, the handler is called instead of the standard
//! implementation, and it decides whether and how to call the standard
//! implementation itself.
//!
//! # Re-entrancy
//!
//! Plans can execute nested statements while the outer run or finish call is
//! still on the stack. Dispatch therefore clones the handler out of the slot
//! lock before calling it, so handlers are free to re-enter the executor and
//! extensions may even swap slots while a query is executing.

use core::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{RwLock, RwLockWriteGuard};

use crate::error::{ExecResult, ExecutorError};
use crate::hooks::ExecutorHooks;
use crate::query::{ExecFlags, ExecState, PlanStep, QueryDesc, ScanDirection};

/// The query executor of one backend.
pub struct Executor {
    /// Hook slots consulted by the dispatching entry points.
    hooks: RwLock<ExecutorHooks>,
    /// Number of [`execute`](Self::execute) calls currently on the stack.
    depth: AtomicUsize,
    /// Maximum nesting of [`execute`](Self::execute) calls.
    max_stack_depth: usize,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Executor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Executor")
            .field("hooks", &*self.hooks.read())
            .field("depth", &self.depth())
            .field("max_stack_depth", &self.max_stack_depth)
            .finish()
    }
}

impl Executor {
    /// Default maximum nesting of statements.
    pub const DEFAULT_MAX_STACK_DEPTH: usize = 64;

    /// Creates an executor with empty hook slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(ExecutorHooks::new()),
            depth: AtomicUsize::new(0),
            max_stack_depth: Self::DEFAULT_MAX_STACK_DEPTH,
        }
    }

    /// Sets the maximum nesting of statements.
    #[must_use]
    pub fn with_max_stack_depth(mut self, max: usize) -> Self {
        self.max_stack_depth = max;
        self
    }

    /// Returns the maximum nesting of statements.
    #[must_use]
    pub fn max_stack_depth(&self) -> usize {
        self.max_stack_depth
    }

    /// Returns the number of statements currently executing on this executor.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Hook Slots
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns a snapshot of the hook slots.
    #[must_use]
    pub fn hooks(&self) -> ExecutorHooks {
        self.hooks.read().clone()
    }

    /// Locks the hook slots for modification.
    ///
    /// No query can dispatch through the slots while the guard is held, so an
    /// installer can read and overwrite all three slots as one step.
    /// Do not execute queries while holding the guard.
    pub fn hooks_mut(&self) -> RwLockWriteGuard<'_, ExecutorHooks> {
        self.hooks.write()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dispatching Entry Points
    // ─────────────────────────────────────────────────────────────────────────

    /// Starts execution of a query through the start hook slot.
    pub fn executor_start(&self, desc: &mut QueryDesc, eflags: ExecFlags) -> ExecResult {
        let hook = self.hooks.read().start.clone();
        match hook {
            Some(hook) => hook(self, desc, eflags),
            None => self.standard_start(desc, eflags),
        }
    }

    /// Runs a started query through the run hook slot.
    ///
    /// `count` limits the number of rows fetched by this call; `0` means no
    /// limit.
    pub fn executor_run(
        &self,
        desc: &mut QueryDesc,
        direction: ScanDirection,
        count: u64,
        execute_once: bool,
    ) -> ExecResult {
        let hook = self.hooks.read().run.clone();
        match hook {
            Some(hook) => hook(self, desc, direction, count, execute_once),
            None => self.standard_run(desc, direction, count, execute_once),
        }
    }

    /// Finishes a query through the finish hook slot.
    pub fn executor_finish(&self, desc: &mut QueryDesc) -> ExecResult {
        let hook = self.hooks.read().finish.clone();
        match hook {
            Some(hook) => hook(self, desc),
            None => self.standard_finish(desc),
        }
    }

    /// Releases the execution state of a query. Not hookable.
    pub fn executor_end(&self, desc: &mut QueryDesc) {
        tracing::trace!(query_id = %desc.query_id(), "executor end");
        desc.estate = None;
    }

    /// Executes a query through the whole lifecycle and returns the number
    /// of rows processed.
    ///
    /// With [`ExecFlags::EXPLAIN_ONLY`] only the start and end phases run.
    /// On failure the execution state is released before the error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::StackDepthExceeded`] if statements nest deeper
    /// than [`max_stack_depth`](Self::max_stack_depth), or whatever error a
    /// lifecycle call raised.
    pub fn execute(&self, desc: &mut QueryDesc, eflags: ExecFlags) -> Result<u64, ExecutorError> {
        let depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;
        let _depth = DepthGuard(&self.depth);
        if depth > self.max_stack_depth {
            return Err(ExecutorError::StackDepthExceeded {
                depth,
                max: self.max_stack_depth,
            });
        }

        tracing::debug!(
            query_id = %desc.query_id(),
            depth,
            statement = %desc.source_text,
            "executing statement"
        );

        let result = self.executor_start(desc, eflags).and_then(|()| {
            if eflags.contains(ExecFlags::EXPLAIN_ONLY) {
                return Ok(());
            }
            self.executor_run(desc, ScanDirection::Forward, 0, true)?;
            self.executor_finish(desc)
        });

        let processed = desc.processed();
        self.executor_end(desc);
        result.map(|()| processed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Standard Implementations
    // ─────────────────────────────────────────────────────────────────────────

    /// Standard start: creates the execution state.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::AlreadyStarted`] if the query has state.
    pub fn standard_start(&self, desc: &mut QueryDesc, eflags: ExecFlags) -> ExecResult {
        if desc.estate.is_some() {
            return Err(ExecutorError::AlreadyStarted);
        }
        tracing::trace!(query_id = %desc.query_id(), ?eflags, "standard executor start");
        desc.estate = Some(ExecState {
            top_eflags: eflags,
            ..ExecState::default()
        });
        Ok(())
    }

    /// Standard run: walks the plan steps.
    ///
    /// Scans add rows to the processed count until `count` rows have been
    /// fetched by this call. Calls execute their statement through
    /// [`execute`](Self::execute). Raise steps fail the query.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::NotStarted`] if the query has no state, or the
    /// first error raised by a step.
    pub fn standard_run(
        &self,
        desc: &mut QueryDesc,
        direction: ScanDirection,
        count: u64,
        execute_once: bool,
    ) -> ExecResult {
        let QueryDesc {
            planned_stmt,
            estate,
            ..
        } = desc;
        let estate = estate.as_mut().ok_or(ExecutorError::NotStarted)?;

        tracing::trace!(
            query_id = %planned_stmt.query_id,
            ?direction,
            count,
            execute_once,
            "standard executor run"
        );

        if direction == ScanDirection::NoMovement
            || estate.top_eflags.contains(ExecFlags::WITH_NO_DATA)
        {
            return Ok(());
        }

        let mut fetched: u64 = 0;
        for step in &planned_stmt.steps {
            match step {
                PlanStep::Scan { rows } => {
                    let take = if count == 0 {
                        *rows
                    } else {
                        (*rows).min(count - fetched)
                    };
                    fetched = fetched.saturating_add(take);
                    estate.processed = estate.processed.saturating_add(take);
                }
                PlanStep::Call(nested) => {
                    let mut nested_desc =
                        QueryDesc::new(format!("nested statement {}", nested.query_id), nested.clone());
                    self.execute(&mut nested_desc, ExecFlags::empty())?;
                }
                PlanStep::Raise { message } => return Err(ExecutorError::raise(message.clone())),
            }
            if count != 0 && fetched >= count {
                break;
            }
        }
        Ok(())
    }

    /// Standard finish: fires after-triggers unless the query was started
    /// with [`ExecFlags::SKIP_TRIGGERS`], then marks the query finished.
    /// Finishing a finished query does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::NotStarted`] if the query has no state, or the
    /// first error raised by a trigger.
    pub fn standard_finish(&self, desc: &mut QueryDesc) -> ExecResult {
        let QueryDesc {
            planned_stmt,
            estate,
            ..
        } = desc;
        let estate = estate.as_mut().ok_or(ExecutorError::NotStarted)?;
        if estate.finished {
            return Ok(());
        }

        tracing::trace!(query_id = %planned_stmt.query_id, "standard executor finish");

        if !estate.top_eflags.contains(ExecFlags::SKIP_TRIGGERS) {
            for trigger in &planned_stmt.after_triggers {
                let mut trigger_desc =
                    QueryDesc::new(format!("trigger statement {}", trigger.query_id), trigger.clone());
                self.execute(&mut trigger_desc, ExecFlags::empty())?;
            }
        }
        estate.finished = true;
        Ok(())
    }
}

/// Decrements the executor depth when an `execute` call leaves the stack.
struct DepthGuard<'a>(&'a AtomicUsize);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}
