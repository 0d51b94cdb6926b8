//! Query descriptors handed to the executor and its hooks.
//!
//! A [`QueryDesc`] is owned by the host for the whole lifetime of one
//! statement execution. Hooks receive it by mutable reference because the
//! standard executor stores its execution state on it, but extensions that
//! only observe (such as the queryId logger) treat it as read-only.
//!
//! Plans are scripted: a [`PlannedStmt`] is a list of [`PlanStep`]s that the
//! standard executor walks during the run phase, plus statements fired as
//! after-triggers during the finish phase. `PlanStep::Call` models a function
//! invoked from a query, which executes a whole nested statement through the
//! executor (and therefore through every installed hook) while the outer run
//! call is still on the stack.

use core::fmt;

use bitflags::bitflags;

// ─────────────────────────────────────────────────────────────────────────────
// QueryId
// ─────────────────────────────────────────────────────────────────────────────

/// Statement fingerprint computed by the statement-statistics collaborator.
///
/// Structurally similar statements share a fingerprint. `0` means no
/// fingerprint was computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(pub i64);

impl QueryId {
    /// The fingerprint of a statement nobody computed a fingerprint for.
    pub const UNSET: QueryId = QueryId(0);

    /// Returns the raw integer value.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for QueryId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Executor parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of statement being executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CmdType {
    /// A read-only query.
    #[default]
    Select,
    /// An `INSERT`.
    Insert,
    /// An `UPDATE`.
    Update,
    /// A `DELETE`.
    Delete,
    /// Anything that is not planned DML.
    Utility,
}

/// Direction in which the run phase fetches rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanDirection {
    /// Fetch rows backwards.
    Backward,
    /// Fetch nothing.
    NoMovement,
    /// Fetch rows forwards.
    #[default]
    Forward,
}

bitflags! {
    /// Flags passed to the start phase.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ExecFlags: u32 {
        /// Only set up the plan for `EXPLAIN`; run and finish are skipped.
        const EXPLAIN_ONLY = 0x0001;
        /// The caller may rescan the plan.
        const REWIND = 0x0002;
        /// The caller may fetch backwards.
        const BACKWARD = 0x0004;
        /// The caller may mark and restore positions.
        const MARK = 0x0008;
        /// After-triggers are not fired in the finish phase.
        const SKIP_TRIGGERS = 0x0010;
        /// `WITH NO DATA` was specified; no rows are produced.
        const WITH_NO_DATA = 0x0020;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plans
// ─────────────────────────────────────────────────────────────────────────────

/// One step of a scripted plan, executed during the run phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    /// Produces up to `rows` rows.
    Scan {
        /// Rows available to this scan.
        rows: u64,
    },
    /// Executes a nested statement (e.g. a function body) through the full
    /// executor lifecycle.
    Call(PlannedStmt),
    /// Raises an error.
    Raise {
        /// The error message.
        message: String,
    },
}

/// A planned statement, as produced by the planner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlannedStmt {
    /// Fingerprint of the statement.
    pub query_id: QueryId,
    /// Kind of statement.
    pub command: CmdType,
    /// Steps walked by the run phase.
    pub steps: Vec<PlanStep>,
    /// Statements fired by the finish phase.
    pub after_triggers: Vec<PlannedStmt>,
}

impl PlannedStmt {
    /// Creates an empty `SELECT` with the given fingerprint.
    #[must_use]
    pub fn new(query_id: i64) -> Self {
        Self {
            query_id: QueryId(query_id),
            ..Self::default()
        }
    }

    /// Sets the statement kind.
    #[must_use]
    pub fn with_command(mut self, command: CmdType) -> Self {
        self.command = command;
        self
    }

    /// Appends a scan producing `rows` rows.
    #[must_use]
    pub fn scan(mut self, rows: u64) -> Self {
        self.steps.push(PlanStep::Scan { rows });
        self
    }

    /// Appends a nested statement executed during the run phase.
    #[must_use]
    pub fn call(mut self, nested: PlannedStmt) -> Self {
        self.steps.push(PlanStep::Call(nested));
        self
    }

    /// Appends a step that raises `message`.
    #[must_use]
    pub fn raise(mut self, message: impl Into<String>) -> Self {
        self.steps.push(PlanStep::Raise {
            message: message.into(),
        });
        self
    }

    /// Appends an after-trigger fired during the finish phase.
    #[must_use]
    pub fn after_trigger(mut self, trigger: PlannedStmt) -> Self {
        self.after_triggers.push(trigger);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// QueryDesc
// ─────────────────────────────────────────────────────────────────────────────

/// Per-query execution state created by the start phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecState {
    /// Flags the query was started with.
    pub top_eflags: ExecFlags,
    /// Rows processed so far.
    pub processed: u64,
    /// Whether the finish phase has completed.
    pub finished: bool,
}

/// Everything the executor needs to run one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDesc {
    /// The statement text, for diagnostics.
    pub source_text: String,
    /// The plan to execute.
    pub planned_stmt: PlannedStmt,
    /// Execution state; `None` until the start phase runs and after the end
    /// phase.
    pub estate: Option<ExecState>,
}

impl QueryDesc {
    /// Creates a descriptor for a planned statement.
    #[must_use]
    pub fn new(source_text: impl Into<String>, planned_stmt: PlannedStmt) -> Self {
        Self {
            source_text: source_text.into(),
            planned_stmt,
            estate: None,
        }
    }

    /// Returns the statement fingerprint.
    #[must_use]
    pub fn query_id(&self) -> QueryId {
        self.planned_stmt.query_id
    }

    /// Returns the number of rows processed, or 0 if not started.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.estate.as_ref().map_or(0, |estate| estate.processed)
    }
}
