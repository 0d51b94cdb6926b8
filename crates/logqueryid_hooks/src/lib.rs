//! QueryId logging through a chain of executor hooks (Layer 2).
//!
//! Log lines from the plan explainer and rows in the statement-statistics
//! view describe the same statements but share no key. [`LogQueryId`] closes
//! that gap: it writes `queryId=<fingerprint>` to the server log at the start
//! of every query, so a logged plan can be matched to its statistics row.
//!
//! # Modules
//!
//! - [`probe`] - Detects the two collaborators in the host configuration
//! - [`installer`] - Saves the previous hooks and installs the chain
//! - [`interceptor`] - The start, run and finish wrappers
//! - [`guard`] - Keeps the installer out of parallel workers
//! - [`state`] - Enablement flag and nesting counter
//! - [`extension`] - The loadable extension tying them together
//!
//! # Logging
//!
//! Every event is emitted with the `logqueryid` target:
//!
//! | Level | Event |
//! |-------|-------|
//! | `INFO` | `queryId=<fingerprint>`, probe results |
//! | `WARN` | a collaborator is not preloaded |
//! | `ERROR` | the nesting counter dropped below zero |
//! | `TRACE` | hook entry and exit, nesting changes |
//!
//! # Example
//!
//! ```
//! use logqueryid_hooks::prelude::*;
//! use logqueryid_host::prelude::*;
//!
//! let config = ConfigRegistry::new()
//!     .with("shared_preload_libraries", "pg_stat_statements,auto_explain");
//! let mut backend = Backend::new(config);
//! let before = backend.executor().hooks();
//!
//! backend.load_extension(LogQueryId::new()).unwrap();
//! let rows = backend
//!     .execute("select f()", PlannedStmt::new(1).call(PlannedStmt::new(2).scan(5)))
//!     .unwrap();
//! assert_eq!(rows, 0);
//!
//! backend.shutdown();
//! assert!(backend.executor().hooks().same_as(&before));
//! ```

/// Target of every event this crate emits.
pub const LOG_TARGET: &str = "logqueryid";

pub mod extension;
pub mod guard;
pub mod installer;
pub mod interceptor;
pub mod probe;
pub mod state;

pub use extension::LogQueryId;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::LOG_TARGET;
    pub use crate::extension::LogQueryId;
    pub use crate::guard::is_leader;
    pub use crate::installer::{HookChainInstaller, PrevHook, SavedHooks};
    pub use crate::interceptor::Interceptor;
    pub use crate::probe::{ProbeReport, probe};
    pub use crate::state::{LogQueryIdState, NestingGuard};
}
