//! Log the statement fingerprint (queryId) of every query a database backend
//! executes, so slow-query plans in the server log can be joined with
//! statement statistics.
//!
//! # Example
//!
//! ```
//! use logqueryid::prelude::*;
//!
//! let config = ConfigRegistry::new()
//!     .with("shared_preload_libraries", "pg_stat_statements,auto_explain");
//!
//! let mut backend = Backend::new(config);
//! backend.load_extension(LogQueryId::new()).unwrap();
//!
//! // Logs "queryId=123456789" at INFO with target "logqueryid".
//! backend
//!     .execute("select * from accounts", PlannedStmt::new(123_456_789).scan(1))
//!     .unwrap();
//!
//! backend.shutdown();
//! ```

pub use logqueryid_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use logqueryid_internal::prelude::*;
}
