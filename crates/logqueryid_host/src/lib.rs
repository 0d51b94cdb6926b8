//! Host runtime model for logqueryid (Layer 1).
//!
//! `logqueryid_host` models the parts of a database host process that a
//! diagnostic extension interacts with:
//!
//! - [`backend`] - A host process: configuration, executor, extensions
//! - [`config`] - Configuration registry and value parsing
//! - [`executor`] - Four-phase query executor with replaceable hook slots
//! - [`extension`] - Extension trait loaded into a backend
//! - [`hooks`] - Hook function types and the hook slot table
//! - [`process`] - Leader and parallel worker roles
//! - [`query`] - Query descriptors and scripted plans
//! - [`resource`] - Type-keyed backend resources
//! - [`error`] - Error types
//!
//! # Architecture
//!
//! - **Layer 1** (`logqueryid_host`): the host model (this crate)
//! - **Layer 2** (`logqueryid_hooks`): the queryId logging hook chain
//! - **Layer 3** (`logqueryid_core_plugins`): log sink and other
//!   infrastructure extensions
//!
//! # Example
//!
//! ```
//! use logqueryid_host::prelude::*;
//!
//! let backend = Backend::new(ConfigRegistry::new());
//! backend.executor().hooks_mut().start = Some(start_hook(|executor, desc, eflags| {
//!     tracing::info!(query_id = %desc.query_id(), "starting");
//!     executor.standard_start(desc, eflags)
//! }));
//!
//! let rows = backend
//!     .execute("select 1", PlannedStmt::new(42).scan(1))
//!     .unwrap();
//! assert_eq!(rows, 1);
//! ```

/// Backend process model.
pub mod backend;

/// Configuration registry and value parsing.
pub mod config;

/// Error types.
pub mod error;

/// Query executor with replaceable hook slots.
pub mod executor;

/// Extension loading protocol.
pub mod extension;

/// Executor hook types.
pub mod hooks;

/// Process roles.
pub mod process;

/// Query descriptors.
pub mod query;

/// Backend-lifetime resources.
pub mod resource;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::backend::*;
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::executor::*;
    pub use crate::extension::*;
    pub use crate::hooks::*;
    pub use crate::process::*;
    pub use crate::query::*;
    pub use crate::resource::*;
}
