//! # logqueryid Internal Library
//!
//! Re-exports the logqueryid crates for convenience.

/// Layer 1: Host runtime model.
pub use logqueryid_host;

/// Layer 2: QueryId logging hook chain.
pub use logqueryid_hooks;

/// Infrastructure extensions.
pub use logqueryid_core_plugins;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use logqueryid_core_plugins::{LogFormat, LogSinkConfig, LogSinkExtension, Severity};
    pub use logqueryid_hooks::prelude::*;
    pub use logqueryid_host::prelude::*;
}
