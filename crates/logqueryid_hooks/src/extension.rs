//! The `LogQueryId` extension.
//!
//! Loading it probes the host configuration for its collaborators, records
//! the result in fresh state and installs the hook chain; unloading removes
//! the chain. The probe is not repeated on unload, so a configuration change
//! takes effect on the next load.
//!
//! # Example
//!
//! ```
//! use logqueryid_hooks::LogQueryId;
//! use logqueryid_hooks::probe::ProbeReport;
//! use logqueryid_host::backend::Backend;
//! use logqueryid_host::config::ConfigRegistry;
//! use logqueryid_host::query::PlannedStmt;
//!
//! let config = ConfigRegistry::new()
//!     .with("shared_preload_libraries", "pg_stat_statements,auto_explain");
//! let mut backend = Backend::new(config);
//! backend.load_extension(LogQueryId::new()).unwrap();
//!
//! // Logs "queryId=42"
//! backend.execute("select 1", PlannedStmt::new(42).scan(1)).unwrap();
//!
//! let extension = backend.extension::<LogQueryId>().unwrap();
//! assert!(extension.state().is_enabled());
//! assert!(backend.get_resource::<ProbeReport>().is_some());
//! ```

use std::sync::Arc;

use logqueryid_host::backend::Backend;
use logqueryid_host::extension::Extension;
use parking_lot::Mutex;

use crate::LOG_TARGET;
use crate::installer::HookChainInstaller;
use crate::probe::{ProbeReport, probe};
use crate::state::LogQueryIdState;

/// Logs the statement fingerprint at the start of every query.
///
/// # Resources Provided
///
/// | Resource | Description |
/// |----------|-------------|
/// | [`ProbeReport`] | Collaborator detection result (read-only) |
#[derive(Debug)]
pub struct LogQueryId {
    state: Arc<LogQueryIdState>,
    installer: HookChainInstaller,
    report: Mutex<Option<ProbeReport>>,
}

impl Default for LogQueryId {
    fn default() -> Self {
        let state = Arc::new(LogQueryIdState::default());
        Self {
            installer: HookChainInstaller::new(Arc::clone(&state)),
            state,
            report: Mutex::new(None),
        }
    }
}

impl LogQueryId {
    /// Creates an unloaded instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the enablement flag and nesting counter.
    #[must_use]
    pub fn state(&self) -> &Arc<LogQueryIdState> {
        &self.state
    }

    /// Returns the result of the load-time probe, once loaded.
    #[must_use]
    pub fn report(&self) -> Option<ProbeReport> {
        self.report.lock().clone()
    }

    /// Returns true while the hook chain is installed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.installer.is_active()
    }
}

impl Extension for LogQueryId {
    fn init(&self, backend: &mut Backend) {
        tracing::trace!(target: LOG_TARGET, role = %backend.role(), "init entry");

        let report = probe(backend.config());
        self.state.set_enabled(report.enabled);
        *self.report.lock() = Some(report.clone());
        backend.insert_resource(report);

        self.installer.activate(backend);

        tracing::trace!(target: LOG_TARGET, "init exit");
    }

    fn fini(&self, backend: &mut Backend) {
        tracing::trace!(target: LOG_TARGET, role = %backend.role(), "fini entry");
        self.installer.deactivate(backend);
        backend.remove_resource::<ProbeReport>();
        tracing::trace!(target: LOG_TARGET, "fini exit");
    }

    fn name(&self) -> &str {
        "logqueryid"
    }
}
