//! Backend process model.
//!
//! A [`Backend`] is one host process: it owns the configuration it was
//! started with, an [`Executor`] whose hook slots extensions may occupy, a
//! resource store, and the extensions loaded into it.
//!
//! # Lifecycle
//!
//! 1. **Start** - [`Backend::new`] (leader) or
//!    [`Backend::spawn_parallel_worker`] (worker of an existing leader)
//! 2. **Load** - [`Backend::load_extension`] calls `Extension::init`
//! 3. **Execute** - [`Backend::execute`] runs statements through the hooks
//! 4. **Unload** - [`Backend::unload_extension`] or [`Backend::shutdown`]
//!    calls `Extension::fini`, the latter in reverse load order
//!
//! # Example
//!
//! ```
//! use logqueryid_host::backend::Backend;
//! use logqueryid_host::config::ConfigRegistry;
//! use logqueryid_host::query::PlannedStmt;
//!
//! let mut backend = Backend::new(ConfigRegistry::new());
//! let rows = backend
//!     .execute("select * from t", PlannedStmt::new(1).scan(3))
//!     .unwrap();
//! assert_eq!(rows, 3);
//! backend.shutdown();
//! ```

use std::sync::Arc;

use core::any::Any;

use crate::config::ConfigRegistry;
use crate::error::{ExecutorError, ExtensionError};
use crate::executor::Executor;
use crate::extension::{Extension, ExtensionId};
use crate::process::ProcessRole;
use crate::query::{ExecFlags, PlannedStmt, QueryDesc};
use crate::resource::{Resource, Resources};

// ─────────────────────────────────────────────────────────────────────────────
// Backend
// ─────────────────────────────────────────────────────────────────────────────

/// A loaded extension and its identity.
struct ExtensionEntry {
    id: ExtensionId,
    name: String,
    extension: Arc<dyn Extension>,
}

/// One host process.
pub struct Backend {
    role: ProcessRole,
    config: ConfigRegistry,
    executor: Executor,
    resources: Resources,
    /// Loaded extensions, in load order.
    extensions: Vec<ExtensionEntry>,
}

impl Backend {
    /// Starts a leader backend with the given configuration.
    #[must_use]
    pub fn new(config: ConfigRegistry) -> Self {
        Self::boot(ProcessRole::Leader, config, Executor::new())
    }

    /// Starts a parallel worker backend directly.
    ///
    /// Prefer [`spawn_parallel_worker`](Self::spawn_parallel_worker) when a
    /// leader is at hand.
    #[must_use]
    pub fn parallel_worker(number: u32, config: ConfigRegistry) -> Self {
        Self::boot(
            ProcessRole::ParallelWorker { number },
            config,
            Executor::new(),
        )
    }

    fn boot(role: ProcessRole, config: ConfigRegistry, executor: Executor) -> Self {
        tracing::debug!(%role, settings = config.len(), "backend started");
        Self {
            role,
            config,
            executor,
            resources: Resources::new(),
            extensions: Vec::new(),
        }
    }

    /// Sets the executor's maximum statement nesting depth.
    #[must_use]
    pub fn with_max_stack_depth(mut self, max: usize) -> Self {
        self.executor = self.executor.with_max_stack_depth(max);
        self
    }

    /// Starts a parallel worker for this backend.
    ///
    /// The worker is a separate process: it inherits a copy of the leader's
    /// configuration and executor limits, but starts with empty hook slots,
    /// no resources and no extensions. Extensions the worker needs must be
    /// loaded into it, as the host does for preloaded libraries.
    #[must_use]
    pub fn spawn_parallel_worker(&self, number: u32) -> Backend {
        Self::boot(
            ProcessRole::ParallelWorker { number },
            self.config.clone(),
            Executor::new().with_max_stack_depth(self.executor.max_stack_depth()),
        )
    }

    /// Returns this process's role.
    #[must_use]
    pub fn role(&self) -> ProcessRole {
        self.role
    }

    /// Returns true if this process is a parallel worker.
    #[must_use]
    pub fn is_parallel_worker(&self) -> bool {
        self.role.is_parallel_worker()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ConfigRegistry {
        &self.config
    }

    /// Returns the configuration for modification.
    pub fn config_mut(&mut self) -> &mut ConfigRegistry {
        &mut self.config
    }

    /// Returns the executor.
    #[must_use]
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Extensions
    // ─────────────────────────────────────────────────────────────────────────

    /// Loads an extension and calls its `init`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionError::AlreadyLoaded`] if an extension of the same
    /// type is loaded. `init` is not called in that case.
    pub fn load_extension<E: Extension>(&mut self, extension: E) -> Result<(), ExtensionError> {
        let id = ExtensionId::of::<E>();
        let name = extension.name().to_owned();
        if self.has_extension_id(id) {
            return Err(ExtensionError::AlreadyLoaded(name));
        }

        tracing::debug!(extension = %name, role = %self.role, "loading extension");
        let extension: Arc<dyn Extension> = Arc::new(extension);
        extension.init(self);
        self.extensions.push(ExtensionEntry {
            id,
            name,
            extension,
        });
        Ok(())
    }

    /// Calls the extension's `fini` and unloads it.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionError::NotLoaded`] if no extension of type `E` is
    /// loaded.
    pub fn unload_extension<E: Extension>(&mut self) -> Result<(), ExtensionError> {
        let id = ExtensionId::of::<E>();
        let index = self
            .extensions
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| ExtensionError::NotLoaded(id.type_name().to_owned()))?;

        let entry = self.extensions.remove(index);
        self.finalize(&entry);
        Ok(())
    }

    /// Returns true if an extension of type `E` is loaded.
    #[must_use]
    pub fn has_extension<E: Extension>(&self) -> bool {
        self.has_extension_id(ExtensionId::of::<E>())
    }

    fn has_extension_id(&self, id: ExtensionId) -> bool {
        self.extensions.iter().any(|entry| entry.id == id)
    }

    /// Returns the loaded extension of type `E`.
    #[must_use]
    pub fn extension<E: Extension>(&self) -> Option<&E> {
        let id = ExtensionId::of::<E>();
        self.extensions
            .iter()
            .find(|entry| entry.id == id)
            .and_then(|entry| {
                let any: &dyn Any = &*entry.extension;
                any.downcast_ref::<E>()
            })
    }

    /// Returns the names of loaded extensions, in load order.
    pub fn extension_names(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(|entry| entry.name.as_str())
    }

    /// Unloads every extension in reverse load order.
    pub fn shutdown(&mut self) {
        while let Some(entry) = self.extensions.pop() {
            self.finalize(&entry);
        }
        tracing::debug!(role = %self.role, "backend shut down");
    }

    fn finalize(&mut self, entry: &ExtensionEntry) {
        tracing::debug!(extension = %entry.name, role = %self.role, "unloading extension");
        entry.extension.fini(self);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a resource, replacing any previous value of the same type.
    pub fn insert_resource<R: Resource>(&mut self, resource: R) -> Option<R> {
        self.resources.insert(resource)
    }

    /// Returns the resource of type `R`.
    #[must_use]
    pub fn get_resource<R: Resource>(&self) -> Option<&R> {
        self.resources.get()
    }

    /// Returns true if a resource of type `R` is present.
    #[must_use]
    pub fn contains_resource<R: Resource>(&self) -> bool {
        self.resources.contains::<R>()
    }

    /// Removes the resource of type `R`.
    pub fn remove_resource<R: Resource>(&mut self) -> Option<R> {
        self.resources.remove()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Execution
    // ─────────────────────────────────────────────────────────────────────────

    /// Executes a top-level statement and returns the number of rows
    /// processed.
    ///
    /// # Errors
    ///
    /// Returns the error raised by the executor or any hook.
    pub fn execute(
        &self,
        source_text: impl Into<String>,
        stmt: PlannedStmt,
    ) -> Result<u64, ExecutorError> {
        self.execute_with_flags(source_text, stmt, ExecFlags::empty())
    }

    /// Executes a top-level statement with explicit start flags.
    ///
    /// # Errors
    ///
    /// Returns the error raised by the executor or any hook.
    pub fn execute_with_flags(
        &self,
        source_text: impl Into<String>,
        stmt: PlannedStmt,
        eflags: ExecFlags,
    ) -> Result<u64, ExecutorError> {
        let mut desc = QueryDesc::new(source_text, stmt);
        self.executor.execute(&mut desc, eflags)
    }
}

impl core::fmt::Debug for Backend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Backend")
            .field("role", &self.role)
            .field(
                "extensions",
                &self.extensions.iter().map(|e| &e.name).collect::<Vec<_>>(),
            )
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
        label: &'static str,
    }

    impl Extension for Recorder {
        fn init(&self, _backend: &mut Backend) {
            self.events.lock().push(format!("init {}", self.label));
        }
        fn fini(&self, _backend: &mut Backend) {
            self.events.lock().push(format!("fini {}", self.label));
        }
    }

    struct Other(Arc<Mutex<Vec<String>>>);

    impl Extension for Other {
        fn init(&self, _backend: &mut Backend) {
            self.0.lock().push("init other".to_owned());
        }
        fn fini(&self, _backend: &mut Backend) {
            self.0.lock().push("fini other".to_owned());
        }
    }

    #[test]
    fn load_twice_is_rejected_without_init() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut backend = Backend::new(ConfigRegistry::new());
        backend
            .load_extension(Recorder {
                events: Arc::clone(&events),
                label: "a",
            })
            .expect("first load should succeed");

        let err = backend
            .load_extension(Recorder {
                events: Arc::clone(&events),
                label: "b",
            })
            .expect_err("second load should fail");
        assert!(matches!(err, ExtensionError::AlreadyLoaded(_)));
        assert_eq!(*events.lock(), vec!["init a"]);
    }

    #[test]
    fn unload_missing_is_rejected() {
        let mut backend = Backend::new(ConfigRegistry::new());
        let err = backend
            .unload_extension::<Recorder>()
            .expect_err("unload should fail");
        assert!(matches!(err, ExtensionError::NotLoaded(_)));
    }

    #[test]
    fn shutdown_finalizes_in_reverse_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut backend = Backend::new(ConfigRegistry::new());
        backend
            .load_extension(Recorder {
                events: Arc::clone(&events),
                label: "a",
            })
            .expect("load should succeed");
        backend
            .load_extension(Other(Arc::clone(&events)))
            .expect("load should succeed");

        backend.shutdown();
        assert_eq!(
            *events.lock(),
            vec!["init a", "init other", "fini other", "fini a"]
        );
        assert!(!backend.has_extension::<Recorder>());
    }

    #[test]
    fn extension_lookup_downcasts() {
        let mut backend = Backend::new(ConfigRegistry::new());
        backend
            .load_extension(Recorder {
                label: "lookup",
                ..Recorder::default()
            })
            .expect("load should succeed");

        let found = backend.extension::<Recorder>().expect("should be loaded");
        assert_eq!(found.label, "lookup");
        assert!(backend.extension::<Other>().is_none());
    }

    #[test]
    fn worker_inherits_config_but_not_extensions() {
        let mut leader = Backend::new(ConfigRegistry::new().with("work_mem", "4MB"))
            .with_max_stack_depth(8);
        leader
            .load_extension(Recorder::default())
            .expect("load should succeed");

        let worker = leader.spawn_parallel_worker(1);
        assert!(worker.is_parallel_worker());
        assert_eq!(worker.role(), ProcessRole::ParallelWorker { number: 1 });
        assert_eq!(worker.config().get_config_option("work_mem"), Some("4MB"));
        assert_eq!(worker.executor().max_stack_depth(), 8);
        assert!(!worker.has_extension::<Recorder>());
        assert!(worker.executor().hooks().is_empty());
    }
}
