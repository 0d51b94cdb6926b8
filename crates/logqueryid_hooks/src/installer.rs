//! Installing and removing the hook chain.
//!
//! Hook slots hold one handler each. To observe a lifecycle point without
//! displacing whoever was there first, the installer reads each slot,
//! remembers its occupant, and puts the interceptor in its place; the
//! interceptor then calls the remembered occupant. Removal writes the
//! remembered occupants back, which makes the chain disappear without a
//! trace as long as nobody installed on top of it in the meantime.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use logqueryid_hooks::installer::HookChainInstaller;
//! use logqueryid_hooks::state::LogQueryIdState;
//! use logqueryid_host::backend::Backend;
//! use logqueryid_host::config::ConfigRegistry;
//!
//! let backend = Backend::new(ConfigRegistry::new());
//! let before = backend.executor().hooks();
//!
//! let installer = HookChainInstaller::new(Arc::new(LogQueryIdState::new(true)));
//! assert!(installer.activate(&backend));
//! assert!(!backend.executor().hooks().is_empty());
//!
//! assert!(installer.deactivate(&backend));
//! assert!(backend.executor().hooks().same_as(&before));
//! ```

use std::sync::Arc;

use logqueryid_host::backend::Backend;
use logqueryid_host::hooks::{
    ExecutorFinishHook, ExecutorHooks, ExecutorRunHook, ExecutorStartHook,
};
use parking_lot::Mutex;

use crate::LOG_TARGET;
use crate::guard::leader_only;
use crate::interceptor::Interceptor;
use crate::state::LogQueryIdState;

// ─────────────────────────────────────────────────────────────────────────────
// PrevHook
// ─────────────────────────────────────────────────────────────────────────────

/// What a slot held before the interceptor took it.
#[derive(Clone)]
pub enum PrevHook<H> {
    /// Another extension's handler, to be called by the interceptor.
    Delegate(H),
    /// Nothing; the interceptor calls the standard implementation.
    UseDefault,
}

impl<H> Default for PrevHook<H> {
    fn default() -> Self {
        PrevHook::UseDefault
    }
}

impl<H> PrevHook<H> {
    /// Captures a slot's occupant.
    pub fn from_slot(slot: Option<H>) -> Self {
        slot.map_or(PrevHook::UseDefault, PrevHook::Delegate)
    }

    /// Converts back into a slot value.
    pub fn into_slot(self) -> Option<H> {
        match self {
            PrevHook::Delegate(hook) => Some(hook),
            PrevHook::UseDefault => None,
        }
    }

    /// Returns true if the slot was empty.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, PrevHook::UseDefault)
    }
}

impl<H> core::fmt::Debug for PrevHook<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PrevHook::Delegate(_) => f.write_str("Delegate"),
            PrevHook::UseDefault => f.write_str("UseDefault"),
        }
    }
}

/// Previous occupants of all three slots.
#[derive(Debug, Clone, Default)]
pub struct SavedHooks {
    /// Start slot.
    pub start: PrevHook<ExecutorStartHook>,
    /// Run slot.
    pub run: PrevHook<ExecutorRunHook>,
    /// Finish slot.
    pub finish: PrevHook<ExecutorFinishHook>,
}

impl SavedHooks {
    /// Captures the occupants of `hooks`.
    #[must_use]
    pub fn capture(hooks: &ExecutorHooks) -> Self {
        Self {
            start: PrevHook::from_slot(hooks.start.clone()),
            run: PrevHook::from_slot(hooks.run.clone()),
            finish: PrevHook::from_slot(hooks.finish.clone()),
        }
    }

    /// Converts back into slot values.
    #[must_use]
    pub fn into_hooks(self) -> ExecutorHooks {
        ExecutorHooks {
            start: self.start.into_slot(),
            run: self.run.into_slot(),
            finish: self.finish.into_slot(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookChainInstaller
// ─────────────────────────────────────────────────────────────────────────────

/// Puts the interceptor into a backend's hook slots and takes it out again.
///
/// Both operations are skipped in parallel workers.
#[derive(Debug)]
pub struct HookChainInstaller {
    state: Arc<LogQueryIdState>,
    saved: Mutex<Option<SavedHooks>>,
}

impl HookChainInstaller {
    /// Creates an installer whose interceptor uses `state`.
    #[must_use]
    pub fn new(state: Arc<LogQueryIdState>) -> Self {
        Self {
            state,
            saved: Mutex::new(None),
        }
    }

    /// Returns true while the interceptor occupies the slots.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.saved.lock().is_some()
    }

    /// Saves the current slot occupants and installs the interceptor.
    ///
    /// All three slots are read and overwritten under one write lock.
    /// Returns false, leaving the slots alone, in a parallel worker or when
    /// already active.
    pub fn activate(&self, backend: &Backend) -> bool {
        if !leader_only(backend.role(), "activate") {
            return false;
        }

        let mut saved = self.saved.lock();
        if saved.is_some() {
            tracing::trace!(target: LOG_TARGET, "hook chain already active");
            return false;
        }

        let mut slots = backend.executor().hooks_mut();
        let previous = SavedHooks::capture(&slots);
        tracing::debug!(target: LOG_TARGET, previous = ?previous, "installing hook chain");

        let interceptor = Arc::new(Interceptor::new(Arc::clone(&self.state), previous.clone()));
        *slots = interceptor.hooks();
        *saved = Some(previous);
        true
    }

    /// Writes the saved occupants back into the slots.
    ///
    /// Returns false, leaving the slots alone, in a parallel worker or when
    /// not active.
    pub fn deactivate(&self, backend: &Backend) -> bool {
        if !leader_only(backend.role(), "deactivate") {
            return false;
        }

        let Some(previous) = self.saved.lock().take() else {
            tracing::trace!(target: LOG_TARGET, "hook chain not active");
            return false;
        };

        tracing::debug!(target: LOG_TARGET, restored = ?previous, "removing hook chain");
        *backend.executor().hooks_mut() = previous.into_hooks();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logqueryid_host::config::ConfigRegistry;
    use logqueryid_host::hooks::run_hook;

    fn installer() -> HookChainInstaller {
        HookChainInstaller::new(Arc::new(LogQueryIdState::new(true)))
    }

    #[test]
    fn empty_slots_are_saved_as_default() {
        let saved = SavedHooks::capture(&ExecutorHooks::new());
        assert!(saved.start.is_default());
        assert!(saved.run.is_default());
        assert!(saved.finish.is_default());
        assert!(saved.into_hooks().is_empty());
    }

    #[test]
    fn occupied_slot_is_saved_as_delegate() {
        let run = run_hook(|executor, desc, direction, count, once| {
            executor.standard_run(desc, direction, count, once)
        });
        let hooks = ExecutorHooks {
            run: Some(Arc::clone(&run)),
            ..ExecutorHooks::default()
        };
        let saved = SavedHooks::capture(&hooks);
        assert!(matches!(&saved.run, PrevHook::Delegate(hook) if Arc::ptr_eq(hook, &run)));
        assert!(saved.into_hooks().same_as(&hooks));
    }

    #[test]
    fn activate_fills_every_slot() {
        let backend = Backend::new(ConfigRegistry::new());
        let installer = installer();
        assert!(installer.activate(&backend));
        assert!(installer.is_active());

        let hooks = backend.executor().hooks();
        assert!(hooks.start.is_some() && hooks.run.is_some() && hooks.finish.is_some());
    }

    #[test]
    fn second_activate_keeps_first_chain() {
        let backend = Backend::new(ConfigRegistry::new());
        let installer = installer();
        assert!(installer.activate(&backend));
        let installed = backend.executor().hooks();

        assert!(!installer.activate(&backend));
        assert!(backend.executor().hooks().same_as(&installed));
    }

    #[test]
    fn deactivate_without_activate_is_noop() {
        let backend = Backend::new(ConfigRegistry::new());
        let installer = installer();
        assert!(!installer.deactivate(&backend));
        assert!(backend.executor().hooks().is_empty());
    }

    #[test]
    fn worker_slots_are_untouched() {
        let backend = Backend::parallel_worker(1, ConfigRegistry::new());
        let installer = installer();
        assert!(!installer.activate(&backend));
        assert!(!installer.is_active());
        assert!(backend.executor().hooks().is_empty());
        assert!(!installer.deactivate(&backend));
    }
}
