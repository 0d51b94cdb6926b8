//! Shared state of one loaded `LogQueryId` instance.

use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use logqueryid_host::hooks::HookPoint;

use crate::LOG_TARGET;

/// Enablement flag and nesting counter, shared by the installer and the
/// interceptor hooks.
///
/// Execution within one process is single-threaded, so relaxed ordering is
/// enough; the atomics only make the state shareable with `Send + Sync`
/// hooks.
#[derive(Debug, Default)]
pub struct LogQueryIdState {
    enabled: AtomicBool,
    nesting_level: AtomicI32,
}

impl LogQueryIdState {
    /// Creates state with the given enablement and a zero nesting level.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            nesting_level: AtomicI32::new(0),
        }
    }

    /// Returns true if queryId lines are emitted.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Sets the enablement flag.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Returns the number of run and finish hook calls currently on the
    /// stack.
    #[must_use]
    pub fn nesting_level(&self) -> i32 {
        self.nesting_level.load(Ordering::Relaxed)
    }

    /// Raises the nesting level for the duration of the returned guard.
    pub fn enter(&self, point: HookPoint) -> NestingGuard<'_> {
        let level = self.nesting_level.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(target: LOG_TARGET, %point, nesting_level = level, "nesting level raised");
        NestingGuard { state: self, point }
    }
}

/// Lowers the nesting level when dropped, on return, error or unwind alike.
#[must_use = "the nesting level drops back as soon as the guard is dropped"]
pub struct NestingGuard<'a> {
    state: &'a LogQueryIdState,
    point: HookPoint,
}

impl Drop for NestingGuard<'_> {
    fn drop(&mut self) {
        let level = self.state.nesting_level.fetch_sub(1, Ordering::Relaxed) - 1;
        if level < 0 {
            tracing::error!(
                target: LOG_TARGET,
                point = %self.point,
                nesting_level = level,
                "nesting level dropped below zero"
            );
        } else {
            tracing::trace!(
                target: LOG_TARGET,
                point = %self.point,
                nesting_level = level,
                "nesting level lowered"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_restores_level() {
        let state = LogQueryIdState::new(true);
        {
            let _outer = state.enter(HookPoint::Run);
            assert_eq!(state.nesting_level(), 1);
            {
                let _inner = state.enter(HookPoint::Finish);
                assert_eq!(state.nesting_level(), 2);
            }
            assert_eq!(state.nesting_level(), 1);
        }
        assert_eq!(state.nesting_level(), 0);
    }

    #[test]
    fn guard_restores_level_on_unwind() {
        let state = LogQueryIdState::new(false);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = state.enter(HookPoint::Run);
            panic!("delegate failed");
        }));
        assert!(result.is_err());
        assert_eq!(state.nesting_level(), 0);
    }

    #[test]
    fn enablement_flag() {
        let state = LogQueryIdState::default();
        assert!(!state.is_enabled());
        state.set_enabled(true);
        assert!(state.is_enabled());
    }
}
