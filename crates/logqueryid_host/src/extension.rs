//! Extension loading protocol.
//!
//! An extension is a library the host loads into a backend process. Loading
//! calls [`Extension::init`] once; unloading calls [`Extension::fini`] once.
//! Everything an extension does to the backend (installing executor hooks,
//! publishing resources) happens in those two calls.
//!
//! # Example
//!
//! ```
//! use logqueryid_host::backend::Backend;
//! use logqueryid_host::config::ConfigRegistry;
//! use logqueryid_host::extension::Extension;
//!
//! struct Hello;
//!
//! impl Extension for Hello {
//!     fn init(&self, backend: &mut Backend) {
//!         tracing::info!(role = %backend.role(), "hello loaded");
//!     }
//! }
//!
//! let mut backend = Backend::new(ConfigRegistry::new());
//! backend.load_extension(Hello).unwrap();
//! backend.unload_extension::<Hello>().unwrap();
//! ```

use core::any::{Any, TypeId};

use crate::backend::Backend;

// ─────────────────────────────────────────────────────────────────────────────
// ExtensionId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for an extension type.
///
/// Based on [`TypeId`], so each extension type has exactly one
/// `ExtensionId` and can be loaded at most once per backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ExtensionId {
    /// Creates an `ExtensionId` for the given extension type.
    #[must_use]
    pub fn of<E: Extension>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            type_name: core::any::type_name::<E>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extension Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A library loaded into a backend.
///
/// Lifecycle, driven by the [`Backend`]:
///
/// 1. **Load** - `init()` is called once, when the extension is loaded
/// 2. **Unload** - `fini()` is called once, when the extension is unloaded
///    or the backend shuts down (in reverse load order)
///
/// Neither call can fail: an extension that finds its environment unsuitable
/// reports it through the log and stays inert.
pub trait Extension: Any + Send + Sync {
    /// Called once when the extension is loaded.
    fn init(&self, backend: &mut Backend);

    /// Called once when the extension is unloaded.
    fn fini(&self, _backend: &mut Backend) {}

    /// Returns the extension's name for logs and error messages.
    ///
    /// Default implementation returns the type name.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct First;
    impl Extension for First {
        fn init(&self, _backend: &mut Backend) {}
    }

    struct Second;
    impl Extension for Second {
        fn init(&self, _backend: &mut Backend) {}
        fn name(&self) -> &str {
            "second"
        }
    }

    #[test]
    fn ids_differ_per_type() {
        assert_eq!(ExtensionId::of::<First>(), ExtensionId::of::<First>());
        assert_ne!(ExtensionId::of::<First>(), ExtensionId::of::<Second>());
        assert!(ExtensionId::of::<First>().type_name().ends_with("First"));
    }

    #[test]
    fn default_name_is_type_name() {
        assert!(First.name().ends_with("First"));
        assert_eq!(Second.name(), "second");
    }
}
