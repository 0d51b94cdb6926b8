//! Backend-lifetime resources.
//!
//! Extensions publish read-mostly values (their effective configuration, a
//! probe report) as resources on the [`Backend`](crate::backend::Backend) so
//! other extensions and tests can look them up by type.
//!
//! # Example
//!
//! ```
//! use logqueryid_host::resource::{Resource, Resources};
//!
//! struct SinkConfig { json: bool }
//! impl Resource for SinkConfig {}
//!
//! let mut resources = Resources::new();
//! resources.insert(SinkConfig { json: true });
//! assert!(resources.get::<SinkConfig>().is_some_and(|config| config.json));
//! ```

use core::any::{Any, TypeId};

use hashbrown::HashMap;

/// Marker for types that can be stored in [`Resources`].
pub trait Resource: Send + Sync + 'static {}

/// Type-keyed resource storage. One value per type.
#[derive(Default)]
pub struct Resources {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Resources {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a resource, returning the one it replaced.
    pub fn insert<R: Resource>(&mut self, resource: R) -> Option<R> {
        self.values
            .insert(TypeId::of::<R>(), Box::new(resource))
            .and_then(|old| old.downcast::<R>().ok())
            .map(|old| *old)
    }

    /// Returns the resource of type `R`, if present.
    #[must_use]
    pub fn get<R: Resource>(&self) -> Option<&R> {
        self.values
            .get(&TypeId::of::<R>())
            .and_then(|boxed| boxed.downcast_ref::<R>())
    }

    /// Returns true if a resource of type `R` is present.
    #[must_use]
    pub fn contains<R: Resource>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<R>())
    }

    /// Removes and returns the resource of type `R`.
    pub fn remove<R: Resource>(&mut self) -> Option<R> {
        self.values
            .remove(&TypeId::of::<R>())
            .and_then(|old| old.downcast::<R>().ok())
            .map(|old| *old)
    }

    /// Returns the number of stored resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl core::fmt::Debug for Resources {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Resources")
            .field("len", &self.values.len())
            .finish()
    }
}
