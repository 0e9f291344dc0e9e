//! The shared registry of live resources, keyed by name. It is the single
//! source of truth for which object currently answers to a name; the deferred
//! machinery checks materialized resources against it for identity.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::Resource;

/// A name-keyed table of live resources.
#[derive(Default)]
pub struct Registry {
    items: RwLock<HashMap<String, Arc<Resource>>>,
}

impl Registry {
    /// Creates a new and empty `Registry`.
    pub fn new() -> Self {
        Registry {
            items: RwLock::new(HashMap::new()),
        }
    }

    /// Gets the resource registered under `name`.
    #[inline]
    pub fn get<T: AsRef<str>>(&self, name: T) -> Option<Arc<Resource>> {
        self.items.read().unwrap().get(name.as_ref()).cloned()
    }

    /// Checks if a resource is registered under `name`.
    #[inline]
    pub fn contains<T: AsRef<str>>(&self, name: T) -> bool {
        self.items.read().unwrap().contains_key(name.as_ref())
    }

    /// Registers a resource under its own name, returning whatever it
    /// displaced.
    pub fn insert(&self, resource: Arc<Resource>) -> Option<Arc<Resource>> {
        self.items
            .write()
            .unwrap()
            .insert(resource.name().to_string(), resource)
    }

    /// Removes the resource registered under `name`.
    pub fn remove<T: AsRef<str>>(&self, name: T) -> Option<Arc<Resource>> {
        self.items.write().unwrap().remove(name.as_ref())
    }

    /// Gets the number of registered resources.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
