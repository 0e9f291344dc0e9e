//! Resolution metadata attached to every resource.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use parking_lot::ReentrantMutex;

use super::loader::Loader;
use super::registry::Registry;
use super::{Attr, Tag};

/// Immutable-after-resolution metadata produced by a resolver: the resource
/// name, the location it was resolved to, and the loader that materializes
/// it.
///
/// A resource holds at most one descriptor at a time, and the descriptor
/// object is never replaced wholesale between the deferred and materialized
/// forms; only the loader and loader-state slots update in place.
pub struct Descriptor {
    name: String,
    location: Option<String>,
    loader: RwLock<Arc<dyn Loader>>,
    state: Mutex<Option<Arc<LoaderState>>>,
}

impl Descriptor {
    /// Creates a descriptor without a resolved location.
    pub fn new<T: Into<String>>(name: T, loader: Arc<dyn Loader>) -> Self {
        Descriptor {
            name: name.into(),
            location: None,
            loader: RwLock::new(loader),
            state: Mutex::new(None),
        }
    }

    /// Creates a descriptor with a resolved location.
    pub fn with_location<T1, T2>(name: T1, location: T2, loader: Arc<dyn Loader>) -> Self
    where
        T1: Into<String>,
        T2: Into<String>,
    {
        Descriptor {
            name: name.into(),
            location: Some(location.into()),
            loader: RwLock::new(loader),
            state: Mutex::new(None),
        }
    }

    /// Gets the resource name this descriptor describes.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the resolved location, if the resolver produced one.
    #[inline]
    pub fn location(&self) -> Option<&str> {
        self.location.as_ref().map(|v| v.as_str())
    }

    /// Gets the loader that materializes the described resource.
    #[inline]
    pub fn loader(&self) -> Arc<dyn Loader> {
        self.loader.read().unwrap().clone()
    }

    /// Replaces the loader in place.
    pub fn set_loader(&self, loader: Arc<dyn Loader>) {
        *self.loader.write().unwrap() = loader;
    }

    pub(crate) fn loader_state(&self) -> Option<Arc<LoaderState>> {
        self.state.lock().unwrap().clone()
    }

    pub(crate) fn set_loader_state(&self, state: LoaderState) {
        *self.state.lock().unwrap() = Some(Arc::new(state));
    }

    pub(crate) fn clear_loader_state(&self) {
        self.state.lock().unwrap().take();
    }
}

impl ::std::fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("location", &self.location)
            .finish()
    }
}

/// Transient bookkeeping attached to a descriptor only while its resource is
/// deferred or mid-transition. It is discarded the instant materialization
/// completes.
pub struct LoaderState {
    /// Identity snapshot of the attribute mapping, taken at defer time. Used
    /// to figure out exactly which attributes were written onto the proxy
    /// before the real load ran.
    pub(crate) original_attrs: HashMap<String, Attr>,
    /// The runtime form to restore once the resource is real.
    pub(crate) original_tag: Tag,
    /// The registry the loaded resource is checked against for identity.
    pub(crate) registry: Arc<Registry>,
    /// Per-resource reentrant lock. The cell inside is the loading flag; it
    /// is only ever touched while the lock is held.
    pub(crate) lock: ReentrantMutex<Cell<bool>>,
}

impl LoaderState {
    pub(crate) fn new(
        original_attrs: HashMap<String, Attr>,
        original_tag: Tag,
        registry: Arc<Registry>,
    ) -> Self {
        LoaderState {
            original_attrs,
            original_tag,
            registry,
            lock: ReentrantMutex::new(Cell::new(false)),
        }
    }
}
