//! Loaders perform the actual materialization of resources. The deferred
//! machinery never loads anything itself; it decides *when* a loader runs and
//! guarantees it runs at most once per resource.

pub mod source;
pub use self::source::SourceLoader;

use std::fmt;
use std::sync::Arc;

use crate::errors::*;

use super::descriptor::{Descriptor, LoaderState};
use super::registry::Registry;
use super::{Resource, Tag};

/// The form of a loader. Only `Source` loaders can be deferred; `Binary`
/// stands in for opaque forms whose internal state can not safely be
/// re-initialized after a deferred re-entrant load. `Deferred` is reported by
/// the wrapper itself so an interception pass never wraps twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    Source,
    Binary,
    Deferred,
}

/// The materializer capability consumed by the deferred machinery.
pub trait Loader: Send + Sync + 'static {
    /// The form of this loader.
    fn kind(&self) -> LoaderKind;

    /// Creates the resource object described by `descriptor`, or returns
    /// `None` to request default creation.
    fn create(&self, descriptor: &Arc<Descriptor>) -> Result<Option<Arc<Resource>>> {
        let _ = descriptor;
        Ok(None)
    }

    /// Fills `resource` with its real contents.
    fn load(&self, resource: &Resource) -> Result<()>;
}

/// A loader that defers the real load until first genuine observation.
///
/// Running it does not touch the underlying source at all. Instead it swaps
/// the descriptor's loader back to the wrapped eager one, installs a fresh
/// `LoaderState` and flips the resource into its deferred form. The first
/// genuine observation afterwards pays for the real load.
pub struct LazyLoader {
    inner: Arc<dyn Loader>,
    registry: Arc<Registry>,
}

impl LazyLoader {
    /// Wraps an eager source-form loader. Fails with
    /// [`Error::UnsupportedLoader`](crate::errors::Error) for every other
    /// kind, before any deferred resource is created.
    pub fn new(inner: Arc<dyn Loader>, registry: Arc<Registry>) -> Result<Self> {
        match inner.kind() {
            LoaderKind::Source => Ok(LazyLoader { inner, registry }),
            kind => Err(Error::UnsupportedLoader(kind).into()),
        }
    }
}

impl fmt::Debug for LazyLoader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LazyLoader").finish()
    }
}

impl Loader for LazyLoader {
    fn kind(&self) -> LoaderKind {
        LoaderKind::Deferred
    }

    fn create(&self, descriptor: &Arc<Descriptor>) -> Result<Option<Arc<Resource>>> {
        self.inner.create(descriptor)
    }

    fn load(&self, resource: &Resource) -> Result<()> {
        let descriptor = resource.descriptor().ok_or_else(|| {
            format_err!("Resource '{}' has no descriptor to defer.", resource.name())
        })?;

        // When the deferred resource eventually materializes it must invoke
        // the real loader, not this wrapper again.
        descriptor.set_loader(self.inner.clone());
        descriptor.set_loader_state(LoaderState::new(
            resource.snapshot(),
            resource.tag(),
            self.registry.clone(),
        ));
        resource.set_tag(Tag::Deferred);

        debug!("Deferred load of resource '{}'.", resource.name());
        Ok(())
    }
}
