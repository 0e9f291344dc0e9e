//! Name resolution. A `ResolverChain` is an ordered, pluggable sequence of
//! [`Resolver`]s that map a readable name to a [`Descriptor`]; the first
//! resolver to produce one wins. The chain is shared process-wide state: it
//! is mutated only under its registration lock, while resolution walks
//! iterate over a snapshot so that concurrent mutation never tears a walk.
//!
//! The lazy machinery lives in the `interceptor` module: a resolver that
//! installs itself at the front of the chain for the dynamic extent of a
//! scope and rewrites winning source-form resolutions to defer their load.

pub mod dir;
pub mod interceptor;
pub mod manifest;

pub use self::dir::DirectoryResolver;
pub use self::interceptor::{LazyResolver, LazyScope};
pub use self::manifest::{Manifest, ManifestItem, ManifestResolver};

use std::sync::{Arc, Mutex};

use crate::errors::*;
use crate::res::{Descriptor, Registry, Resource};

/// The pluggable resolution capability: maps a name (plus an optional search
/// path, plus the live resource on reloads) to a descriptor. Returning
/// `None` is not an error; it only means "not found by this resolver".
pub trait Resolver: Send + Sync + 'static {
    fn resolve(
        &self,
        name: &str,
        search_path: Option<&[String]>,
        target: Option<&Resource>,
    ) -> Result<Option<Arc<Descriptor>>>;
}

/// Checks whether two resolver handles point at the very same object.
fn same_resolver(lhs: &dyn Resolver, rhs: &dyn Resolver) -> bool {
    let lhs = lhs as *const dyn Resolver as *const ();
    let rhs = rhs as *const dyn Resolver as *const ();
    lhs == rhs
}

/// A process-lifetime ordered sequence of resolvers.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Mutex<Vec<Arc<dyn Resolver>>>,
}

impl ResolverChain {
    /// Creates a new and empty `ResolverChain`.
    pub fn new() -> Self {
        ResolverChain {
            resolvers: Mutex::new(Vec::new()),
        }
    }

    /// Appends a resolver to the end of the chain.
    pub fn push(&self, resolver: Arc<dyn Resolver>) {
        self.resolvers.lock().unwrap().push(resolver);
    }

    /// Inserts a resolver at the front of the chain, unless the very same
    /// object is already an element. Returns true if it was inserted.
    pub fn install_front(&self, resolver: &Arc<dyn Resolver>) -> bool {
        let mut resolvers = self.resolvers.lock().unwrap();
        if resolvers
            .iter()
            .any(|v| same_resolver(v.as_ref(), resolver.as_ref()))
        {
            return false;
        }

        resolvers.insert(0, resolver.clone());
        true
    }

    /// Removes a resolver from the chain by object identity. Returns true if
    /// it was an element.
    pub fn remove(&self, resolver: &Arc<dyn Resolver>) -> bool {
        let mut resolvers = self.resolvers.lock().unwrap();
        match resolvers
            .iter()
            .position(|v| same_resolver(v.as_ref(), resolver.as_ref()))
        {
            Some(index) => {
                resolvers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Checks if a resolver is an element of the chain, by object identity.
    pub fn contains(&self, resolver: &Arc<dyn Resolver>) -> bool {
        self.resolvers
            .lock()
            .unwrap()
            .iter()
            .any(|v| same_resolver(v.as_ref(), resolver.as_ref()))
    }

    /// Clones the current chain elements, in order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Resolver>> {
        self.resolvers.lock().unwrap().clone()
    }

    /// Gets the number of chain elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.resolvers.lock().unwrap().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walks the chain in order and returns the first descriptor produced.
    ///
    /// When the walk is not a reload and a racing registration completed
    /// while it ran, the existing resource's descriptor wins over the fresh
    /// one, so that one logical resource never ends up with two divergent
    /// descriptors. An empty chain is reported with a warning, not an error.
    pub fn find(
        &self,
        registry: &Registry,
        name: &str,
        search_path: Option<&[String]>,
        target: Option<&Resource>,
    ) -> Result<Option<Arc<Descriptor>>> {
        self.find_excluding(registry, name, search_path, target, None)
    }

    pub(crate) fn find_excluding(
        &self,
        registry: &Registry,
        name: &str,
        search_path: Option<&[String]>,
        target: Option<&Resource>,
        skip: Option<&dyn Resolver>,
    ) -> Result<Option<Arc<Descriptor>>> {
        let resolvers = self.snapshot();
        if resolvers.is_empty() {
            warn!("Resolver chain is empty; nothing will resolve.");
        }

        // A passed-in target usually means a reload; only the registry is
        // authoritative about it.
        let is_reload = registry.contains(name);

        for resolver in &resolvers {
            if let Some(skip) = skip {
                if same_resolver(resolver.as_ref(), skip) {
                    continue;
                }
            }

            if let Some(descriptor) = resolver.resolve(name, search_path, target)? {
                // A parallel request may have registered this name while the
                // walk ran.
                if !is_reload {
                    if let Some(live) = registry.get(name) {
                        if let Some(existing) = live.descriptor() {
                            return Ok(Some(existing));
                        }

                        // The live entry carries no descriptor to prefer.
                        return Ok(Some(descriptor));
                    }
                }

                return Ok(Some(descriptor));
            }
        }

        Ok(None)
    }
}
