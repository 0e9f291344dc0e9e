//! The top-level binding of one registry, one resolver chain and one lazy
//! interceptor, plus the request path that walks them.

use std::sync::Arc;

use crate::errors::*;
use crate::res::{Registry, Resource};
use crate::resolve::{LazyResolver, LazyScope, Resolver, ResolverChain};

/// A standalone resource system. Resolvers are mounted onto its chain;
/// [`ResourceSystem::request`] resolves, registers and loads resources
/// through them, and [`ResourceSystem::lazy`] turns every source-form
/// resolution inside the returned scope into a deferred one.
pub struct ResourceSystem {
    registry: Arc<Registry>,
    chain: Arc<ResolverChain>,
    lazy: Arc<LazyResolver>,
}

impl ResourceSystem {
    /// Creates a new `ResourceSystem` with an empty registry and an empty
    /// resolver chain.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());
        let chain = Arc::new(ResolverChain::new());
        let lazy = Arc::new(LazyResolver::new(chain.clone(), registry.clone()));

        ResourceSystem {
            registry,
            chain,
            lazy,
        }
    }

    /// Gets the registry of live resources.
    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Gets the resolver chain.
    #[inline]
    pub fn chain(&self) -> &Arc<ResolverChain> {
        &self.chain
    }

    /// Mounts a resolver at the end of the chain.
    pub fn mount<T: Resolver>(&self, resolver: T) {
        info!("Mounts resolver onto the chain.");
        self.chain.push(Arc::new(resolver));
    }

    /// Activates the lazy machinery for the lifetime of the returned scope.
    /// Requests made inside it produce deferred resources wherever the
    /// resolution is source-form. Scopes nest; a doubled activation collapses
    /// to a single chain entry.
    pub fn lazy(&self) -> LazyScope {
        LazyScope::enter(self.chain.clone(), self.lazy.clone())
    }

    /// Gets the resource registered under `name`, resolving and loading it
    /// first if necessary.
    ///
    /// Failing to resolve the name is reported as
    /// [`Error::NotFound`](crate::errors::Error). A load failure unregisters
    /// the fresh resource again and propagates verbatim.
    pub fn request(&self, name: &str) -> Result<Arc<Resource>> {
        if let Some(resource) = self.registry.get(name) {
            return Ok(resource);
        }

        let descriptor = self
            .chain
            .find(&self.registry, name, None, None)?
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        let loader = descriptor.loader();
        let resource = match loader.create(&descriptor)? {
            Some(resource) => resource,
            None => Arc::new(Resource::new(name)),
        };
        resource.set_descriptor(descriptor);

        // The resource must be visible under its name before the load runs,
        // since loading commonly re-enters the registry; an eager load that
        // fails takes the registration back out.
        self.registry.insert(resource.clone());
        if let Err(err) = loader.load(&resource) {
            self.registry.remove(name);
            return Err(err);
        }

        // The load may legitimately have re-registered the name; whatever the
        // registry answers now is the caller's resource.
        Ok(self.registry.get(name).unwrap_or(resource))
    }
}

impl Default for ResourceSystem {
    fn default() -> Self {
        ResourceSystem::new()
    }
}
