//! The resolution interceptor. While active it sits at the front of the
//! resolver chain and rewrites every winning source-form resolution so that
//! instantiating the resource defers its real load until first genuine
//! observation.

use std::sync::Arc;

use crate::errors::*;
use crate::res::loader::{LazyLoader, LoaderKind};
use crate::res::{Descriptor, Registry, Resource};

use super::{Resolver, ResolverChain};

/// A resolver that delegates to the rest of the chain and wraps the winning
/// descriptor's loader with [`LazyLoader`].
///
/// Delegation must not re-enter this resolver, or resolution would recurse
/// forever; the delegated walk is told to skip it by object identity rather
/// than by mutating the shared chain, so concurrent resolutions never observe
/// a torn chain.
pub struct LazyResolver {
    chain: Arc<ResolverChain>,
    registry: Arc<Registry>,
}

impl LazyResolver {
    pub fn new(chain: Arc<ResolverChain>, registry: Arc<Registry>) -> Self {
        LazyResolver { chain, registry }
    }
}

impl Resolver for LazyResolver {
    fn resolve(
        &self,
        name: &str,
        search_path: Option<&[String]>,
        target: Option<&Resource>,
    ) -> Result<Option<Arc<Descriptor>>> {
        let descriptor = self.chain.find_excluding(
            &self.registry,
            name,
            search_path,
            target,
            Some(self as &dyn Resolver),
        )?;

        if let Some(ref descriptor) = descriptor {
            // Opaque forms are left eager; their internal state can not
            // safely be re-initialized after a deferred re-entrant load. The
            // wrapper reports its own kind, so an already-wrapped descriptor
            // passes through untouched.
            if descriptor.loader().kind() == LoaderKind::Source {
                let eager = descriptor.loader();
                descriptor.set_loader(Arc::new(LazyLoader::new(eager, self.registry.clone())?));
            }
        }

        Ok(descriptor)
    }
}

/// A scoped activation of the lazy machinery. Entering installs the
/// interceptor at the front of the chain; dropping the scope removes it
/// again, tolerating (with a warning) the case where something else already
/// removed it.
///
/// Scopes nest: only the activation that actually inserted the interceptor
/// removes it, and a doubled activation collapses to a single chain entry.
#[must_use = "the interceptor is removed again when the scope is dropped"]
pub struct LazyScope {
    chain: Arc<ResolverChain>,
    resolver: Arc<dyn Resolver>,
    installed: bool,
}

impl LazyScope {
    /// Installs `resolver` at the front of `chain` for the lifetime of the
    /// returned scope.
    pub fn enter(chain: Arc<ResolverChain>, resolver: Arc<dyn Resolver>) -> Self {
        let installed = chain.install_front(&resolver);
        if installed {
            debug!("Lazy resolver installed at the front of the chain.");
        }

        LazyScope {
            chain,
            resolver,
            installed,
        }
    }
}

impl Drop for LazyScope {
    fn drop(&mut self) {
        if self.installed && !self.chain.remove(&self.resolver) {
            warn!("Lazy resolver unexpectedly missing from the resolver chain.");
        }
    }
}
