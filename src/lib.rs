//! Latent defers the materialization of named resources until the moment
//! something genuinely looks at them, and guarantees the expensive load runs
//! exactly once no matter how many threads race to trigger it, even when the
//! load re-enters the resource it is busy producing.
//!
//! # How it works
//!
//! Two pieces cooperate:
//!
//! 1. A resource can stand in for itself in a _deferred_ form. Observations
//! of a deferred resource (attribute reads and deletes, but not the reserved
//! descriptor introspection) take a per-resource reentrant lock, run the real
//! loader once, reconcile any attributes that were written onto the proxy in
//! the meantime, and flip the resource into its real form for good. See the
//! `res` module.
//!
//! 2. A resolution interceptor can be installed at the front of the shared
//! resolver chain for the dynamic extent of a scope. It delegates every
//! resolution to the rest of the chain, and rewrites winning source-form
//! descriptors so that loading the resource defers instead of paying
//! up-front. See the `resolve` module.
//!
//! # Example
//!
//! ```ignore
//! use latent::prelude::*;
//!
//! let sys = ResourceSystem::new();
//! sys.mount(DirectoryResolver::new("resources"));
//!
//! let resource = {
//!     let _scope = sys.lazy();
//!     sys.request("pkg.mod")?
//! };
//!
//! // Nothing has been read from disk yet.
//! assert!(resource.is_deferred());
//!
//! // The first genuine observation pays for the load, exactly once.
//! let value = resource.get("value")?;
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod errors;
pub mod res;
pub mod resolve;
pub mod system;

pub mod prelude {
    pub use crate::errors::Error;
    pub use crate::res::loader::{LazyLoader, Loader, LoaderKind, SourceLoader};
    pub use crate::res::{Attr, Descriptor, Registry, Resource, Tag, DESCRIPTOR_KEY};
    pub use crate::resolve::{
        DirectoryResolver, LazyResolver, LazyScope, Manifest, ManifestResolver, Resolver,
        ResolverChain,
    };
    pub use crate::system::ResourceSystem;
}

pub use self::system::ResourceSystem;
