//! The deferred resource core. A `Resource` is a named bag of attributes that
//! is registered and visible to consumers immediately, while the expensive
//! work that produces its real contents is postponed until the first genuine
//! observation.
//!
//! # Resource
//!
//! A _resource_ is the unit of materialization. It carries a globally unique
//! readable name within its `Registry`, a `Descriptor` that records how it was
//! resolved and how it loads, and a mapping from attribute names to attribute
//! values. Resources are always shared as `Arc<Resource>`; object identity is
//! the `Arc` identity, and the registry is the single source of truth for
//! which object currently answers to a name.
//!
//! # Deferred and materialized forms
//!
//! Over its lifetime a resource exists in exactly one of two runtime forms,
//! modelled by [`Tag`]. A plain resource starts `Materialized`. When a
//! resolution has been intercepted by the lazy machinery (see the `resolve`
//! module), loading it only installs bookkeeping state and flips the tag to
//! `Deferred`. The first genuine observation of a deferred resource performs
//! the real load exactly once, no matter how many threads race for it, and
//! then restores the tag for good. The transition is one-way and idempotent.
//!
//! # Observations
//!
//! Reading an attribute with [`Resource::get`] and deleting one with
//! [`Resource::remove`] are observations: both force materialization first.
//! Writing with [`Resource::set`] is not; values written onto a still
//! deferred resource are remembered by identity and survive materialization,
//! since user intent post-dates load intent. The single exemption is the
//! reserved [`DESCRIPTOR_KEY`], which returns the descriptor without
//! triggering a load, so that resolution bookkeeping can ask "is this
//! resolved already?" without paying for the answer.

pub mod deferred;
pub mod descriptor;
pub mod loader;
pub mod registry;

pub use self::descriptor::Descriptor;
pub use self::registry::Registry;

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::errors::*;

/// An attribute value. Attributes are shared handles rather than deep copies,
/// because reconciliation after a deferred load compares object identity, not
/// value equality.
pub type Attr = Arc<dyn Any + Send + Sync>;

/// The reserved introspection key. Reading it never triggers materialization
/// and yields the resource's `Arc<Descriptor>`.
pub const DESCRIPTOR_KEY: &str = "__descriptor__";

/// The runtime form of a resource. `Deferred` stands in for the real thing
/// until the first genuine observation; `Materialized` is the real thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Deferred,
    Materialized,
}

/// Checks whether two attribute handles point at the very same object.
pub(crate) fn same_identity(lhs: &Attr, rhs: &Attr) -> bool {
    let lhs = &**lhs as *const (dyn Any + Send + Sync) as *const ();
    let rhs = &**rhs as *const (dyn Any + Send + Sync) as *const ();
    lhs == rhs
}

/// The named, lazily materialized unit.
pub struct Resource {
    name: String,
    tag: RwLock<Tag>,
    descriptor: RwLock<Option<Arc<Descriptor>>>,
    attrs: RwLock<HashMap<String, Attr>>,
}

impl Resource {
    /// Creates a plain, empty resource with provided name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Resource {
            name: name.into(),
            tag: RwLock::new(Tag::Materialized),
            descriptor: RwLock::new(None),
            attrs: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a resource and attaches a descriptor to it.
    pub fn with_descriptor<T: Into<String>>(name: T, descriptor: Arc<Descriptor>) -> Self {
        let resource = Resource::new(name);
        *resource.descriptor.write().unwrap() = Some(descriptor);
        resource
    }

    /// Gets the unique name of this resource.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the current runtime form.
    #[inline]
    pub fn tag(&self) -> Tag {
        *self.tag.read().unwrap()
    }

    /// Checks if the resource is still waiting for its first genuine
    /// observation.
    #[inline]
    pub fn is_deferred(&self) -> bool {
        self.tag() == Tag::Deferred
    }

    /// Gets the descriptor, without triggering materialization.
    #[inline]
    pub fn descriptor(&self) -> Option<Arc<Descriptor>> {
        self.descriptor.read().unwrap().clone()
    }

    /// Attaches a descriptor. The descriptor object attached to a resource is
    /// identity-stable afterwards; only its in-place slots may update.
    pub fn set_descriptor(&self, descriptor: Arc<Descriptor>) {
        *self.descriptor.write().unwrap() = Some(descriptor);
    }

    /// Reads attribute `key`, materializing the resource first if it is still
    /// deferred. Returns `None` if the attribute does not exist after the
    /// resource is real.
    ///
    /// Reading [`DESCRIPTOR_KEY`] is exempt and returns the descriptor
    /// directly.
    pub fn get(&self, key: &str) -> Result<Option<Attr>> {
        if key == DESCRIPTOR_KEY {
            return Ok(self.descriptor().map(|v| v as Attr));
        }

        if self.tag() == Tag::Deferred {
            return deferred::observe(self, key);
        }

        Ok(self.peek(key))
    }

    /// Reads attribute `key` and downcasts it. Returns `None` if the
    /// attribute is missing or holds a different type.
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Result<Option<Arc<T>>> {
        Ok(self.get(key)?.and_then(|v| v.downcast::<T>().ok()))
    }

    /// Writes attribute `key`. Writes never trigger materialization; a value
    /// written onto a still deferred resource survives the eventual load.
    pub fn set<T: Into<String>>(&self, key: T, value: Attr) {
        self.attrs.write().unwrap().insert(key.into(), value);
    }

    /// Deletes attribute `key`, materializing the resource first if it is
    /// still deferred. Deleting from a deferred resource behaves exactly as
    /// if the resource had never been deferred.
    pub fn remove(&self, key: &str) -> Result<Option<Attr>> {
        if self.tag() == Tag::Deferred {
            self.get(key)?;
        }

        Ok(self.attrs.write().unwrap().remove(key))
    }

    /// Reads attribute `key` from the live underlying state, bypassing the
    /// materialization machinery.
    pub(crate) fn peek(&self, key: &str) -> Option<Attr> {
        self.attrs.read().unwrap().get(key).cloned()
    }

    /// Clones the current attribute mapping. The values are shared handles.
    pub(crate) fn snapshot(&self) -> HashMap<String, Attr> {
        self.attrs.read().unwrap().clone()
    }

    /// Merges `attrs` onto the attribute mapping, overwriting on conflicts.
    pub(crate) fn merge(&self, attrs: HashMap<String, Attr>) {
        self.attrs.write().unwrap().extend(attrs);
    }

    #[inline]
    pub(crate) fn set_tag(&self, tag: Tag) {
        *self.tag.write().unwrap() = tag;
    }

    /// Restores the runtime form after materialization, unless a nested load
    /// already did so.
    pub(crate) fn restore_tag(&self, tag: Tag) {
        let mut guard = self.tag.write().unwrap();
        if *guard == Tag::Deferred {
            *guard = tag;
        }
    }
}

impl ::std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("tag", &self.tag())
            .finish()
    }
}
