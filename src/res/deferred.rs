//! The guarded, exactly-once materialization path.
//!
//! Every genuine observation of a deferred resource funnels through
//! [`observe`]. Only the first thread to take the resource's reentrant lock
//! runs the real load. Everyone else either waits and falls through to a
//! plain lookup, or, when the observation happens during that thread's own
//! load, reads the live underlying state directly instead of deadlocking on
//! itself.

use std::collections::HashMap;

use crate::errors::*;

use super::{same_identity, Attr, Resource, Tag};

/// Ensures `resource` is materialized, then reads attribute `key` from it.
///
/// Preconditions: the resource was tagged deferred when the caller looked.
/// The load may have completed concurrently since; that case degrades to a
/// plain lookup.
pub(crate) fn observe(resource: &Resource, key: &str) -> Result<Option<Attr>> {
    let descriptor = match resource.descriptor() {
        Some(descriptor) => descriptor,
        None => bail!(
            "Deferred resource '{}' has no descriptor attached.",
            resource.name()
        ),
    };

    // A missing loader state means another thread finished the whole
    // transition since we checked the tag. The tag is restored before the
    // state is discarded, so a plain lookup is safe here.
    let state = match descriptor.loader_state() {
        Some(state) => state,
        None => return Ok(resource.peek(key)),
    };

    let guard = state.lock.lock();

    // Someone else finished the whole load while we waited on the lock.
    if resource.tag() != Tag::Deferred {
        return Ok(resource.peek(key));
    }

    // A reentrant observation from the loading thread itself, usually a
    // loader reading its own resource or a self-referential resolution.
    // Answer from the live state; recursing here would run the load twice.
    if guard.get() {
        return Ok(resource.peek(key));
    }
    guard.set(true);

    // Everything written onto the proxy since the deferred install. Compared
    // by identity: consumers hold references to what they assigned.
    let mut updated = HashMap::new();
    for (name, value) in resource.snapshot() {
        match state.original_attrs.get(&name) {
            Some(original) if same_identity(&value, original) => {}
            _ => {
                updated.insert(name, value);
            }
        }
    }

    descriptor.loader().load(resource)?;

    // The load ran outside our control; refuse to continue if it swapped a
    // different object under our name.
    if let Some(live) = state.registry.get(resource.name()) {
        if !::std::ptr::eq(live.as_ref(), resource) {
            return Err(Error::Substituted(resource.name().to_string()).into());
        }
    }

    // Consumer writes post-date load intent, so they win over whatever the
    // load produced.
    resource.merge(updated);

    // Stop standing in for the real thing, unless a nested load already did.
    resource.restore_tag(state.original_tag);
    descriptor.clear_loader_state();

    debug!("Materialized resource '{}'.", resource.name());

    drop(guard);
    Ok(resource.peek(key))
}
