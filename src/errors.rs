use crate::res::loader::LoaderKind;

pub type Result<T> = ::std::result::Result<T, ::failure::Error>;

/// Typed failures of the deferred materialization machinery. Everything else
/// is reported as an ad-hoc `failure::Error`.
#[derive(Debug, Fail)]
pub enum Error {
    /// Only plain source-form loaders can be deferred safely. Opaque forms
    /// keep internal state that can not be re-initialized after a deferred
    /// re-entrant load.
    #[fail(display = "Loaders of {:?} kind can NOT be deferred.", _0)]
    UnsupportedLoader(LoaderKind),
    /// The registry entry for a resource was replaced with a different object
    /// while its deferred load was running.
    #[fail(
        display = "Resource object of '{}' substituted in registry during a deferred load.",
        _0
    )]
    Substituted(String),
    /// No resolver in the chain produced a descriptor for the name.
    #[fail(display = "Could not resolve resource '{}'.", _0)]
    NotFound(String),
}
