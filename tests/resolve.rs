use std::sync::Arc;

use latent::prelude::*;

/// A resolver that answers a single fixed name with a source-form
/// descriptor.
struct StaticResolver {
    name: String,
    location: String,
}

impl StaticResolver {
    fn new(name: &str, location: &str) -> Arc<Self> {
        Arc::new(StaticResolver {
            name: name.to_string(),
            location: location.to_string(),
        })
    }
}

impl Resolver for StaticResolver {
    fn resolve(
        &self,
        name: &str,
        _: Option<&[String]>,
        _: Option<&Resource>,
    ) -> latent::errors::Result<Option<Arc<Descriptor>>> {
        if name == self.name {
            let descriptor = Descriptor::with_location(
                name,
                self.location.as_str(),
                Arc::new(SourceLoader::new()) as Arc<dyn Loader>,
            );
            Ok(Some(Arc::new(descriptor)))
        } else {
            Ok(None)
        }
    }
}

struct FailingResolver {}

impl Resolver for FailingResolver {
    fn resolve(
        &self,
        _: &str,
        _: Option<&[String]>,
        _: Option<&Resource>,
    ) -> latent::errors::Result<Option<Arc<Descriptor>>> {
        Err(failure::err_msg("resolver blew up"))
    }
}

fn thin(resolver: &Arc<dyn Resolver>) -> *const () {
    &**resolver as *const dyn Resolver as *const ()
}

#[test]
fn empty_chain_resolves_to_nothing() {
    let chain = ResolverChain::new();
    let registry = Registry::new();

    assert!(chain
        .find(&registry, "pkg.mod", None, None)
        .unwrap()
        .is_none());
}

#[test]
fn first_resolver_wins() {
    let chain = ResolverChain::new();
    let registry = Registry::new();

    chain.push(StaticResolver::new("pkg.mod", "first/pkg/mod.res"));
    chain.push(StaticResolver::new("pkg.mod", "second/pkg/mod.res"));

    let descriptor = chain.find(&registry, "pkg.mod", None, None).unwrap().unwrap();
    assert_eq!(descriptor.location(), Some("first/pkg/mod.res"));
}

#[test]
fn chain_hygiene_across_scopes() {
    let chain = Arc::new(ResolverChain::new());
    let registry = Arc::new(Registry::new());

    chain.push(StaticResolver::new("pkg.mod", "pkg/mod.res"));
    chain.push(Arc::new(FailingResolver {}));

    let before: Vec<*const ()> = chain.snapshot().iter().map(thin).collect();

    {
        let lazy: Arc<dyn Resolver> =
            Arc::new(LazyResolver::new(chain.clone(), registry.clone()));
        let _scope = LazyScope::enter(chain.clone(), lazy);
        assert_eq!(chain.len(), 3);

        // A resolution error inside the scope must not damage the chain.
        assert!(chain.find(&registry, "other.mod", None, None).is_err());
    }

    let after: Vec<*const ()> = chain.snapshot().iter().map(thin).collect();
    assert_eq!(before, after);
}

#[test]
fn nested_scopes_collapse_to_one_entry() {
    let chain = Arc::new(ResolverChain::new());
    let registry = Arc::new(Registry::new());
    let lazy: Arc<dyn Resolver> = Arc::new(LazyResolver::new(chain.clone(), registry));

    let outer = LazyScope::enter(chain.clone(), lazy.clone());
    assert_eq!(chain.len(), 1);

    {
        let _inner = LazyScope::enter(chain.clone(), lazy.clone());
        assert_eq!(chain.len(), 1);
    }

    // The inner exit did not install, so it must not remove.
    assert_eq!(chain.len(), 1);

    drop(outer);
    assert_eq!(chain.len(), 0);
}

#[test]
fn scope_exit_tolerates_missing_interceptor() {
    let chain = Arc::new(ResolverChain::new());
    let registry = Arc::new(Registry::new());
    let lazy: Arc<dyn Resolver> = Arc::new(LazyResolver::new(chain.clone(), registry));

    let scope = LazyScope::enter(chain.clone(), lazy.clone());
    assert!(chain.contains(&lazy));
    assert!(chain.remove(&lazy));
    assert!(!chain.contains(&lazy));

    // Dropping the scope warns but succeeds.
    drop(scope);
    assert_eq!(chain.len(), 0);
}

#[test]
fn interceptor_wraps_source_forms() {
    let chain = Arc::new(ResolverChain::new());
    let registry = Arc::new(Registry::new());
    chain.push(StaticResolver::new("pkg.mod", "pkg/mod.res"));

    let lazy: Arc<dyn Resolver> = Arc::new(LazyResolver::new(chain.clone(), registry.clone()));
    let _scope = LazyScope::enter(chain.clone(), lazy);

    let descriptor = chain.find(&registry, "pkg.mod", None, None).unwrap().unwrap();
    assert_eq!(descriptor.loader().kind(), LoaderKind::Deferred);
}

struct BinaryLoader {}

impl Loader for BinaryLoader {
    fn kind(&self) -> LoaderKind {
        LoaderKind::Binary
    }

    fn load(&self, _: &Resource) -> latent::errors::Result<()> {
        Ok(())
    }
}

#[test]
fn interceptor_leaves_binary_forms_eager() {
    let chain = Arc::new(ResolverChain::new());
    let registry = Arc::new(Registry::new());

    struct BinaryResolver {}
    impl Resolver for BinaryResolver {
        fn resolve(
            &self,
            name: &str,
            _: Option<&[String]>,
            _: Option<&Resource>,
        ) -> latent::errors::Result<Option<Arc<Descriptor>>> {
            Ok(Some(Arc::new(Descriptor::new(
                name,
                Arc::new(BinaryLoader {}) as Arc<dyn Loader>,
            ))))
        }
    }

    chain.push(Arc::new(BinaryResolver {}));

    let lazy: Arc<dyn Resolver> = Arc::new(LazyResolver::new(chain.clone(), registry.clone()));
    let _scope = LazyScope::enter(chain.clone(), lazy);

    let descriptor = chain.find(&registry, "ext.mod", None, None).unwrap().unwrap();
    assert_eq!(descriptor.loader().kind(), LoaderKind::Binary);
}

/// A resolver that registers the requested resource mid-resolution, the way a
/// racing request on another thread would.
struct RacingResolver {
    registry: Arc<Registry>,
    descriptor: Arc<Descriptor>,
    register_with_descriptor: bool,
}

impl Resolver for RacingResolver {
    fn resolve(
        &self,
        name: &str,
        _: Option<&[String]>,
        _: Option<&Resource>,
    ) -> latent::errors::Result<Option<Arc<Descriptor>>> {
        let resource = if self.register_with_descriptor {
            Arc::new(Resource::with_descriptor(name, self.descriptor.clone()))
        } else {
            Arc::new(Resource::new(name))
        };
        self.registry.insert(resource);

        let fresh = Descriptor::with_location(
            name,
            "fresh/pkg/mod.res",
            Arc::new(SourceLoader::new()) as Arc<dyn Loader>,
        );
        Ok(Some(Arc::new(fresh)))
    }
}

#[test]
fn racing_registration_keeps_its_descriptor() {
    let chain = ResolverChain::new();
    let registry = Arc::new(Registry::new());

    let existing = Arc::new(Descriptor::with_location(
        "pkg.mod",
        "existing/pkg/mod.res",
        Arc::new(SourceLoader::new()) as Arc<dyn Loader>,
    ));

    chain.push(Arc::new(RacingResolver {
        registry: registry.clone(),
        descriptor: existing.clone(),
        register_with_descriptor: true,
    }));

    let descriptor = chain.find(&registry, "pkg.mod", None, None).unwrap().unwrap();
    assert!(Arc::ptr_eq(&descriptor, &existing));
}

#[test]
fn racing_registration_without_descriptor_falls_back() {
    let chain = ResolverChain::new();
    let registry = Arc::new(Registry::new());

    let unused = Arc::new(Descriptor::new(
        "pkg.mod",
        Arc::new(SourceLoader::new()) as Arc<dyn Loader>,
    ));

    chain.push(Arc::new(RacingResolver {
        registry: registry.clone(),
        descriptor: unused,
        register_with_descriptor: false,
    }));

    let descriptor = chain.find(&registry, "pkg.mod", None, None).unwrap().unwrap();
    assert_eq!(descriptor.location(), Some("fresh/pkg/mod.res"));
}

#[test]
fn reload_prefers_the_fresh_descriptor() {
    let chain = ResolverChain::new();
    let registry = Arc::new(Registry::new());

    // The name is live before the walk starts, which makes this a reload;
    // the existing descriptor must not shadow the fresh one.
    let existing = Arc::new(Descriptor::with_location(
        "pkg.mod",
        "existing/pkg/mod.res",
        Arc::new(SourceLoader::new()) as Arc<dyn Loader>,
    ));
    registry.insert(Arc::new(Resource::with_descriptor("pkg.mod", existing)));

    chain.push(StaticResolver::new("pkg.mod", "fresh/pkg/mod.res"));

    let descriptor = chain.find(&registry, "pkg.mod", None, None).unwrap().unwrap();
    assert_eq!(descriptor.location(), Some("fresh/pkg/mod.res"));
}

#[test]
fn directory_resolver_maps_dotted_names() {
    let resolver = DirectoryResolver::new("tests/resources");

    let descriptor = resolver.resolve("pkg.mod", None, None).unwrap().unwrap();
    let location = descriptor.location().unwrap();
    assert!(location.ends_with("mod.res"));
    assert!(location.contains("pkg"));

    assert!(resolver.resolve("pkg.absent", None, None).unwrap().is_none());
}

#[test]
fn directory_resolver_honors_search_path() {
    let resolver = DirectoryResolver::new("somewhere/else");
    let paths = vec!["tests/resources".to_string()];

    let descriptor = resolver
        .resolve("pkg.mod", Some(&paths), None)
        .unwrap()
        .unwrap();
    assert!(descriptor.location().unwrap().ends_with("mod.res"));

    assert!(resolver.resolve("pkg.mod", None, None).unwrap().is_none());
}
