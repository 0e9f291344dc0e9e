use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use latent::errors::Error;
use latent::prelude::*;

/// Counts how many times the wrapped loader actually materializes something.
struct Counting {
    inner: Arc<dyn Loader>,
    count: AtomicUsize,
}

impl Counting {
    fn new(inner: Arc<dyn Loader>) -> Arc<Self> {
        Arc::new(Counting {
            inner,
            count: AtomicUsize::new(0),
        })
    }

    fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Loader for Counting {
    fn kind(&self) -> LoaderKind {
        self.inner.kind()
    }

    fn load(&self, resource: &Resource) -> latent::errors::Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.inner.load(resource)
    }
}

fn value_of(resource: &Resource, key: &str) -> i64 {
    resource
        .get_as::<serde_json::Value>(key)
        .unwrap()
        .unwrap()
        .as_i64()
        .unwrap()
}

#[test]
fn eager_request_materializes_up_front() {
    let counting = Counting::new(Arc::new(SourceLoader::new()));
    let sys = ResourceSystem::new();
    sys.mount(DirectoryResolver::with_loader(
        "tests/resources",
        counting.clone(),
    ));

    let resource = sys.request("pkg.mod").unwrap();
    assert_eq!(resource.tag(), Tag::Materialized);
    assert_eq!(counting.count(), 1);
    assert_eq!(value_of(&resource, "value"), 42);
}

#[test]
fn lazy_request_defers_until_first_observation() {
    let counting = Counting::new(Arc::new(SourceLoader::new()));
    let sys = ResourceSystem::new();
    sys.mount(DirectoryResolver::with_loader(
        "tests/resources",
        counting.clone(),
    ));

    let resource = {
        let _scope = sys.lazy();
        sys.request("pkg.mod").unwrap()
    };

    assert_eq!(resource.tag(), Tag::Deferred);
    assert_eq!(counting.count(), 0);

    assert_eq!(value_of(&resource, "value"), 42);
    assert_eq!(counting.count(), 1);
    assert_eq!(resource.tag(), Tag::Materialized);

    assert_eq!(value_of(&resource, "value"), 42);
    assert_eq!(counting.count(), 1);
}

#[test]
fn repeated_requests_share_one_resource() {
    let sys = ResourceSystem::new();
    sys.mount(DirectoryResolver::new("tests/resources"));

    let first = {
        let _scope = sys.lazy();
        sys.request("pkg.mod").unwrap()
    };
    let second = sys.request("pkg.mod").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn unresolvable_names_are_reported() {
    let sys = ResourceSystem::new();
    sys.mount(DirectoryResolver::new("tests/resources"));

    let err = sys.request("no.such.resource").unwrap_err();
    match err.downcast_ref::<Error>() {
        Some(Error::NotFound(name)) => assert_eq!(name, "no.such.resource"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn eager_load_failure_unregisters() {
    let sys = ResourceSystem::new();
    sys.mount(DirectoryResolver::new("tests/resources"));

    assert!(sys.request("pkg.broken").is_err());
    assert!(!sys.registry().contains("pkg.broken"));
}

#[test]
fn preset_attribute_survives_system_materialization() {
    let sys = ResourceSystem::new();
    sys.mount(DirectoryResolver::new("tests/resources"));

    let resource = {
        let _scope = sys.lazy();
        sys.request("pkg.mod").unwrap()
    };

    let mine = Arc::new("overridden".to_string());
    resource.set("value", mine.clone() as Attr);

    let got = resource.get_as::<String>("value").unwrap().unwrap();
    assert!(Arc::ptr_eq(&got, &mine));
    assert_eq!(resource.tag(), Tag::Materialized);
}

#[test]
fn manifest_resolution_end_to_end() {
    let mut manifest = Manifest::new();
    manifest.insert("cfg.core", "tests/resources/pkg/mod.res");

    // Round-trip through the serialized form, the way a build would ship it.
    let mut buf = Vec::new();
    manifest.save_into(&mut buf).unwrap();

    let mut resolver = ManifestResolver::new();
    resolver.attach(&mut Cursor::new(&buf)).unwrap();
    assert_eq!(resolver.len(), 1);

    let sys = ResourceSystem::new();
    sys.mount(resolver);

    let resource = {
        let _scope = sys.lazy();
        sys.request("cfg.core").unwrap()
    };

    assert_eq!(resource.tag(), Tag::Deferred);
    assert_eq!(value_of(&resource, "value"), 42);
}

#[test]
fn lazy_scope_restores_the_chain() {
    let sys = ResourceSystem::new();
    sys.mount(DirectoryResolver::new("tests/resources"));
    assert_eq!(sys.chain().len(), 1);

    {
        let _outer = sys.lazy();
        let _inner = sys.lazy();
        assert_eq!(sys.chain().len(), 2);
    }

    assert_eq!(sys.chain().len(), 1);
}
