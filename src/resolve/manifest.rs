//! An explicit name-to-location table and the resolver backed by it. The
//! serialized form starts with a MAGIC header so a truncated or foreign file
//! is rejected before deserialization is even attempted.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::errors::*;
use crate::res::loader::{Loader, SourceLoader};
use crate::res::{Descriptor, Resource};

use super::Resolver;

pub const MAGIC: [u8; 8] = [b'L', b'N', b'F', b'T', b' ', 0, 0, 1];

/// A manifest entry: one resolvable resource and the location of its source.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ManifestItem {
    pub name: String,
    pub location: String,
}

/// A table of all the resolvable resources in a build.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Manifest {
    pub items: Vec<ManifestItem>,
}

impl Manifest {
    pub fn new() -> Self {
        Manifest { items: Vec::new() }
    }

    /// Adds an entry to this manifest.
    pub fn insert<T1, T2>(&mut self, name: T1, location: T2)
    where
        T1: Into<String>,
        T2: Into<String>,
    {
        self.items.push(ManifestItem {
            name: name.into(),
            location: location.into(),
        });
    }

    /// Loads a manifest from its serialized form.
    pub fn load_from(mut file: &mut dyn Read) -> Result<Manifest> {
        let mut buf = [0; 8];
        file.read_exact(&mut buf)?;

        if buf != MAGIC {
            bail!("MAGIC number of manifest not match.");
        }

        Ok(::bincode::deserialize_from(&mut file)?)
    }

    /// Writes the serialized form of this manifest.
    pub fn save_into(&self, mut file: &mut dyn Write) -> Result<()> {
        file.write_all(&MAGIC)?;
        ::bincode::serialize_into(&mut file, self)?;
        Ok(())
    }
}

/// A resolver backed by one or more manifests.
pub struct ManifestResolver {
    locations: HashMap<String, String>,
    loader: Arc<dyn Loader>,
}

impl ManifestResolver {
    /// Creates a resolver that produces [`SourceLoader`] descriptors.
    pub fn new() -> Self {
        ManifestResolver::with_loader(Arc::new(SourceLoader::new()))
    }

    /// Creates a resolver with a custom loader.
    pub fn with_loader(loader: Arc<dyn Loader>) -> Self {
        ManifestResolver {
            locations: HashMap::new(),
            loader,
        }
    }

    /// Merges a manifest into this resolver. Later entries win on name
    /// conflicts.
    pub fn add(&mut self, manifest: Manifest) {
        for item in manifest.items {
            self.locations.insert(item.name, item.location);
        }
    }

    /// Loads a serialized manifest and merges it into this resolver.
    pub fn attach(&mut self, file: &mut dyn Read) -> Result<()> {
        let manifest = Manifest::load_from(file)?;
        info!("Attached manifest with {} items.", manifest.items.len());

        self.add(manifest);
        Ok(())
    }

    /// Gets the number of resolvable names.
    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Default for ManifestResolver {
    fn default() -> Self {
        ManifestResolver::new()
    }
}

impl Resolver for ManifestResolver {
    fn resolve(
        &self,
        name: &str,
        _: Option<&[String]>,
        _: Option<&Resource>,
    ) -> Result<Option<Arc<Descriptor>>> {
        match self.locations.get(name) {
            Some(location) => {
                let descriptor =
                    Descriptor::with_location(name, location.as_str(), self.loader.clone());
                Ok(Some(Arc::new(descriptor)))
            }
            None => Ok(None),
        }
    }
}
