use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::*;
use crate::res::loader::{Loader, SourceLoader};
use crate::res::{Descriptor, Resource};

use super::Resolver;

/// A resolver that maps dotted names onto files under a root directory:
/// `pkg.mod` becomes `<root>/pkg/mod.res`. When a search path is passed in,
/// its entries replace the root.
pub struct DirectoryResolver {
    root: PathBuf,
    extension: String,
    loader: Arc<dyn Loader>,
}

impl DirectoryResolver {
    /// Creates a resolver that produces [`SourceLoader`] descriptors.
    pub fn new<T: Into<PathBuf>>(root: T) -> Self {
        DirectoryResolver::with_loader(root, Arc::new(SourceLoader::new()))
    }

    /// Creates a resolver with a custom loader.
    pub fn with_loader<T: Into<PathBuf>>(root: T, loader: Arc<dyn Loader>) -> Self {
        DirectoryResolver {
            root: root.into(),
            extension: "res".to_string(),
            loader,
        }
    }

    fn locate(&self, root: &Path, name: &str) -> PathBuf {
        let mut location = root.to_path_buf();
        for segment in name.split('.') {
            location.push(segment);
        }

        location.with_extension(&self.extension)
    }
}

impl Resolver for DirectoryResolver {
    fn resolve(
        &self,
        name: &str,
        search_path: Option<&[String]>,
        _: Option<&Resource>,
    ) -> Result<Option<Arc<Descriptor>>> {
        let candidates: Vec<PathBuf> = match search_path {
            Some(paths) => paths.iter().map(|v| self.locate(v.as_ref(), name)).collect(),
            None => vec![self.locate(&self.root, name)],
        };

        for location in candidates {
            if location.is_file() {
                let descriptor = Descriptor::with_location(
                    name,
                    location.to_string_lossy(),
                    self.loader.clone(),
                );

                return Ok(Some(Arc::new(descriptor)));
            }
        }

        Ok(None)
    }
}
