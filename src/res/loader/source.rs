use std::fs;
use std::io::Read;
use std::sync::Arc;

use crate::errors::*;

use super::super::{Attr, Resource};
use super::{Loader, LoaderKind};

/// A source-form loader that reads the descriptor's location from disk and
/// deserializes a JSON table into the resource's attributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceLoader {}

impl SourceLoader {
    pub fn new() -> Self {
        SourceLoader {}
    }
}

impl Loader for SourceLoader {
    fn kind(&self) -> LoaderKind {
        LoaderKind::Source
    }

    fn load(&self, resource: &Resource) -> Result<()> {
        let descriptor = resource
            .descriptor()
            .ok_or_else(|| format_err!("Resource '{}' has no descriptor.", resource.name()))?;

        let location = descriptor
            .location()
            .ok_or_else(|| {
                format_err!(
                    "Descriptor of '{}' has no resolved source location.",
                    resource.name()
                )
            })?
            .to_string();

        let mut buf = Vec::new();
        fs::File::open(&location)?.read_to_end(&mut buf)?;

        match ::serde_json::from_slice(&buf)? {
            ::serde_json::Value::Object(table) => {
                for (key, value) in table {
                    resource.set(key, Arc::new(value) as Attr);
                }

                Ok(())
            }
            _ => bail!(
                "Source payload of '{}' at '{}' is not a table.",
                resource.name(),
                location
            ),
        }
    }
}
