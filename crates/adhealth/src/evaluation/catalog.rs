use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::warn;

use super::domain::{CheckDefinition, CheckId};

/// Failure to load a definitions or thresholds document.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid catalog document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Check definitions keyed by id, in the order they were first declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckCatalog {
    definitions: Vec<CheckDefinition>,
    index: HashMap<CheckId, usize>,
}

impl CheckCatalog {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let definitions: Vec<CheckDefinition> = serde_json::from_reader(reader)?;
        Ok(Self::from_definitions(definitions))
    }

    /// Builds a catalog; a repeated `CheckId` replaces the earlier definition.
    pub fn from_definitions<I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = CheckDefinition>,
    {
        let mut catalog = Self::default();
        for definition in definitions {
            catalog.insert(definition);
        }
        catalog
    }

    pub fn insert(&mut self, definition: CheckDefinition) {
        match self.index.get(&definition.check_id) {
            Some(&slot) => {
                warn!(check_id = %definition.check_id, "duplicate check definition; keeping the later one");
                self.definitions[slot] = definition;
            }
            None => {
                self.index
                    .insert(definition.check_id.clone(), self.definitions.len());
                self.definitions.push(definition);
            }
        }
    }

    pub fn get(&self, check_id: &CheckId) -> Option<&CheckDefinition> {
        self.index
            .get(check_id)
            .and_then(|slot| self.definitions.get(*slot))
    }

    pub fn definitions(&self) -> &[CheckDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
