//! Module loaders shipped with the engine.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::trace;

use super::{ModuleError, ModuleLoader};

/// Serves module sources registered up front.
#[derive(Debug, Default, Clone)]
pub struct InMemoryModuleLoader {
    sources: BTreeMap<String, String>,
}
impl InMemoryModuleLoader {
    pub fn new() -> Self {
        InMemoryModuleLoader::default()
    }

    pub fn with_module(mut self, specifier: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(specifier, source);
        self
    }

    pub fn insert(&mut self, specifier: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(specifier.into(), source.into());
    }
}
impl From<BTreeMap<String, String>> for InMemoryModuleLoader {
    fn from(sources: BTreeMap<String, String>) -> Self {
        InMemoryModuleLoader { sources }
    }
}
impl ModuleLoader for InMemoryModuleLoader {
    fn load_source(&self, specifier: &str) -> Result<String, ModuleError> {
        self.sources
            .get(specifier)
            .cloned()
            .ok_or_else(|| ModuleError::NotFound(specifier.to_string()))
    }
}

/// Reads modules from files below `root`. Specifiers are relative paths and may not leave
/// the root.
#[derive(Debug, Clone)]
pub struct DirectoryModuleLoader {
    root: PathBuf,
}
impl DirectoryModuleLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryModuleLoader { root: root.into() }
    }

    fn resolve(&self, specifier: &str) -> Result<PathBuf, ModuleError> {
        let relative = Path::new(specifier);
        let mut path = self.root.clone();
        for component in relative.components() {
            match component {
                Component::CurDir => {}
                Component::Normal(part) => path.push(part),
                _ => return Err(ModuleError::InvalidSpecifier(specifier.to_string())),
            }
        }
        if path == self.root {
            return Err(ModuleError::InvalidSpecifier(specifier.to_string()));
        }
        Ok(path)
    }
}
impl ModuleLoader for DirectoryModuleLoader {
    fn load_source(&self, specifier: &str) -> Result<String, ModuleError> {
        let path = self.resolve(specifier)?;
        trace!(path = %path.display(), "reading module");
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ModuleError::NotFound(specifier.to_string()),
            _ => ModuleError::Io {
                specifier: specifier.to_string(),
                source: e,
            },
        })
    }
}

/// Tries each loader in order. A loader that does not know the specifier passes it on.
pub struct CompositeModuleLoader {
    loaders: Vec<Box<dyn ModuleLoader>>,
}
impl CompositeModuleLoader {
    pub fn new(loaders: Vec<Box<dyn ModuleLoader>>) -> Self {
        CompositeModuleLoader { loaders }
    }
}
impl ModuleLoader for CompositeModuleLoader {
    fn load_source(&self, specifier: &str) -> Result<String, ModuleError> {
        for loader in &self.loaders {
            match loader.load_source(specifier) {
                Err(ModuleError::NotFound(_)) => continue,
                other => return other,
            }
        }
        Err(ModuleError::NotFound(specifier.to_string()))
    }
}
