//! Engine configuration, loadable from a TOML file.
//!
//! ```toml
//! max_call_depth = 200
//! max_steps = 1000000
//! strict_scripts = false
//! log_level = "warn"
//!
//! [modules]
//! root = "./modules"
//!
//! [modules.sources]
//! "math" = "export function square(x) { return x * x; }"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runner::module::loader::{
    CompositeModuleLoader, DirectoryModuleLoader, InMemoryModuleLoader,
};
use crate::runner::module::ModuleLoader;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Nested calls allowed before a RangeError is thrown.
    pub max_call_depth: usize,
    /// Statements a single host call may execute. Unlimited when absent.
    pub max_steps: Option<u64>,
    /// Evaluate host scripts as strict code even without a "use strict" directive.
    pub strict_scripts: bool,
    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub log_level: String,
    pub modules: ModulesConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Directory that relative module specifiers are resolved against.
    pub root: Option<PathBuf>,
    /// Inline module sources, by specifier. These win over files under `root`.
    pub sources: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_call_depth: 200,
            max_steps: None,
            strict_scripts: false,
            log_level: "warn".to_string(),
            modules: ModulesConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// The module loader described by the `[modules]` table.
    pub fn module_loader(&self) -> Rc<dyn ModuleLoader> {
        let inline = InMemoryModuleLoader::from(self.modules.sources.clone());
        match &self.modules.root {
            Some(root) => Rc::new(CompositeModuleLoader::new(vec![
                Box::new(inline),
                Box::new(DirectoryModuleLoader::new(root.clone())),
            ])),
            None => Rc::new(inline),
        }
    }
}
