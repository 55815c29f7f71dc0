//! Configuration file schema for bridgegen.
//!
//! A configuration names the sources to scan, the three generated files and
//! the runtime modules the generated code calls into.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{is_camel_case, is_identifier, DEFAULT_ANNOTATION};
use crate::error::{Error, Result};
use crate::paths;

/// File name looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE: &str = "bridgegen.yaml";

/// Starter configuration written by `bridgegen init`.
pub const INIT_TEMPLATE: &str = include_str!("templates/bridgegen.yaml");

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Root of the project, relative to the configuration file.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    /// Namespace used by bare annotations (default: "api")
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    /// Decorator / comment tag name (default: "expose")
    #[serde(default = "default_annotation")]
    pub annotation: String,
    /// Glob patterns of sources to scan, relative to `baseDir`
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub outputs: Outputs,
    #[serde(default)]
    pub runtime: Runtime,
    /// Directory the configuration was loaded from.
    #[serde(skip)]
    root: PathBuf,
}

/// Paths of the generated files, relative to `baseDir`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Outputs {
    #[serde(default = "default_backend_output")]
    pub backend: PathBuf,
    #[serde(default = "default_bridge_output")]
    pub bridge: PathBuf,
    #[serde(default = "default_types_output")]
    pub types: PathBuf,
}

impl Default for Outputs {
    fn default() -> Self {
        Self {
            backend: default_backend_output(),
            bridge: default_bridge_output(),
            types: default_types_output(),
        }
    }
}

impl Outputs {
    /// The three outputs as `(name, path)` pairs, in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Path)> {
        [
            ("backend", self.backend.as_path()),
            ("bridge", self.bridge.as_path()),
            ("types", self.types.as_path()),
        ]
        .into_iter()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.iter().any(|(_, p)| p == path)
    }
}

/// Module specifiers of the messaging runtime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Runtime {
    #[serde(default = "default_backend_runtime")]
    pub backend: String,
    #[serde(default = "default_bridge_runtime")]
    pub bridge: String,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            backend: default_backend_runtime(),
            bridge: default_bridge_runtime(),
        }
    }
}

fn default_namespace() -> String {
    "api".to_string()
}

fn default_annotation() -> String {
    DEFAULT_ANNOTATION.to_string()
}

fn default_include() -> Vec<String> {
    vec!["src/**/*.ts".to_string(), "src/**/*.tsx".to_string()]
}

fn default_backend_output() -> PathBuf {
    PathBuf::from("src/main/bridge.generated.ts")
}

fn default_bridge_output() -> PathBuf {
    PathBuf::from("src/preload/bridge.generated.ts")
}

fn default_types_output() -> PathBuf {
    PathBuf::from("src/renderer/bridge.generated.d.ts")
}

fn default_backend_runtime() -> String {
    "@bridgegen/runtime/backend".to_string()
}

fn default_bridge_runtime() -> String {
    "@bridgegen/runtime/bridge".to_string()
}

impl Config {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: &Path) -> Self {
        Self {
            base_dir: None,
            default_namespace: default_namespace(),
            annotation: default_annotation(),
            include: default_include(),
            exclude: Vec::new(),
            outputs: Outputs::default(),
            runtime: Runtime::default(),
            root: paths::normalize(root),
        }
    }

    /// Parse and validate YAML text; relative paths resolve against `root`.
    pub fn from_yaml(text: &str, root: &Path) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(text)?;
        config.root = paths::normalize(root);
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file. `path` must be absolute.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let root = path.parent().unwrap_or_else(|| Path::new("/"));
        Self::from_yaml(&text, root)
    }

    /// Absolute project root.
    pub fn base_dir(&self) -> PathBuf {
        match &self.base_dir {
            Some(dir) => paths::absolutize(&self.root, dir),
            None => self.root.clone(),
        }
    }

    /// Output paths made absolute against the project root.
    pub fn resolved_outputs(&self) -> Outputs {
        let base = self.base_dir();
        Outputs {
            backend: paths::absolutize(&base, &self.outputs.backend),
            bridge: paths::absolutize(&base, &self.outputs.bridge),
            types: paths::absolutize(&base, &self.outputs.types),
        }
    }

    pub fn include_set(&self) -> Result<GlobSet> {
        build_glob_set(&self.include)
    }

    pub fn exclude_set(&self) -> Result<GlobSet> {
        build_glob_set(&self.exclude)
    }

    /// Check the configuration for correctness.
    pub fn validate(&self) -> Result<()> {
        if !is_camel_case(&self.default_namespace) {
            return Err(Error::Config(format!(
                "defaultNamespace {:?} must be camelCase",
                self.default_namespace
            )));
        }

        if !is_identifier(&self.annotation) {
            return Err(Error::Config(format!(
                "annotation {:?} must be an identifier",
                self.annotation
            )));
        }

        let outputs = self.resolved_outputs();
        if outputs.backend == outputs.bridge
            || outputs.backend == outputs.types
            || outputs.bridge == outputs.types
        {
            return Err(Error::Config(
                "outputs.backend, outputs.bridge and outputs.types must be distinct files".to_string(),
            ));
        }

        for (name, value) in [("backend", &self.runtime.backend), ("bridge", &self.runtime.bridge)] {
            if value.trim().is_empty() || value.contains('\'') {
                return Err(Error::Config(format!(
                    "runtime.{} {:?} is not a usable module specifier",
                    name, value
                )));
            }
        }

        self.include_set()?;
        self.exclude_set()?;
        Ok(())
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
