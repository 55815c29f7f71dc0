//! Error types for batch-level failures.
//!
//! Per-declaration and per-file problems are reported as diagnostics and
//! never surface here. Everything in this enum aborts the generation run.
//! Only [`Error::Write`] can happen after some outputs were replaced.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("duplicate exposed method '{namespace}:{method}' declared at {first} and {second}")]
    DuplicateMethod {
        namespace: String,
        method: String,
        first: String,
        second: String,
    },

    #[error("namespace '{namespace}' is owned by more than one class: {}", .classes.join(", "))]
    AmbiguousOwner {
        namespace: String,
        classes: Vec<String>,
    },

    #[error("'{name}' would be imported in {output} from both {first} and {second}")]
    ImportCollision {
        name: String,
        output: String,
        first: String,
        second: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Whether the run failed before any output file was replaced.
    pub fn outputs_untouched(&self) -> bool {
        !matches!(self, Error::Write { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
