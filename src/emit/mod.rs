//! Rendering of the three generated files.
//!
//! Every emitter is a pure function of the registry and the configured
//! paths. Namespaces and methods are always visited in registry order, so
//! the backend, bridge and type files agree on spelling and parameter
//! lists.

pub mod backend;
pub mod bridge;
pub mod imports;
pub mod types;

pub use imports::{ImportResolver, ImportSet};

use std::path::Path;

use crate::config::{Outputs, Runtime};
use crate::error::Result;
use crate::registry::MethodRegistry;

/// First lines of every generated file.
pub const HEADER: &str = "// This file is generated by bridgegen. Do not edit it by hand.\n// Regenerate with `bridgegen generate`.";

/// Contents of the three generated files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub backend: String,
    pub bridge: String,
    pub types: String,
}

impl Rendered {
    /// Pair each rendered text with its output path.
    pub fn files<'a>(&'a self, outputs: &'a Outputs) -> [(&'a Path, &'a str); 3] {
        [
            (outputs.backend.as_path(), self.backend.as_str()),
            (outputs.bridge.as_path(), self.bridge.as_str()),
            (outputs.types.as_path(), self.types.as_str()),
        ]
    }
}

/// Render all three files. `outputs` must be absolute.
pub fn render_all(registry: &MethodRegistry, outputs: &Outputs, runtime: &Runtime) -> Result<Rendered> {
    Ok(Rendered {
        backend: backend::render(registry, &outputs.backend, &runtime.backend)?,
        bridge: bridge::render(registry, &runtime.bridge)?,
        types: types::render(registry, &outputs.types)?,
    })
}

/// Join non-empty blocks with a blank line and end with a newline.
fn join_blocks(blocks: Vec<String>) -> String {
    let mut out = blocks
        .into_iter()
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

/// Single-quoted string literal.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Name of an output for error messages.
fn output_label(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_blocks() {
        let text = join_blocks(vec!["a".into(), String::new(), "b\nc".into()]);
        assert_eq!(text, "a\n\nb\nc\n");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("userAPI:getUser"), "'userAPI:getUser'");
        assert_eq!(quote("it's"), "'it\\'s'");
    }
}
