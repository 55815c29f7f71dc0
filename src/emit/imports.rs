//! Import specifiers and import statement sets for generated files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::analysis::{ImportedName, ModuleRef};
use crate::error::{Error, Result};
use crate::paths;

/// Maps module references to specifiers relative to one output file.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    output_dir: PathBuf,
}

impl ImportResolver {
    /// `output_file` must be absolute.
    pub fn new(output_file: &Path) -> Self {
        let output_dir = output_file
            .parent()
            .map(paths::normalize)
            .unwrap_or_default();
        Self { output_dir }
    }

    pub fn specifier(&self, module: &ModuleRef) -> String {
        match module {
            ModuleRef::File(path) => paths::to_specifier(&paths::relative(&self.output_dir, path)),
            ModuleRef::Package(spec) => spec.clone(),
        }
    }
}

/// Import statements of one generated file.
///
/// Bindings are keyed by local name, so a name can only be bound once per
/// file. Rendering groups bindings by specifier.
#[derive(Debug, Clone)]
pub struct ImportSet {
    output: String,
    type_only: bool,
    bindings: BTreeMap<String, (String, ImportedName)>,
}

impl ImportSet {
    /// Value imports for the output named `output` (used in errors).
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            type_only: false,
            bindings: BTreeMap::new(),
        }
    }

    /// `import type` statements.
    pub fn type_only(output: impl Into<String>) -> Self {
        Self {
            type_only: true,
            ..Self::new(output)
        }
    }

    /// Bind `local` to `imported` from `specifier`. Re-adding the same
    /// binding is a no-op; binding the name to anything else is an error.
    pub fn add(&mut self, local: &str, imported: ImportedName, specifier: &str) -> Result<()> {
        if let Some((existing_spec, existing)) = self.bindings.get(local) {
            if existing_spec == specifier && *existing == imported {
                return Ok(());
            }
            return Err(Error::ImportCollision {
                name: local.to_string(),
                output: self.output.clone(),
                first: describe(existing, existing_spec),
                second: describe(&imported, specifier),
            });
        }

        self.bindings
            .insert(local.to_string(), (specifier.to_string(), imported));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// One statement per specifier. Package specifiers come before relative
    /// ones; each group is sorted by specifier, names by local name.
    pub fn render(&self) -> Vec<String> {
        let mut by_specifier: BTreeMap<(bool, &str), Vec<String>> = BTreeMap::new();
        for (local, (specifier, imported)) in &self.bindings {
            let entry = match imported {
                ImportedName::Named(name) if name == local => local.clone(),
                ImportedName::Named(name) => format!("{} as {}", name, local),
                ImportedName::Default => format!("default as {}", local),
            };
            by_specifier
                .entry((specifier.starts_with('.'), specifier.as_str()))
                .or_default()
                .push(entry);
        }

        let keyword = if self.type_only { "import type" } else { "import" };
        by_specifier
            .into_iter()
            .map(|((_, specifier), names)| {
                format!("{} {{ {} }} from '{}';", keyword, names.join(", "), specifier)
            })
            .collect()
    }
}

fn describe(imported: &ImportedName, specifier: &str) -> String {
    match imported {
        ImportedName::Named(name) => format!("'{}' (export {})", specifier, name),
        ImportedName::Default => format!("'{}' (default export)", specifier),
    }
}
