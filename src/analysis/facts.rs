//! Canonical records produced by declaration extraction.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// How a binding is exported from its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// `export function f` / `export class C` / `export const f`
    Named,
    /// `export default function f` / `export default class C`
    Default,
    /// Not exported.
    None,
}

impl ExportKind {
    pub fn is_exported(&self) -> bool {
        !matches!(self, ExportKind::None)
    }
}

/// Classified return type of an exposed declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "type", rename_all = "snake_case")]
pub enum ReturnShape {
    /// Plain value returned synchronously.
    Value(String),
    /// `Promise<T>`
    AsyncValue(String),
    /// `AsyncGenerator<T>` and friends; holds the element type.
    AsyncStream(String),
}

impl ReturnShape {
    pub fn is_stream(&self) -> bool {
        matches!(self, ReturnShape::AsyncStream(_))
    }

    /// The value or element type text.
    pub fn inner_type(&self) -> &str {
        match self {
            ReturnShape::Value(t) | ReturnShape::AsyncValue(t) | ReturnShape::AsyncStream(t) => t,
        }
    }
}

/// One parameter of an exposed declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Identifier used in generated code.
    pub name: String,
    /// Declared type text, verbatim; `any` when absent.
    pub type_text: String,
    /// `name?: T` or a parameter with a default value.
    pub optional: bool,
    /// `...name: T`
    pub rest: bool,
}

/// The module a referenced name is imported from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ModuleRef {
    /// A source file, absolute and lexically normalized. The extension may
    /// be missing when the reference came from an import specifier.
    File(PathBuf),
    /// A bare package specifier, used verbatim.
    Package(String),
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleRef::File(path) => write!(f, "{}", path.display()),
            ModuleRef::Package(spec) => write!(f, "{}", spec),
        }
    }
}

/// Which export of a module a local name refers to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ImportedName {
    Named(String),
    Default,
}

/// A structural type referenced from a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeRef {
    /// Name used in the signature text.
    pub local: String,
    pub imported: ImportedName,
    pub module: ModuleRef,
}

/// A declaration marked for exposure, in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExposedMethod {
    pub namespace: String,
    pub method_name: String,
    /// Present iff the declaration is an instance method.
    pub class_name: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_shape: ReturnShape,
    pub source_file: PathBuf,
    /// 1-indexed line of the declaration.
    pub line: usize,
    /// Export of the owner binding (the class for methods).
    pub export: ExportKind,
    pub type_refs: Vec<TypeRef>,
}

impl ExposedMethod {
    /// Channel key shared by the backend and bridge files.
    pub fn key(&self) -> String {
        format!("{}:{}", self.namespace, self.method_name)
    }

    /// `Class.method` for methods, the bare name otherwise.
    pub fn qualifier(&self) -> String {
        match &self.class_name {
            Some(class) => format!("{}.{}", class, self.method_name),
            None => self.method_name.clone(),
        }
    }

    /// Name the backend file imports from the source module.
    pub fn owner_binding(&self) -> &str {
        self.class_name.as_deref().unwrap_or(&self.method_name)
    }

    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    /// `path:line` for messages.
    pub fn location(&self) -> String {
        format!("{}:{}", self.source_file.display(), self.line)
    }
}
