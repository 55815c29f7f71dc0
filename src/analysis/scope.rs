//! Top-level names of one source file: its type declarations, its local
//! export lists and its imports.
//!
//! Signatures copy type text verbatim into the generated type file, so
//! every structural type they mention has to be traced back to the module
//! that declares it.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};

use super::parsed::{TSX, TYPESCRIPT};
use super::{ExportKind, ImportedName, ModuleRef, ParsedFile};
use crate::paths;

/// Tree-sitter query for import statements.
const IMPORT_QUERY: &str = r#"
(import_statement
  source: (string) @import_source
) @import
"#;

static IMPORT_QUERY_TS: Lazy<Query> =
    Lazy::new(|| Query::new(&TYPESCRIPT, IMPORT_QUERY).expect("import query is valid"));

static IMPORT_QUERY_TSX: Lazy<Query> =
    Lazy::new(|| Query::new(&TSX, IMPORT_QUERY).expect("import query is valid"));

/// Node kinds that declare a named type.
const TYPE_DECLARATIONS: &[&str] = &[
    "interface_declaration",
    "type_alias_declaration",
    "class_declaration",
    "abstract_class_declaration",
    "enum_declaration",
];

/// One imported local name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub imported: ImportedName,
    pub module: ModuleRef,
}

/// Where a type name used in a signature comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeOrigin<'a> {
    /// Declared in the same file.
    Local(ExportKind),
    /// Imported from another module.
    Imported(&'a ImportBinding),
    /// Builtin or ambient (`Date`, `Record`, ...); never imported.
    Global,
}

/// Top-level names of a parsed file.
#[derive(Debug, Default)]
pub struct FileScope {
    types: HashMap<String, ExportKind>,
    local_exports: HashMap<String, ExportKind>,
    imports: HashMap<String, ImportBinding>,
}

impl FileScope {
    /// Scan the top level of a parsed file.
    pub fn scan(parsed: &ParsedFile) -> Self {
        let mut scope = FileScope::default();
        let dir = parsed.path.parent().unwrap_or_else(|| Path::new("/"));

        scope.scan_imports(parsed, dir);

        let root = parsed.root();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "export_statement" => scope.scan_export(parsed, child),
                kind if TYPE_DECLARATIONS.contains(&kind) => {
                    if let Some(name) = child.child_by_field_name("name") {
                        scope
                            .types
                            .entry(parsed.node_text(name).to_string())
                            .or_insert(ExportKind::None);
                    }
                }
                _ => {}
            }
        }

        // `interface User {}` followed by `export { User }`
        for (name, kind) in &scope.local_exports {
            if let Some(existing) = scope.types.get_mut(name) {
                if !existing.is_exported() {
                    *existing = *kind;
                }
            }
        }

        scope
    }

    fn scan_imports(&mut self, parsed: &ParsedFile, dir: &Path) {
        let query: &Query = if parsed.path.extension().and_then(|e| e.to_str()) == Some("tsx") {
            &IMPORT_QUERY_TSX
        } else {
            &IMPORT_QUERY_TS
        };

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, parsed.root(), &parsed.source[..]);

        while let Some(m) = matches.next() {
            let mut import_node = None;
            let mut source = String::new();

            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "import" => import_node = Some(capture.node),
                    "import_source" => {
                        let raw = parsed.node_text(capture.node);
                        source = raw.trim_matches(|c| c == '"' || c == '\'').to_string();
                    }
                    _ => {}
                }
            }

            if let Some(node) = import_node {
                if !source.is_empty() {
                    let module = module_ref(dir, &source);
                    self.scan_import_clause(parsed, node, &module);
                }
            }
        }
    }

    fn scan_import_clause(&mut self, parsed: &ParsedFile, import: Node, module: &ModuleRef) {
        let mut cursor = import.walk();
        let Some(clause) = import
            .named_children(&mut cursor)
            .find(|c| c.kind() == "import_clause")
        else {
            return;
        };

        let mut clause_cursor = clause.walk();
        for child in clause.named_children(&mut clause_cursor) {
            match child.kind() {
                "identifier" => {
                    self.imports.insert(
                        parsed.node_text(child).to_string(),
                        ImportBinding {
                            imported: ImportedName::Default,
                            module: module.clone(),
                        },
                    );
                }
                "named_imports" => {
                    let mut spec_cursor = child.walk();
                    for spec in child.named_children(&mut spec_cursor) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let name = parsed.node_text(name).to_string();
                        let local = spec
                            .child_by_field_name("alias")
                            .map(|a| parsed.node_text(a).to_string())
                            .unwrap_or_else(|| name.clone());
                        let imported = if name == "default" {
                            ImportedName::Default
                        } else {
                            ImportedName::Named(name)
                        };
                        self.imports.insert(
                            local,
                            ImportBinding {
                                imported,
                                module: module.clone(),
                            },
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn scan_export(&mut self, parsed: &ParsedFile, export: Node) {
        let kind = export_kind_of(export);

        if let Some(decl) = export.child_by_field_name("declaration") {
            if TYPE_DECLARATIONS.contains(&decl.kind()) {
                if let Some(name) = decl.child_by_field_name("name") {
                    self.types.insert(parsed.node_text(name).to_string(), kind);
                }
            }
            return;
        }

        // export default User;
        if let Some(value) = export.child_by_field_name("value") {
            if value.kind() == "identifier" {
                self.local_exports
                    .insert(parsed.node_text(value).to_string(), ExportKind::Default);
            }
            return;
        }

        // export { a, b as c } without a `from` clause
        if export.child_by_field_name("source").is_some() {
            return;
        }
        let mut cursor = export.walk();
        for clause in export.named_children(&mut cursor) {
            if clause.kind() != "export_clause" {
                continue;
            }
            let mut spec_cursor = clause.walk();
            for spec in clause.named_children(&mut spec_cursor) {
                if spec.kind() != "export_specifier" {
                    continue;
                }
                let Some(name) = spec.child_by_field_name("name") else {
                    continue;
                };
                let exported_as = spec
                    .child_by_field_name("alias")
                    .map(|a| parsed.node_text(a));
                let kind = if exported_as == Some("default") {
                    ExportKind::Default
                } else {
                    ExportKind::Named
                };
                self.local_exports
                    .insert(parsed.node_text(name).to_string(), kind);
            }
        }
    }

    /// Export of a value binding, combining the declaration's own wrapper
    /// with later `export { name }` lists.
    pub fn export_of(&self, name: &str, declared: ExportKind) -> ExportKind {
        if declared.is_exported() {
            return declared;
        }
        self.local_exports
            .get(name)
            .copied()
            .unwrap_or(ExportKind::None)
    }

    /// Trace a type name used in a signature.
    pub fn resolve_type(&self, name: &str) -> TypeOrigin<'_> {
        if let Some(kind) = self.types.get(name) {
            return TypeOrigin::Local(*kind);
        }
        if let Some(binding) = self.imports.get(name) {
            return TypeOrigin::Imported(binding);
        }
        TypeOrigin::Global
    }
}

/// Whether an `export_statement` exports its declaration as default.
pub fn export_kind_of(export: Node) -> ExportKind {
    let mut cursor = export.walk();
    let is_default = export.children(&mut cursor).any(|c| c.kind() == "default");
    if is_default {
        ExportKind::Default
    } else {
        ExportKind::Named
    }
}

/// Resolve an import specifier relative to the importing file's directory.
fn module_ref(dir: &Path, specifier: &str) -> ModuleRef {
    if specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".." {
        ModuleRef::File(paths::normalize(&dir.join(specifier)))
    } else {
        ModuleRef::Package(specifier.to_string())
    }
}

/// Type identifiers mentioned in a type node, in source order, without
/// duplicates. Qualified names (`models.User`) are skipped.
pub fn referenced_type_names(parsed: &ParsedFile, ty: Node) -> Vec<String> {
    let mut names = Vec::new();
    collect_type_names(parsed, ty, &mut names);
    names
}

fn collect_type_names(parsed: &ParsedFile, node: Node, out: &mut Vec<String>) {
    match node.kind() {
        "nested_type_identifier" => return,
        "type_identifier" => {
            let name = parsed.node_text(node).to_string();
            if !out.contains(&name) {
                out.push(name);
            }
            return;
        }
        _ => {}
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_type_names(parsed, child, out);
    }
}
