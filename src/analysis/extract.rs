//! Declaration extraction.
//!
//! Walks the top level of one parsed file and turns every exposed
//! declaration into an [`ExposedMethod`]. Three declaration shapes are
//! recognized and funnelled through the same conversion:
//!
//! ```text
//! class UserService { @expose('userAPI') getUser(id: number) {} }   // method
//! /** @expose systemAPI */ export function getSystemInfo() {}       // function
//! /** @expose */ export const ping = async () => 'pong';            // binding
//! ```
//!
//! Problems with a single declaration are reported to the sink and the
//! declaration is dropped; extraction itself never fails.

use std::collections::HashSet;

use tree_sitter::Node;

use super::annotation;
use super::scope::{export_kind_of, referenced_type_names, FileScope, TypeOrigin};
use super::shape;
use super::{ExportKind, ExposedMethod, ImportedName, ModuleRef, Parameter, ParsedFile, TypeRef};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};

/// Annotation name used when none is configured.
pub const DEFAULT_ANNOTATION: &str = "expose";

/// Extracts exposed declarations from parsed files.
#[derive(Debug, Clone)]
pub struct Extractor {
    default_namespace: String,
    annotation: String,
}

/// Class enclosing a method candidate.
struct ClassContext {
    name: String,
    export: ExportKind,
    is_abstract: bool,
    type_params: Vec<String>,
    needs_constructor_args: bool,
}

/// A declaration that might be exposed.
enum Candidate<'t, 'c> {
    Method {
        class: &'c ClassContext,
        node: Node<'t>,
    },
    Function {
        node: Node<'t>,
        export: ExportKind,
        anchor: Node<'t>,
    },
    Binding {
        declarator: Node<'t>,
        value: Node<'t>,
        export: ExportKind,
        anchor: Node<'t>,
    },
}

impl<'t, 'c> Candidate<'t, 'c> {
    /// Node carrying `parameters`, `return_type` and `type_parameters`.
    fn function_node(&self) -> Node<'t> {
        match self {
            Candidate::Method { node, .. } | Candidate::Function { node, .. } => *node,
            Candidate::Binding { value, .. } => *value,
        }
    }

    fn name_node(&self) -> Option<Node<'t>> {
        match self {
            Candidate::Method { node, .. } | Candidate::Function { node, .. } => {
                node.child_by_field_name("name")
            }
            Candidate::Binding { declarator, .. } => declarator.child_by_field_name("name"),
        }
    }

    fn class(&self) -> Option<&'c ClassContext> {
        match self {
            Candidate::Method { class, .. } => Some(*class),
            _ => None,
        }
    }

    fn declared_export(&self) -> ExportKind {
        match self {
            Candidate::Method { class, .. } => class.export,
            Candidate::Function { export, .. } | Candidate::Binding { export, .. } => *export,
        }
    }

    fn line(&self) -> usize {
        let node = match self {
            Candidate::Method { node, .. } | Candidate::Function { node, .. } => *node,
            Candidate::Binding { declarator, .. } => *declarator,
        };
        node.start_position().row + 1
    }

    fn is_async(&self) -> bool {
        has_token(self.function_node(), "async")
    }

    fn is_generator(&self) -> bool {
        let func = self.function_node();
        matches!(
            func.kind(),
            "generator_function_declaration" | "generator_function"
        ) || has_token(func, "*")
    }

    /// Decorators and attached comments.
    fn annotation_nodes(&self) -> (Vec<Node<'t>>, Vec<Node<'t>>) {
        match self {
            Candidate::Method { node, .. } => {
                let mut cursor = node.walk();
                let mut decorators: Vec<Node> =
                    node.children_by_field_name("decorator", &mut cursor).collect();
                let mut comments = Vec::new();

                // Decorators and comments preceding the member in the class body.
                let mut prev = node.prev_named_sibling();
                while let Some(sibling) = prev {
                    match sibling.kind() {
                        "decorator" => decorators.push(sibling),
                        "comment" if !is_trailing_comment(sibling) => comments.push(sibling),
                        _ => break,
                    }
                    prev = sibling.prev_named_sibling();
                }
                (decorators, comments)
            }
            Candidate::Function { anchor, .. } | Candidate::Binding { anchor, .. } => {
                (Vec::new(), leading_comments(*anchor))
            }
        }
    }

    /// Why this declaration cannot be exposed, if it cannot.
    fn unsupported_reason(&self, parsed: &ParsedFile) -> Option<String> {
        if let Candidate::Method { class, node } = self {
            if class.is_abstract {
                return Some(format!("abstract class {} cannot be instantiated", class.name));
            }
            if has_token(*node, "static") {
                return Some("static methods cannot be exposed".to_string());
            }
            if let Some(modifier) = accessibility(parsed, *node) {
                if modifier != "public" {
                    return Some(format!("{} methods cannot be exposed", modifier));
                }
            }
            if has_token(*node, "get") || has_token(*node, "set") {
                return Some("accessors cannot be exposed".to_string());
            }
            match self.name_node().map(|n| n.kind()) {
                Some("property_identifier") => {}
                Some("private_property_identifier") => {
                    return Some("private #methods cannot be exposed".to_string())
                }
                _ => {
                    return Some(format!(
                        "method name `{}` is not a plain identifier",
                        self.name_node().map(|n| parsed.node_text(n)).unwrap_or("")
                    ))
                }
            }
        }
        if self.is_generator() && !self.is_async() {
            return Some("synchronous generators cannot be exposed".to_string());
        }
        None
    }
}

impl Extractor {
    /// Create an extractor resolving bare annotations to `default_namespace`.
    pub fn new(default_namespace: impl Into<String>) -> Self {
        Self {
            default_namespace: default_namespace.into(),
            annotation: DEFAULT_ANNOTATION.to_string(),
        }
    }

    /// Use a different decorator / comment tag name.
    pub fn annotation(mut self, name: impl Into<String>) -> Self {
        self.annotation = name.into();
        self
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Extract all exposed declarations of a parsed file.
    pub fn extract(&self, parsed: &ParsedFile, sink: &mut dyn DiagnosticSink) -> Vec<ExposedMethod> {
        let scope = FileScope::scan(parsed);
        let root = parsed.root();
        let mut methods = Vec::new();

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            let (decl, export) = if child.kind() == "export_statement" {
                match child.child_by_field_name("declaration") {
                    Some(decl) => (decl, export_kind_of(child)),
                    None => continue,
                }
            } else {
                (child, ExportKind::None)
            };

            match decl.kind() {
                "function_declaration" | "generator_function_declaration" => {
                    let candidate = Candidate::Function {
                        node: decl,
                        export,
                        anchor: child,
                    };
                    methods.extend(self.process(parsed, &scope, &candidate, sink));
                }
                "class_declaration" | "abstract_class_declaration" => {
                    self.extract_class(parsed, &scope, decl, export, sink, &mut methods);
                }
                "lexical_declaration" | "variable_declaration" => {
                    let mut decl_cursor = decl.walk();
                    for declarator in decl.named_children(&mut decl_cursor) {
                        if declarator.kind() != "variable_declarator" {
                            continue;
                        }
                        let Some(value) = declarator.child_by_field_name("value") else {
                            continue;
                        };
                        if !matches!(
                            value.kind(),
                            "arrow_function" | "function_expression" | "function" | "generator_function"
                        ) {
                            continue;
                        }
                        let candidate = Candidate::Binding {
                            declarator,
                            value,
                            export,
                            anchor: child,
                        };
                        methods.extend(self.process(parsed, &scope, &candidate, sink));
                    }
                }
                _ => {}
            }
        }

        tracing::debug!(
            file = %parsed.path.display(),
            count = methods.len(),
            "extracted exposed declarations"
        );
        methods
    }

    fn extract_class(
        &self,
        parsed: &ParsedFile,
        scope: &FileScope,
        decl: Node,
        export: ExportKind,
        sink: &mut dyn DiagnosticSink,
        methods: &mut Vec<ExposedMethod>,
    ) {
        let (Some(name), Some(body)) = (
            decl.child_by_field_name("name"),
            decl.child_by_field_name("body"),
        ) else {
            return;
        };

        let class_name = parsed.node_text(name).to_string();
        let class = ClassContext {
            export: scope.export_of(&class_name, export),
            name: class_name,
            is_abstract: decl.kind() == "abstract_class_declaration",
            type_params: type_parameter_names(parsed, decl),
            needs_constructor_args: constructor_needs_args(parsed, body),
        };

        let before = methods.len();
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            if member.kind() != "method_definition" {
                continue;
            }
            if member
                .child_by_field_name("name")
                .map(|n| parsed.node_text(n) == "constructor")
                .unwrap_or(false)
            {
                continue;
            }
            let candidate = Candidate::Method {
                class: &class,
                node: member,
            };
            methods.extend(self.process(parsed, scope, &candidate, sink));
        }

        if class.needs_constructor_args && methods.len() > before {
            sink.push(
                Diagnostic::new(
                    DiagnosticCode::ConstructorArguments,
                    parsed.display_path(),
                    decl.start_position().row + 1,
                    format!(
                        "constructor of {} takes required arguments; the generated `new {}()` will not supply them",
                        class.name, class.name
                    ),
                )
                .with_qualifier(class.name.clone()),
            );
        }
    }

    /// Turn one candidate into a record, or report why it was dropped.
    fn process(
        &self,
        parsed: &ParsedFile,
        scope: &FileScope,
        candidate: &Candidate,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<ExposedMethod> {
        let (decorators, comments) = candidate.annotation_nodes();
        let line = candidate.line();
        let name = candidate
            .name_node()
            .map(|n| parsed.node_text(n).to_string())
            .unwrap_or_default();
        let qualifier = match candidate.class() {
            Some(class) => format!("{}.{}", class.name, name),
            None => name.clone(),
        };
        let file = parsed.display_path();
        let warn = |code: DiagnosticCode, message: String| {
            Diagnostic::new(code, file.clone(), line, message).with_qualifier(qualifier.clone())
        };

        let annotation = match annotation::read(parsed, &decorators, &comments, &self.annotation) {
            Ok(Some(annotation)) => annotation,
            Ok(None) => return None,
            Err(reason) => {
                sink.push(warn(DiagnosticCode::MalformedAnnotation, reason));
                return None;
            }
        };

        if let Some(reason) = candidate.unsupported_reason(parsed) {
            sink.push(warn(DiagnosticCode::UnsupportedDeclaration, reason));
            return None;
        }

        let namespace = annotation.resolve(&self.default_namespace).to_string();
        if !annotation::is_camel_case(&namespace) {
            sink.push(warn(
                DiagnosticCode::InvalidNamespace,
                format!("namespace '{}' must be camelCase (e.g. 'userAPI')", namespace),
            ));
            return None;
        }

        let func = candidate.function_node();
        let is_async = candidate.is_async();
        let is_generator = candidate.is_generator();
        let return_type = func
            .child_by_field_name("return_type")
            .and_then(|annotation| annotation.named_child(0));

        let return_shape = match return_type {
            Some(ty) => {
                let shape = shape::classify(parsed, ty);
                if let Err(reason) = shape::check(&shape, is_async, is_generator) {
                    sink.push(warn(DiagnosticCode::UnsupportedReturnType, reason));
                    return None;
                }
                shape
            }
            None => shape::unannotated(is_async, is_generator),
        };

        let parameters = extract_parameters(parsed, func);

        // Type parameters are not imported.
        let mut type_params = type_parameter_names(parsed, func);
        if let Some(class) = candidate.class() {
            type_params.extend(class.type_params.iter().cloned());
        }

        let mut type_nodes = parameter_type_nodes(func);
        type_nodes.extend(return_type);

        let mut type_refs: Vec<TypeRef> = Vec::new();
        let mut seen = HashSet::new();
        for node in type_nodes {
            for type_name in referenced_type_names(parsed, node) {
                if type_params.contains(&type_name) || !seen.insert(type_name.clone()) {
                    continue;
                }
                match scope.resolve_type(&type_name) {
                    TypeOrigin::Local(kind) => {
                        if !kind.is_exported() {
                            sink.push(warn(
                                DiagnosticCode::TypeNotExported,
                                format!(
                                    "type {} is used in an exposed signature but is not exported",
                                    type_name
                                ),
                            ));
                        }
                        let imported = if kind == ExportKind::Default {
                            ImportedName::Default
                        } else {
                            ImportedName::Named(type_name.clone())
                        };
                        type_refs.push(TypeRef {
                            local: type_name,
                            imported,
                            module: ModuleRef::File(parsed.path.clone()),
                        });
                    }
                    TypeOrigin::Imported(binding) => type_refs.push(TypeRef {
                        local: type_name,
                        imported: binding.imported.clone(),
                        module: binding.module.clone(),
                    }),
                    TypeOrigin::Global => {}
                }
            }
        }

        let binding = candidate
            .class()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| name.clone());
        let export = match candidate.class() {
            Some(class) => class.export,
            None => scope.export_of(&binding, candidate.declared_export()),
        };
        if !export.is_exported() {
            sink.push(warn(
                DiagnosticCode::NotExported,
                format!(
                    "{} is not exported; the generated backend import will not resolve",
                    binding
                ),
            ));
        }

        Some(ExposedMethod {
            namespace,
            method_name: name,
            class_name: candidate.class().map(|c| c.name.clone()),
            parameters,
            return_shape,
            source_file: parsed.path.clone(),
            line,
            export,
            type_refs,
        })
    }
}

/// Whether `node` has an anonymous child token of the given kind.
fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

/// Text of a member's `public`/`private`/`protected` modifier.
fn accessibility<'p>(parsed: &'p ParsedFile, node: Node) -> Option<&'p str> {
    let mut cursor = node.walk();
    let modifier = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "accessibility_modifier")
        .map(|c| parsed.node_text(c));
    modifier
}

/// A comment on the same line as the end of the preceding sibling belongs
/// to that sibling.
fn is_trailing_comment(comment: Node) -> bool {
    comment
        .prev_sibling()
        .map(|prev| prev.kind() != "comment" && prev.end_position().row == comment.start_position().row)
        .unwrap_or(false)
}

/// The run of comments directly preceding `node`.
fn leading_comments(node: Node) -> Vec<Node> {
    let mut comments = Vec::new();
    let mut prev = node.prev_named_sibling();
    while let Some(sibling) = prev {
        if sibling.kind() != "comment" || is_trailing_comment(sibling) {
            break;
        }
        comments.push(sibling);
        prev = sibling.prev_named_sibling();
    }
    comments
}

fn type_parameter_names(parsed: &ParsedFile, node: Node) -> Vec<String> {
    let Some(params) = node.child_by_field_name("type_parameters") else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    let names = params
        .named_children(&mut cursor)
        .filter(|p| p.kind() == "type_parameter")
        .filter_map(|p| p.child_by_field_name("name"))
        .map(|n| parsed.node_text(n).to_string())
        .collect();
    names
}

fn parameter_nodes(func: Node) -> Vec<Node> {
    if let Some(single) = func.child_by_field_name("parameter") {
        return vec![single];
    }
    let Some(params) = func.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    let nodes = params
        .named_children(&mut cursor)
        .filter(|p| matches!(p.kind(), "required_parameter" | "optional_parameter"))
        .collect();
    nodes
}

fn parameter_type_nodes(func: Node) -> Vec<Node> {
    parameter_nodes(func)
        .into_iter()
        .filter_map(|p| p.child_by_field_name("type"))
        .filter_map(|annotation| annotation.named_child(0))
        .collect()
}

fn extract_parameters(parsed: &ParsedFile, func: Node) -> Vec<Parameter> {
    let mut parameters = Vec::new();

    for node in parameter_nodes(func) {
        // `x => ...` has a bare identifier as its only parameter.
        if node.kind() == "identifier" {
            parameters.push(Parameter {
                name: parsed.node_text(node).to_string(),
                type_text: shape::UNKNOWN_TYPE.to_string(),
                optional: false,
                rest: false,
            });
            continue;
        }

        let Some(pattern) = node.child_by_field_name("pattern") else {
            continue;
        };
        if pattern.kind() == "this" {
            continue;
        }

        let index = parameters.len();
        let (name, rest) = match pattern.kind() {
            "identifier" => (parsed.node_text(pattern).to_string(), false),
            "rest_pattern" => {
                let name = pattern
                    .named_child(0)
                    .filter(|n| n.kind() == "identifier")
                    .map(|n| parsed.node_text(n).to_string())
                    .unwrap_or_else(|| format!("arg{}", index));
                (name, true)
            }
            _ => (format!("arg{}", index), false),
        };

        let type_text = node
            .child_by_field_name("type")
            .and_then(|annotation| annotation.named_child(0))
            .map(|ty| parsed.node_text(ty).to_string())
            .unwrap_or_else(|| shape::UNKNOWN_TYPE.to_string());

        parameters.push(Parameter {
            name,
            type_text,
            optional: node.kind() == "optional_parameter" || node.child_by_field_name("value").is_some(),
            rest,
        });
    }

    parameters
}

/// Whether the class constructor declares parameters without defaults.
fn constructor_needs_args(parsed: &ParsedFile, body: Node) -> bool {
    let mut cursor = body.walk();
    let constructor = body.named_children(&mut cursor).find(|m| {
        m.kind() == "method_definition"
            && m.child_by_field_name("name")
                .map(|n| parsed.node_text(n) == "constructor")
                .unwrap_or(false)
    });

    match constructor {
        Some(ctor) => parameter_nodes(ctor).iter().any(|p| {
            p.kind() == "required_parameter"
                && p.child_by_field_name("value").is_none()
                && p.child_by_field_name("pattern")
                    .map(|pat| pat.kind() != "rest_pattern")
                    .unwrap_or(true)
        }),
        None => false,
    }
}
