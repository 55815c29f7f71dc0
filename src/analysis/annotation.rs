//! Reading `expose` annotations.
//!
//! Two surfaces mark a declaration as exposed:
//! - a decorator: `@expose`, `@expose()`, `@expose('userAPI')`
//! - a comment tag: `/** @expose userAPI */` or bare `// @expose`
//!
//! Bare forms carry no namespace and fall back to the caller's default.

use lazy_static::lazy_static;
use regex::Regex;
use tree_sitter::Node;

use super::ParsedFile;

lazy_static! {
    static ref CAMEL_CASE: Regex = Regex::new(r"^[a-z][a-zA-Z0-9]*$").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

/// Whether a namespace satisfies the camelCase predicate.
pub fn is_camel_case(s: &str) -> bool {
    CAMEL_CASE.is_match(s)
}

/// Whether a string is a plain JavaScript identifier.
pub fn is_identifier(s: &str) -> bool {
    IDENTIFIER.is_match(s)
}

/// An expose annotation found on a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Explicit namespace, `None` for the bare form.
    pub namespace: Option<String>,
}

impl Annotation {
    /// Resolve the namespace against the caller's default.
    pub fn resolve<'a>(&'a self, default_namespace: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(default_namespace)
    }
}

/// Read the expose annotation from a declaration's decorators and
/// attached comments.
///
/// Returns `Ok(None)` when the declaration is not annotated and `Err` with
/// a reason when an annotation is present but cannot be understood.
pub fn read(
    parsed: &ParsedFile,
    decorators: &[Node],
    comments: &[Node],
    name: &str,
) -> Result<Option<Annotation>, String> {
    let mut found = Vec::new();

    for decorator in decorators {
        if let Some(result) = decorator_annotation(parsed, *decorator, name) {
            found.push(result?);
        }
    }
    for comment in comments {
        found.extend(comment_annotations(parsed.node_text(*comment), name));
    }

    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        n => Err(format!("found {} @{} annotations, expected one", n, name)),
    }
}

/// Interpret one decorator node. `None` when it is some other decorator.
fn decorator_annotation(
    parsed: &ParsedFile,
    decorator: Node,
    name: &str,
) -> Option<Result<Annotation, String>> {
    let expr = decorator.named_child(0)?;

    match expr.kind() {
        "identifier" if parsed.node_text(expr) == name => {
            Some(Ok(Annotation { namespace: None }))
        }
        "call_expression" => {
            let function = expr.child_by_field_name("function")?;
            if function.kind() != "identifier" || parsed.node_text(function) != name {
                return None;
            }

            let args: Vec<Node> = match expr.child_by_field_name("arguments") {
                Some(arguments) => {
                    let mut cursor = arguments.walk();
                    arguments
                        .named_children(&mut cursor)
                        .filter(|n| n.kind() != "comment")
                        .collect()
                }
                None => Vec::new(),
            };

            match args.as_slice() {
                [] => Some(Ok(Annotation { namespace: None })),
                [arg] => Some(
                    string_literal(parsed, *arg)
                        .map(|ns| Annotation {
                            namespace: Some(ns),
                        })
                        .ok_or_else(|| {
                            format!(
                                "@{}(...) expects a string literal namespace, found `{}`",
                                name,
                                parsed.node_text(*arg)
                            )
                        }),
                ),
                _ => Some(Err(format!(
                    "@{}(...) takes at most one argument, found {}",
                    name,
                    args.len()
                ))),
            }
        }
        _ => None,
    }
}

/// Contents of a string literal or substitution-free template literal.
fn string_literal(parsed: &ParsedFile, node: Node) -> Option<String> {
    match node.kind() {
        "string" => Some(strip_delimiters(parsed.node_text(node)).to_string()),
        "template_string" => {
            let mut cursor = node.walk();
            let has_substitution = node
                .named_children(&mut cursor)
                .any(|c| c.kind() == "template_substitution");
            if has_substitution {
                return None;
            }
            Some(strip_delimiters(parsed.node_text(node)).to_string())
        }
        _ => None,
    }
}

/// Drop the opening and closing quote of a literal.
fn strip_delimiters(text: &str) -> &str {
    text.get(1..text.len().saturating_sub(1)).unwrap_or("")
}

/// All expose tags in one comment's text.
fn comment_annotations(text: &str, name: &str) -> Vec<Annotation> {
    let tag = format!("@{}", name);
    let mut found = Vec::new();

    for line in text.lines() {
        let line = strip_comment_markers(line);
        let Some(rest) = line.strip_prefix(&tag) else {
            continue;
        };
        // `@exposed` or `@expose-foo` is a different tag
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            continue;
        }
        found.push(Annotation {
            namespace: rest.split_whitespace().next().map(str::to_string),
        });
    }

    found
}

fn strip_comment_markers(line: &str) -> &str {
    let mut line = line.trim();
    for prefix in ["/**", "/*", "//"] {
        if let Some(rest) = line.strip_prefix(prefix) {
            line = rest;
            break;
        }
    }
    let line = line.trim_start().trim_start_matches('*');
    let line = line.trim();
    line.strip_suffix("*/").unwrap_or(line).trim()
}
