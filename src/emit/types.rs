//! Type declaration file describing the front-end call surface.

use std::path::Path;

use super::{join_blocks, output_label, ImportResolver, ImportSet, HEADER};
use crate::analysis::{ExposedMethod, ReturnShape};
use crate::error::Result;
use crate::registry::{MethodRegistry, NamespaceGroup};

/// Render the type file for `output_file` (absolute).
pub fn render(registry: &MethodRegistry, output_file: &Path) -> Result<String> {
    let resolver = ImportResolver::new(output_file);
    let mut imports = ImportSet::type_only(output_label(output_file));

    for method in registry.methods() {
        for type_ref in &method.type_refs {
            let specifier = resolver.specifier(&type_ref.module);
            imports.add(&type_ref.local, type_ref.imported.clone(), &specifier)?;
        }
    }

    let mut blocks = vec![HEADER.to_string(), imports.render().join("\n")];
    blocks.extend(registry.groups().map(interface_block));
    if registry.is_empty() {
        // Keeps the file a module so `declare global` is allowed.
        blocks.push("export {};".to_string());
    }
    blocks.push(global_block(registry));
    Ok(join_blocks(blocks))
}

fn interface_block(group: &NamespaceGroup) -> String {
    let mut lines = vec![format!("export interface {} {{", group.interface_name())];
    lines.extend(group.methods().map(|m| format!("  {};", signature(m))));
    lines.push("}".to_string());
    lines.join("\n")
}

fn global_block(registry: &MethodRegistry) -> String {
    let mut lines = vec!["declare global {".to_string(), "  interface Window {".to_string()];
    lines.extend(
        registry
            .groups()
            .map(|group| format!("    {}: {};", group.name(), group.interface_name())),
    );
    lines.push("  }".to_string());
    lines.push("}".to_string());
    lines.join("\n")
}

/// `getUser(id: number): Promise<User>`
fn signature(method: &ExposedMethod) -> String {
    let params = method
        .parameters
        .iter()
        .map(|p| {
            if p.rest {
                format!("...{}: {}", p.name, p.type_text)
            } else if p.optional {
                format!("{}?: {}", p.name, p.type_text)
            } else {
                format!("{}: {}", p.name, p.type_text)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("{}({}): {}", method.method_name, params, return_type(&method.return_shape))
}

fn return_type(shape: &ReturnShape) -> String {
    match shape {
        ReturnShape::Value(t) | ReturnShape::AsyncValue(t) => format!("Promise<{}>", t),
        ReturnShape::AsyncStream(t) => format!("AsyncGenerator<{}, void, unknown>", t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ExportKind, ImportedName, ModuleRef, Parameter, TypeRef};
    use crate::error::Error;
    use std::path::PathBuf;

    const OUTPUT: &str = "/app/src/renderer/bridge.generated.d.ts";

    fn method(namespace: &str, name: &str, shape: ReturnShape, type_refs: Vec<TypeRef>) -> ExposedMethod {
        ExposedMethod {
            namespace: namespace.to_string(),
            method_name: name.to_string(),
            class_name: None,
            parameters: vec![Parameter {
                name: "id".to_string(),
                type_text: "number".to_string(),
                optional: false,
                rest: false,
            }],
            return_shape: shape,
            source_file: PathBuf::from("/app/src/main/user.ts"),
            line: 1,
            export: ExportKind::Named,
            type_refs,
        }
    }

    fn type_ref(local: &str, file: &str) -> TypeRef {
        TypeRef {
            local: local.to_string(),
            imported: ImportedName::Named(local.to_string()),
            module: ModuleRef::File(PathBuf::from(file)),
        }
    }

    #[test]
    fn test_render_types() {
        let registry = MethodRegistry::from_methods(vec![
            method(
                "userAPI",
                "getUser",
                ReturnShape::AsyncValue("User".into()),
                vec![type_ref("User", "/app/src/models")],
            ),
            method(
                "userAPI",
                "watchUser",
                ReturnShape::AsyncStream("User".into()),
                vec![type_ref("User", "/app/src/models")],
            ),
            method("mathAPI", "square", ReturnShape::Value("number".into()), vec![]),
        ])
        .unwrap();

        let text = render(&registry, Path::new(OUTPUT)).unwrap();
        assert_eq!(
            text,
            "// This file is generated by bridgegen. Do not edit it by hand.
// Regenerate with `bridgegen generate`.

import type { User } from '../models';

export interface MathAPI {
  square(id: number): Promise<number>;
}

export interface UserAPI {
  getUser(id: number): Promise<User>;
  watchUser(id: number): AsyncGenerator<User, void, unknown>;
}

declare global {
  interface Window {
    mathAPI: MathAPI;
    userAPI: UserAPI;
  }
}
"
        );
    }

    #[test]
    fn test_empty_registry_is_still_a_module() {
        let text = render(&MethodRegistry::new(), Path::new(OUTPUT)).unwrap();
        assert!(text.contains("export {};\n\ndeclare global {"));
    }

    #[test]
    fn test_conflicting_type_names() {
        let registry = MethodRegistry::from_methods(vec![
            method(
                "a",
                "x",
                ReturnShape::AsyncValue("User".into()),
                vec![type_ref("User", "/app/src/models")],
            ),
            method(
                "b",
                "y",
                ReturnShape::AsyncValue("User".into()),
                vec![type_ref("User", "/app/src/legacy/models")],
            ),
        ])
        .unwrap();

        assert!(matches!(
            render(&registry, Path::new(OUTPUT)),
            Err(Error::ImportCollision { .. })
        ));
    }
}
