//! Bridge file: one exposed object per namespace, forwarding every call
//! over the runtime's channel.

use super::{join_blocks, quote, ImportSet, HEADER};
use crate::analysis::{ExposedMethod, ImportedName};
use crate::error::Result;
use crate::registry::{MethodRegistry, NamespaceGroup};

const EXPOSE: &str = "expose";
const INVOKE: &str = "invoke";
const ITERATE: &str = "iterate";

/// Render the bridge file.
pub fn render(registry: &MethodRegistry, runtime: &str) -> Result<String> {
    let mut imports = ImportSet::new("bridge");
    let mut used = Vec::new();
    if !registry.is_empty() {
        used.push(EXPOSE);
    }
    if registry.methods().any(|m| !m.return_shape.is_stream()) {
        used.push(INVOKE);
    }
    if registry.methods().any(|m| m.return_shape.is_stream()) {
        used.push(ITERATE);
    }
    for name in used {
        imports.add(name, ImportedName::Named(name.to_string()), runtime)?;
    }

    let mut blocks = vec![HEADER.to_string(), imports.render().join("\n")];
    blocks.extend(registry.groups().map(namespace_block));
    Ok(join_blocks(blocks))
}

fn namespace_block(group: &NamespaceGroup) -> String {
    let mut lines = vec![format!("{}({}, {{", EXPOSE, quote(group.name()))];
    lines.extend(group.methods().map(|m| format!("  {},", forwarder(m))));
    lines.push("});".to_string());
    lines.join("\n")
}

/// `name: (a: unknown) => invoke('ns:name', a)`
fn forwarder(method: &ExposedMethod) -> String {
    let params = method
        .parameters
        .iter()
        .map(|p| {
            if p.rest {
                format!("...{}: unknown[]", p.name)
            } else if p.optional {
                format!("{}?: unknown", p.name)
            } else {
                format!("{}: unknown", p.name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut args = vec![quote(&method.key())];
    args.extend(method.parameters.iter().map(|p| {
        if p.rest {
            format!("...{}", p.name)
        } else {
            p.name.clone()
        }
    }));

    let call = if method.return_shape.is_stream() {
        ITERATE
    } else {
        INVOKE
    };

    format!(
        "{}: ({}) => {}({})",
        method.method_name,
        params,
        call,
        args.join(", ")
    )
}
