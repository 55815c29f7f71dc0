//! Backend registration file.
//!
//! ```text
//! import { register } from '@bridgegen/runtime/backend';
//! import { UserService } from '../services/user';
//!
//! const userService = new UserService();
//!
//! register('userAPI:getUser', userService.getUser.bind(userService));
//! ```
//!
//! Owners from different files may share a name. The first owner in
//! registry order keeps it; later ones are imported under
//! `<namespace>_<name>`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::{join_blocks, output_label, quote, ImportResolver, ImportSet, HEADER};
use crate::analysis::{ExportKind, ExposedMethod, ImportedName, ModuleRef};
use crate::error::Result;
use crate::registry::{MethodRegistry, OwnerClass};

const REGISTER: &str = "register";
const REGISTER_STREAM: &str = "registerStream";

/// A top-level binding of a source file: function or class name plus file.
type Owner<'r> = (&'r str, &'r Path);

/// Top-level identifiers of the backend file.
#[derive(Default)]
struct Identifiers<'r> {
    taken: BTreeSet<String>,
    imports: BTreeMap<Owner<'r>, String>,
    instances: BTreeMap<Owner<'r>, String>,
}

impl<'r> Identifiers<'r> {
    /// Reserve `preferred`, or a namespace-qualified variant when taken.
    fn claim(&mut self, preferred: &str, namespace: &str) -> String {
        if self.taken.insert(preferred.to_string()) {
            return preferred.to_string();
        }
        let base = format!("{}_{}", namespace, preferred);
        let mut candidate = base.clone();
        let mut n = 2;
        while !self.taken.insert(candidate.clone()) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        candidate
    }

    fn import_of(&self, owner: &Owner<'r>) -> &str {
        self.imports.get(owner).map(String::as_str).unwrap_or(owner.0)
    }

    fn instance_of(&self, owner: &Owner<'r>) -> String {
        match self.instances.get(owner) {
            Some(instance) => instance.clone(),
            None => instance_name(owner.0),
        }
    }
}

fn instance_name(class: &str) -> String {
    OwnerClass {
        name: class,
        file: Path::new(""),
    }
    .instance_name()
}

/// Render the backend file for `output_file` (absolute).
pub fn render(registry: &MethodRegistry, output_file: &Path, runtime: &str) -> Result<String> {
    let resolver = ImportResolver::new(output_file);
    let mut imports = ImportSet::new(output_label(output_file));
    let mut idents = Identifiers::default();

    for (name, used) in [
        (REGISTER, registry.methods().any(|m| !m.return_shape.is_stream())),
        (REGISTER_STREAM, registry.methods().any(|m| m.return_shape.is_stream())),
    ] {
        if used {
            idents.claim(name, "");
            imports.add(name, ImportedName::Named(name.to_string()), runtime)?;
        }
    }

    for method in registry.methods() {
        let owner = (method.owner_binding(), method.source_file());
        if idents.imports.contains_key(&owner) {
            continue;
        }
        let local = idents.claim(owner.0, &method.namespace);
        let imported = match method.export {
            ExportKind::Default => ImportedName::Default,
            _ => ImportedName::Named(owner.0.to_string()),
        };
        let specifier = resolver.specifier(&ModuleRef::File(method.source_file.clone()));
        imports.add(&local, imported, &specifier)?;
        idents.imports.insert(owner, local);
    }

    // Instances are named after every import is placed.
    for method in registry.methods() {
        if let Some(class) = &method.class_name {
            let owner = (class.as_str(), method.source_file());
            if !idents.instances.contains_key(&owner) {
                let instance = idents.claim(&instance_name(class), &method.namespace);
                idents.instances.insert(owner, instance);
            }
        }
    }

    let singletons = registry
        .singletons()
        .iter()
        .map(|owner| {
            let key = (owner.name, owner.file);
            format!(
                "const {} = new {}();",
                idents.instance_of(&key),
                idents.import_of(&key)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let registrations = registry
        .methods()
        .map(|method| registration(method, &idents))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(join_blocks(vec![
        HEADER.to_string(),
        imports.render().join("\n"),
        singletons,
        registrations,
    ]))
}

fn registration(method: &ExposedMethod, idents: &Identifiers) -> String {
    let call = if method.return_shape.is_stream() {
        REGISTER_STREAM
    } else {
        REGISTER
    };

    let owner = (method.owner_binding(), method.source_file());
    let handler = match &method.class_name {
        Some(_) => {
            let instance = idents.instance_of(&owner);
            format!("{}.{}.bind({})", instance, method.method_name, instance)
        }
        None => idents.import_of(&owner).to_string(),
    };

    format!("{}({}, {});", call, quote(&method.key()), handler)
}
