//! Method registry: exposed methods grouped by namespace.
//!
//! Every emitter walks the registry in the same order (namespaces
//! lexicographically, then methods lexicographically), which is what makes
//! the three generated files agree with each other and stable across runs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::analysis::ExposedMethod;
use crate::error::{Error, Result};

/// A class that owns exposed methods, identified by name and source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerClass<'a> {
    pub name: &'a str,
    pub file: &'a Path,
}

impl OwnerClass<'_> {
    /// Identifier of the singleton instance: `UserService` -> `userService`.
    pub fn instance_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Methods exposed under one namespace.
#[derive(Debug, Clone, Default)]
pub struct NamespaceGroup {
    name: String,
    methods: BTreeMap<String, ExposedMethod>,
}

impl NamespaceGroup {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            methods: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Methods sorted by name.
    pub fn methods(&self) -> impl Iterator<Item = &ExposedMethod> {
        self.methods.values()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Distinct owner classes of the group's methods.
    pub fn owner_classes(&self) -> BTreeSet<OwnerClass<'_>> {
        self.methods
            .values()
            .filter_map(|m| {
                m.class_name.as_deref().map(|name| OwnerClass {
                    name,
                    file: m.source_file(),
                })
            })
            .collect()
    }

    /// The owner class, when exactly one exists.
    pub fn owner_class(&self) -> Option<OwnerClass<'_>> {
        let owners = self.owner_classes();
        if owners.len() == 1 {
            owners.into_iter().next()
        } else {
            None
        }
    }

    /// Whether any method needs an instance to be called on.
    pub fn needs_singleton(&self) -> bool {
        self.methods.values().any(|m| m.class_name.is_some())
    }

    /// Interface name used by the type file: `userAPI` -> `UserAPI`.
    pub fn interface_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// All exposed methods of a generation run.
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    groups: BTreeMap<String, NamespaceGroup>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a validated registry from extracted records.
    pub fn from_methods(methods: impl IntoIterator<Item = ExposedMethod>) -> Result<Self> {
        let mut registry = Self::new();
        for method in methods {
            registry.insert(method)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Add a method. A second method with the same namespace and name is
    /// an error naming both declarations.
    pub fn insert(&mut self, method: ExposedMethod) -> Result<()> {
        let group = self
            .groups
            .entry(method.namespace.clone())
            .or_insert_with(|| NamespaceGroup::new(&method.namespace));

        if let Some(existing) = group.methods.get(&method.method_name) {
            return Err(Error::DuplicateMethod {
                namespace: method.namespace.clone(),
                method: method.method_name.clone(),
                first: existing.location(),
                second: method.location(),
            });
        }

        group.methods.insert(method.method_name.clone(), method);
        Ok(())
    }

    /// Namespace names in lexicographic order.
    pub fn all_namespaces(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Methods of a namespace sorted by name; empty for unknown namespaces.
    pub fn methods_of<'a>(&'a self, namespace: &str) -> impl Iterator<Item = &'a ExposedMethod> {
        self.groups
            .get(namespace)
            .into_iter()
            .flat_map(|group| group.methods())
    }

    /// Namespace groups in lexicographic order.
    pub fn groups(&self) -> impl Iterator<Item = &NamespaceGroup> {
        self.groups.values()
    }

    /// Every method, namespace-major.
    pub fn methods(&self) -> impl Iterator<Item = &ExposedMethod> {
        self.groups.values().flat_map(|group| group.methods())
    }

    pub fn owner_class(&self, namespace: &str) -> Option<OwnerClass<'_>> {
        self.groups.get(namespace).and_then(|group| group.owner_class())
    }

    pub fn needs_singleton(&self, namespace: &str) -> bool {
        self.groups
            .get(namespace)
            .map(|group| group.needs_singleton())
            .unwrap_or(false)
    }

    /// Distinct owner classes across all namespaces, in namespace order.
    pub fn singletons(&self) -> Vec<OwnerClass<'_>> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for group in self.groups.values() {
            for owner in group.owner_classes() {
                if seen.insert(owner) {
                    out.push(owner);
                }
            }
        }
        out
    }

    /// Number of methods.
    pub fn len(&self) -> usize {
        self.groups.values().map(NamespaceGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Check that each namespace has at most one owner class.
    pub fn validate(&self) -> Result<()> {
        for group in self.groups.values() {
            let owners = group.owner_classes();
            if owners.len() > 1 {
                return Err(Error::AmbiguousOwner {
                    namespace: group.name.clone(),
                    classes: owners
                        .iter()
                        .map(|o| format!("{} ({})", o.name, o.file.display()))
                        .collect(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ExportKind, ReturnShape};
    use std::path::PathBuf;

    fn method(namespace: &str, name: &str, class: Option<&str>, file: &str) -> ExposedMethod {
        ExposedMethod {
            namespace: namespace.to_string(),
            method_name: name.to_string(),
            class_name: class.map(str::to_string),
            parameters: vec![],
            return_shape: ReturnShape::AsyncValue("void".into()),
            source_file: PathBuf::from(file),
            line: 1,
            export: ExportKind::Named,
            type_refs: vec![],
        }
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut registry = MethodRegistry::new();
        registry.insert(method("zeta", "b", None, "/a.ts")).unwrap();
        registry.insert(method("alpha", "z", None, "/a.ts")).unwrap();
        registry.insert(method("zeta", "a", None, "/a.ts")).unwrap();
        registry.insert(method("alpha", "m", None, "/a.ts")).unwrap();

        let namespaces: Vec<_> = registry.all_namespaces().collect();
        assert_eq!(namespaces, vec!["alpha", "zeta"]);

        let names: Vec<_> = registry.methods_of("alpha").map(|m| m.method_name.as_str()).collect();
        assert_eq!(names, vec!["m", "z"]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_unknown_namespace_is_empty() {
        let registry = MethodRegistry::new();
        assert_eq!(registry.methods_of("nope").count(), 0);
        assert!(registry.is_empty());
        assert!(!registry.needs_singleton("nope"));
    }

    #[test]
    fn test_duplicate_method() {
        let mut registry = MethodRegistry::new();
        registry.insert(method("userAPI", "getUser", None, "/a.ts")).unwrap();
        let err = registry
            .insert(method("userAPI", "getUser", Some("UserService"), "/b.ts"))
            .unwrap_err();

        match err {
            Error::DuplicateMethod { first, second, .. } => {
                assert_eq!(first, "/a.ts:1");
                assert_eq!(second, "/b.ts:1");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_same_method_name_in_different_namespaces() {
        let mut registry = MethodRegistry::new();
        registry.insert(method("a", "get", None, "/a.ts")).unwrap();
        assert!(registry.insert(method("b", "get", None, "/a.ts")).is_ok());
    }

    #[test]
    fn test_singleton_owner() {
        let registry = MethodRegistry::from_methods(vec![
            method("userAPI", "getUser", Some("UserService"), "/u.ts"),
            method("userAPI", "listUsers", Some("UserService"), "/u.ts"),
            method("userAPI", "ping", None, "/p.ts"),
            method("systemAPI", "info", None, "/s.ts"),
        ])
        .unwrap();

        assert!(registry.needs_singleton("userAPI"));
        assert!(!registry.needs_singleton("systemAPI"));
        let owner = registry.owner_class("userAPI").unwrap();
        assert_eq!(owner.name, "UserService");
        assert_eq!(owner.instance_name(), "userService");
        assert_eq!(registry.singletons().len(), 1);
    }

    #[test]
    fn test_singleton_shared_across_namespaces() {
        let registry = MethodRegistry::from_methods(vec![
            method("a", "x", Some("Service"), "/s.ts"),
            method("b", "y", Some("Service"), "/s.ts"),
        ])
        .unwrap();

        assert_eq!(registry.singletons().len(), 1);
    }

    #[test]
    fn test_ambiguous_owner() {
        let err = MethodRegistry::from_methods(vec![
            method("userAPI", "a", Some("UserService"), "/u.ts"),
            method("userAPI", "b", Some("AdminService"), "/u.ts"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::AmbiguousOwner { ref namespace, .. } if namespace == "userAPI"));

        // Same class name declared in two files.
        let err = MethodRegistry::from_methods(vec![
            method("userAPI", "a", Some("UserService"), "/u.ts"),
            method("userAPI", "b", Some("UserService"), "/v.ts"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::AmbiguousOwner { .. }));
    }

    #[test]
    fn test_interface_name() {
        let registry = MethodRegistry::from_methods(vec![method("userAPI", "a", None, "/u.ts")]).unwrap();
        let group = registry.groups().next().unwrap();
        assert_eq!(group.interface_name(), "UserAPI");
        assert_eq!(group.len(), 1);
    }
}
