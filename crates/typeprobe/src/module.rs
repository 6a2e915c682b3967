//! Module resolution
//!
//! Turns an ordered list of module names into handles on the registry's
//! module metadata. Resolution fails on the first name the registry does not
//! know.

use crate::error::{ProbeError, ProbeResult};
use crate::registry::{ModuleMetadata, Registry};

/// Ordered list of module names a query runs over
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleSet {
    names: Vec<String>,
}

impl ModuleSet {
    /// Create from any list of names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Module names in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the set holds no names
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl From<Vec<String>> for ModuleSet {
    fn from(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl From<&[&str]> for ModuleSet {
    fn from(names: &[&str]) -> Self {
        Self::new(names.iter().copied())
    }
}

/// A resolved module: a borrowed view of registry metadata
#[derive(Debug, Clone, Copy)]
pub struct ModuleHandle<'r> {
    metadata: &'r ModuleMetadata,
}

impl<'r> ModuleHandle<'r> {
    /// Module name
    pub fn name(&self) -> &'r str {
        self.metadata.name()
    }

    /// Underlying metadata
    pub fn metadata(&self) -> &'r ModuleMetadata {
        self.metadata
    }

    /// Check if two handles refer to the same metadata
    pub fn same_module(&self, other: &ModuleHandle<'_>) -> bool {
        std::ptr::eq(self.metadata, other.metadata)
    }
}

/// Resolves module names against a registry
#[derive(Debug, Clone, Copy)]
pub struct ModuleResolver<'r> {
    registry: &'r Registry,
}

impl<'r> ModuleResolver<'r> {
    /// Create a resolver over a registry
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Resolve a single name
    pub fn resolve_one(&self, name: &str) -> ProbeResult<ModuleHandle<'r>> {
        match self.registry.module(name) {
            Some(metadata) => Ok(ModuleHandle { metadata }),
            None => {
                tracing::debug!(module = name, "module not found");
                Err(ProbeError::ModuleNotFound {
                    module: name.to_string(),
                })
            }
        }
    }

    /// Resolve every name in order, failing on the first unknown one
    pub fn resolve(&self, modules: &ModuleSet) -> ProbeResult<Vec<ModuleHandle<'r>>> {
        let handles = modules
            .names()
            .iter()
            .map(|name| self.resolve_one(name))
            .collect::<ProbeResult<Vec<_>>>()?;
        tracing::debug!(count = handles.len(), "resolved modules");
        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeDecl;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register("Lib", TypeDecl::class("Foo")).unwrap();
        registry.register("Extra", TypeDecl::class("Bar")).unwrap();
        registry
    }

    #[test]
    fn test_resolve_preserves_order() {
        let registry = registry();
        let resolver = ModuleResolver::new(&registry);
        let handles = resolver.resolve(&ModuleSet::new(["Extra", "Lib"])).unwrap();
        let names: Vec<_> = handles.iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["Extra", "Lib"]);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let registry = registry();
        let resolver = ModuleResolver::new(&registry);
        let a = resolver.resolve_one("Lib").unwrap();
        let b = resolver.resolve_one("Lib").unwrap();
        assert!(a.same_module(&b));
        assert!(!a.same_module(&resolver.resolve_one("Extra").unwrap()));
    }

    #[test]
    fn test_unknown_module_named_in_error() {
        let registry = registry();
        let resolver = ModuleResolver::new(&registry);
        let err = resolver
            .resolve(&ModuleSet::new(["Lib", "Missing"]))
            .unwrap_err();
        match err {
            ProbeError::ModuleNotFound { module } => assert_eq!(module, "Missing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_set_resolves_to_nothing() {
        let registry = registry();
        let handles = ModuleResolver::new(&registry)
            .resolve(&ModuleSet::default())
            .unwrap();
        assert!(handles.is_empty());
    }
}
