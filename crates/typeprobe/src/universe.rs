//! Type universe
//!
//! Lazy enumeration of every type listed by a set of resolved modules. Each
//! type is yielded once even when several modules list it; order is
//! per-module declaration order, modules in resolution order.

use rustc_hash::FxHashSet;

use crate::error::ProbeResult;
use crate::module::{ModuleHandle, ModuleResolver, ModuleSet};
use crate::registry::{Registry, TypeDescriptor, TypeKey};

/// The set of types visible through a list of resolved modules
#[derive(Debug, Clone)]
pub struct TypeUniverse<'r> {
    registry: &'r Registry,
    modules: Vec<ModuleHandle<'r>>,
}

impl<'r> TypeUniverse<'r> {
    /// Build a universe from already-resolved handles
    pub fn new(registry: &'r Registry, modules: Vec<ModuleHandle<'r>>) -> Self {
        Self { registry, modules }
    }

    /// Resolve `modules` and build the universe over them
    pub fn resolve(registry: &'r Registry, modules: &ModuleSet) -> ProbeResult<Self> {
        let handles = ModuleResolver::new(registry).resolve(modules)?;
        Ok(Self::new(registry, handles))
    }

    /// Registry backing this universe
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Resolved modules, in resolution order
    pub fn modules(&self) -> &[ModuleHandle<'r>] {
        &self.modules
    }

    /// Lazily enumerate every type, deduplicated by identity
    pub fn types(&self) -> Types<'r> {
        self.clone().into_types()
    }

    /// Consume the universe into its lazy enumeration
    pub fn into_types(self) -> Types<'r> {
        tracing::debug!(modules = self.modules.len(), "enumerating type universe");
        Types {
            registry: self.registry,
            modules: self.modules.into_iter(),
            current: [].iter(),
            seen: FxHashSet::default(),
        }
    }
}

/// Iterator returned by [`TypeUniverse::types`]
#[derive(Debug)]
pub struct Types<'r> {
    registry: &'r Registry,
    modules: std::vec::IntoIter<ModuleHandle<'r>>,
    current: std::slice::Iter<'r, TypeKey>,
    seen: FxHashSet<TypeKey>,
}

impl<'r> Iterator for Types<'r> {
    type Item = &'r TypeDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            for key in self.current.by_ref() {
                if self.seen.insert(*key) {
                    if let Some(ty) = self.registry.get(*key) {
                        return Some(ty);
                    }
                }
            }
            let module = self.modules.next()?;
            self.current = module.metadata().types().iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeDecl;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register("A", TypeDecl::class("A1")).unwrap();
        registry.register("A", TypeDecl::class("A2")).unwrap();
        registry.register("B", TypeDecl::class("B1")).unwrap();
        registry.reexport("B", "A2").unwrap();
        registry.declare_module("Empty");
        registry
    }

    fn names(universe: &TypeUniverse<'_>) -> Vec<String> {
        universe.types().map(|t| t.name().to_string()).collect()
    }

    #[test]
    fn test_enumeration_order() {
        let registry = registry();
        let universe = TypeUniverse::resolve(&registry, &ModuleSet::new(["A", "B"])).unwrap();
        assert_eq!(names(&universe), vec!["A1", "A2", "B1"]);
    }

    #[test]
    fn test_overlapping_modules_deduplicated() {
        let registry = registry();
        let universe = TypeUniverse::resolve(&registry, &ModuleSet::new(["B", "A"])).unwrap();
        assert_eq!(names(&universe), vec!["B1", "A2", "A1"]);
    }

    #[test]
    fn test_repeated_module_name() {
        let registry = registry();
        let universe = TypeUniverse::resolve(&registry, &ModuleSet::new(["A", "A"])).unwrap();
        assert_eq!(names(&universe), vec!["A1", "A2"]);
    }

    #[test]
    fn test_empty_module() {
        let registry = registry();
        let universe =
            TypeUniverse::resolve(&registry, &ModuleSet::new(["Empty", "B"])).unwrap();
        assert_eq!(names(&universe), vec!["B1", "A2"]);
    }

    #[test]
    fn test_enumeration_is_restartable() {
        let registry = registry();
        let universe = TypeUniverse::resolve(&registry, &ModuleSet::new(["A"])).unwrap();
        assert_eq!(universe.types().count(), 2);
        assert_eq!(universe.types().count(), 2);
    }
}
