//! Process-wide registry
//!
//! Types register themselves here at startup (typically from an `init`
//! function each module exposes), and discovery code reads it back through
//! [`with_registry`]. Tests that need isolation should build their own
//! [`Registry`] instead.

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::registry::{Registry, RegistryError, TypeDecl, TypeKey};

static GLOBAL: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::new()));

/// Register a type in the process-wide registry
pub fn register(module: &str, decl: TypeDecl) -> Result<TypeKey, RegistryError> {
    GLOBAL.write().register(module, decl)
}

/// List an existing type under another module of the process-wide registry
pub fn reexport(module: &str, type_name: &str) -> Result<TypeKey, RegistryError> {
    GLOBAL.write().reexport(module, type_name)
}

/// Run `f` against the process-wide registry.
///
/// The registry stays read-locked for the duration of `f`; do not register
/// types from inside it.
pub fn with_registry<R>(f: impl FnOnce(&Registry) -> R) -> R {
    f(&GLOBAL.read())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleSet;
    use crate::query::find_types_with_marker;
    use crate::registry::MarkerKind;

    #[test]
    fn test_global_registration() {
        register("GlobalTestLib", TypeDecl::class("GlobalTestBase")).unwrap();
        register(
            "GlobalTestLib",
            TypeDecl::class("GlobalTestFoo")
                .extends("GlobalTestBase")
                .marker("GlobalMarked", "yes"),
        )
        .unwrap();

        let found: Vec<String> = with_registry(|registry| {
            find_types_with_marker(
                registry,
                &ModuleSet::new(["GlobalTestLib"]),
                &MarkerKind::new("GlobalMarked"),
            )
            .unwrap()
            .map(|(t, _)| t.name().to_string())
            .collect()
        });
        assert_eq!(found, vec!["GlobalTestFoo".to_string()]);

        // Same name again is rejected
        assert!(register("GlobalTestLib", TypeDecl::class("GlobalTestFoo")).is_err());
    }
}
