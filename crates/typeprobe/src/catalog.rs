//! Catalog files
//!
//! A catalog describes modules and the types they declare, so a registry can
//! be populated from a file instead of from code. TOML and JSON are both
//! accepted; the format is picked from the file extension.
//!
//! ```toml
//! [[modules]]
//! name = "Lib"
//!
//! [[modules.types]]
//! name = "Thing"
//! kind = "contract"
//!
//! [[modules.types]]
//! name = "Foo"
//! extends = "Base"
//! implements = ["Thing"]
//! markers = { Marked = 42 }
//! ```
//!
//! Types are registered in document order. Re-exports are applied after
//! every module's own types, so a module may re-export a type declared
//! further down the file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::{Registry, RegistryError, TypeDecl, TypeKind};
use crate::value::Value;

/// Errors that can occur while loading a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Failed to read the catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse catalog: {0}")]
    Toml(#[from] toml::de::Error),

    /// Failed to parse JSON
    #[error("Failed to parse catalog: {0}")]
    Json(#[from] serde_json::Error),

    /// A declaration was rejected by the registry
    #[error("Invalid catalog: {0}")]
    Registry(#[from] RegistryError),

    /// The file extension is neither `.toml` nor `.json`
    #[error("Unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}

/// Root of a catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Modules, in declaration order
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
}

/// One module of a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Module name
    pub name: String,

    /// Types declared by this module
    #[serde(default)]
    pub types: Vec<TypeEntry>,

    /// Names of types declared elsewhere that this module also lists
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reexports: Vec<String>,
}

/// One type declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeEntry {
    /// Type name
    pub name: String,

    /// Declaration kind (default: class)
    #[serde(default = "default_kind")]
    pub kind: TypeKind,

    /// Immediate parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Directly implemented capability contracts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,

    /// Markers keyed by kind, with their data
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub markers: BTreeMap<String, Value>,
}

fn default_kind() -> TypeKind {
    TypeKind::Class
}

impl TypeEntry {
    /// Convert into a registry declaration
    pub fn to_decl(&self) -> TypeDecl {
        let mut decl = TypeDecl::with_kind(self.name.clone(), self.kind);
        if let Some(parent) = &self.extends {
            decl = decl.extends(parent.clone());
        }
        for contract in &self.implements {
            decl = decl.implements(contract.clone());
        }
        for (kind, data) in &self.markers {
            decl = decl.marker(kind.clone(), data.clone());
        }
        decl
    }
}

impl Catalog {
    /// Load a catalog file, picking the parser from the extension
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(CatalogError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Parse a TOML catalog
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a JSON catalog
    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Register every module and type into `registry`
    pub fn load_into(&self, registry: &mut Registry) -> Result<(), CatalogError> {
        for module in &self.modules {
            registry.declare_module(&module.name);
            for entry in &module.types {
                registry.register(&module.name, entry.to_decl())?;
            }
        }
        for module in &self.modules {
            for name in &module.reexports {
                registry.reexport(&module.name, name)?;
            }
        }
        tracing::debug!(
            modules = self.modules.len(),
            types = registry.len(),
            "catalog loaded"
        );
        Ok(())
    }

    /// Build a fresh registry from this catalog
    pub fn into_registry(self) -> Result<Registry, CatalogError> {
        let mut registry = Registry::new();
        self.load_into(&mut registry)?;
        Ok(registry)
    }
}
