//! Type Descriptor Registry
//!
//! The registry is the backing store every discovery query reads from. It
//! holds one [`TypeDescriptor`] per declared type and one [`ModuleMetadata`]
//! per module name, populated by explicit self-registration:
//!
//! ```rust,ignore
//! let mut registry = Registry::new();
//! registry.register("Lib", TypeDecl::class("Root"))?;
//! registry.register("Lib", TypeDecl::class("Base").extends("Root"))?;
//! registry.register("Lib", TypeDecl::contract("Thing"))?;
//! registry.register(
//!     "Lib",
//!     TypeDecl::class("Foo").extends("Base").implements("Thing").marker("Marked", 42),
//! )?;
//! ```
//!
//! Parents and contracts must be registered before the types that name
//! them, so every parent chain is finite and acyclic by construction.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Value;

static NEXT_REGISTRY_ID: AtomicU32 = AtomicU32::new(0);

/// Process-unique identity of a registered type.
///
/// A key names its owning registry as well as the slot inside it, so keys
/// from different registries never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    registry: u32,
    index: u32,
}

impl TypeKey {
    /// Id of the registry that issued this key
    pub fn registry_id(&self) -> u32 {
        self.registry
    }

    /// Slot within the issuing registry
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.registry, self.index)
    }
}

/// What sort of declaration a descriptor describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Concrete type
    Class,
    /// Abstract base type
    Abstract,
    /// Capability contract (interface analog)
    Contract,
}

impl TypeKind {
    /// Check if this kind denotes a capability contract
    pub fn is_contract(&self) -> bool {
        matches!(self, TypeKind::Contract)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Class => f.write_str("class"),
            TypeKind::Abstract => f.write_str("abstract"),
            TypeKind::Contract => f.write_str("contract"),
        }
    }
}

/// Identity of a marker kind (attribute analog)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerKind(String);

impl MarkerKind {
    /// Create a marker kind from its name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Marker kind name
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerKind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for MarkerKind {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A marker attached to a type, with the data captured at declaration time
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerInstance {
    /// Marker kind
    pub kind: MarkerKind,
    /// Associated data
    pub data: Value,
}

/// Read-only metadata record for one declared type
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    name: String,
    kind: TypeKind,
    parent: Option<TypeKey>,
    contracts: Vec<TypeKey>,
    markers: Vec<MarkerInstance>,
    module: String,
}

impl TypeDescriptor {
    /// Identity of this type
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaration kind
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Check if this descriptor is a capability contract
    pub fn is_contract(&self) -> bool {
        self.kind.is_contract()
    }

    /// Immediate parent (None for root types)
    pub fn parent(&self) -> Option<TypeKey> {
        self.parent
    }

    /// Contracts declared directly on this type, in declaration order
    pub fn contracts(&self) -> &[TypeKey] {
        &self.contracts
    }

    /// Check if a contract is declared directly on this type
    pub fn declares_contract(&self, contract: TypeKey) -> bool {
        self.contracts.contains(&contract)
    }

    /// All markers on this type
    pub fn markers(&self) -> &[MarkerInstance] {
        &self.markers
    }

    /// Data of the marker of the given kind, if present
    pub fn marker(&self, kind: &MarkerKind) -> Option<&Value> {
        self.markers
            .iter()
            .find(|m| &m.kind == kind)
            .map(|m| &m.data)
    }

    /// Check if a marker of the given kind is present
    pub fn has_marker(&self, kind: &MarkerKind) -> bool {
        self.marker(kind).is_some()
    }

    /// Module that declared this type
    pub fn declaring_module(&self) -> &str {
        &self.module
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TypeDescriptor {}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Metadata for one module: its name and the types it lists
#[derive(Debug, Clone, Default)]
pub struct ModuleMetadata {
    name: String,
    types: Vec<TypeKey>,
}

impl ModuleMetadata {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            types: Vec::new(),
        }
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Types listed by this module, in declaration order
    pub fn types(&self) -> &[TypeKey] {
        &self.types
    }

    fn push(&mut self, key: TypeKey) {
        if !self.types.contains(&key) {
            self.types.push(key);
        }
    }
}

/// Errors that can occur while registering types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The type name is already registered
    #[error("Type already registered: {0}")]
    DuplicateType(String),

    /// A referenced type has not been registered (yet)
    #[error("Unknown type {referenced} referenced by {declaring}")]
    UnknownType {
        /// Type being declared
        declaring: String,
        /// Name that could not be found
        referenced: String,
    },

    /// A capability contract was named as a parent
    #[error("{declaring} cannot extend capability contract {parent}")]
    InvalidParent {
        /// Type being declared
        declaring: String,
        /// Contract named as parent
        parent: String,
    },

    /// A non-contract was listed as an implemented contract
    #[error("{declaring} cannot implement {referenced}: not a capability contract")]
    NotACapabilityContract {
        /// Type being declared
        declaring: String,
        /// Offending name
        referenced: String,
    },

    /// Two markers of the same kind on one type
    #[error("{declaring} carries marker {marker} more than once")]
    DuplicateMarker {
        /// Type being declared
        declaring: String,
        /// Repeated marker kind
        marker: String,
    },

    /// Re-export from a module of a type that does not exist
    #[error("Cannot re-export unknown type {0}")]
    UnknownExport(String),
}

/// Declaration of a type, consumed by [`Registry::register`]
#[derive(Debug, Clone)]
pub struct TypeDecl {
    name: String,
    kind: TypeKind,
    parent: Option<String>,
    contracts: Vec<String>,
    markers: Vec<MarkerInstance>,
}

impl TypeDecl {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            contracts: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Declare a concrete type
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    /// Declare an abstract type
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Abstract)
    }

    /// Declare a capability contract
    pub fn contract(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Contract)
    }

    /// Declare with an explicit kind
    pub fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self::new(name, kind)
    }

    /// Set the immediate parent
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Add a directly-implemented contract
    pub fn implements(mut self, contract: impl Into<String>) -> Self {
        self.contracts.push(contract.into());
        self
    }

    /// Attach a marker with its data
    pub fn marker(mut self, kind: impl Into<MarkerKind>, data: impl Into<Value>) -> Self {
        self.markers.push(MarkerInstance {
            kind: kind.into(),
            data: data.into(),
        });
        self
    }

    /// Declared name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Registry of type descriptors and the modules that list them
#[derive(Debug)]
pub struct Registry {
    /// Process-unique id stamped into every key this registry issues
    id: u32,
    /// Descriptors indexed by key
    types: Vec<TypeDescriptor>,
    /// Type name to key mapping
    name_to_key: FxHashMap<String, TypeKey>,
    /// Modules by name
    modules: FxHashMap<String, ModuleMetadata>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            types: Vec::new(),
            name_to_key: FxHashMap::default(),
            modules: FxHashMap::default(),
        }
    }
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-unique id of this registry
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Check if `key` was issued by this registry
    pub fn owns(&self, key: TypeKey) -> bool {
        key.registry == self.id && key.index() < self.types.len()
    }

    /// Register a type declared by `module`.
    ///
    /// The module is created on first use.
    pub fn register(&mut self, module: &str, decl: TypeDecl) -> Result<TypeKey, RegistryError> {
        if self.name_to_key.contains_key(&decl.name) {
            return Err(RegistryError::DuplicateType(decl.name));
        }

        let parent = match &decl.parent {
            Some(parent_name) => {
                let parent = self.lookup(&decl.name, parent_name)?;
                if parent.is_contract() {
                    return Err(RegistryError::InvalidParent {
                        declaring: decl.name.clone(),
                        parent: parent_name.clone(),
                    });
                }
                Some(parent.key)
            }
            None => None,
        };

        let mut contracts = Vec::with_capacity(decl.contracts.len());
        for contract_name in &decl.contracts {
            let contract = self.lookup(&decl.name, contract_name)?;
            if !contract.is_contract() {
                return Err(RegistryError::NotACapabilityContract {
                    declaring: decl.name.clone(),
                    referenced: contract_name.clone(),
                });
            }
            if !contracts.contains(&contract.key) {
                contracts.push(contract.key);
            }
        }

        let mut seen = FxHashSet::default();
        for marker in &decl.markers {
            if !seen.insert(&marker.kind) {
                return Err(RegistryError::DuplicateMarker {
                    declaring: decl.name.clone(),
                    marker: marker.kind.to_string(),
                });
            }
        }

        let key = TypeKey {
            registry: self.id,
            index: self.types.len() as u32,
        };
        tracing::debug!(module, name = %decl.name, %key, "registered type");

        self.name_to_key.insert(decl.name.clone(), key);
        self.types.push(TypeDescriptor {
            key,
            name: decl.name,
            kind: decl.kind,
            parent,
            contracts,
            markers: decl.markers,
            module: module.to_string(),
        });
        self.module_entry(module).push(key);

        Ok(key)
    }

    /// List an already-registered type under another module as well.
    pub fn reexport(&mut self, module: &str, type_name: &str) -> Result<TypeKey, RegistryError> {
        let key = *self
            .name_to_key
            .get(type_name)
            .ok_or_else(|| RegistryError::UnknownExport(type_name.to_string()))?;
        self.module_entry(module).push(key);
        Ok(key)
    }

    /// Create an empty module (no-op if it exists)
    pub fn declare_module(&mut self, module: &str) {
        self.module_entry(module);
    }

    fn module_entry(&mut self, module: &str) -> &mut ModuleMetadata {
        self.modules
            .entry(module.to_string())
            .or_insert_with(|| ModuleMetadata::new(module))
    }

    fn lookup(&self, declaring: &str, referenced: &str) -> Result<&TypeDescriptor, RegistryError> {
        self.type_by_name(referenced)
            .ok_or_else(|| RegistryError::UnknownType {
                declaring: declaring.to_string(),
                referenced: referenced.to_string(),
            })
    }

    /// Get descriptor by key
    pub fn get(&self, key: TypeKey) -> Option<&TypeDescriptor> {
        if key.registry != self.id {
            return None;
        }
        self.types.get(key.index())
    }

    /// Get descriptor by name
    pub fn type_by_name(&self, name: &str) -> Option<&TypeDescriptor> {
        self.name_to_key.get(name).and_then(|key| self.get(*key))
    }

    /// Get descriptor by name, failing with `UnknownType`
    pub fn require_type(&self, name: &str) -> crate::ProbeResult<&TypeDescriptor> {
        self.type_by_name(name)
            .ok_or_else(|| crate::ProbeError::UnknownType {
                name: name.to_string(),
            })
    }

    /// Get module metadata by name
    pub fn module(&self, name: &str) -> Option<&ModuleMetadata> {
        self.modules.get(name)
    }

    /// Iterate all modules (unordered)
    pub fn modules(&self) -> impl Iterator<Item = &ModuleMetadata> {
        self.modules.values()
    }

    /// Iterate all descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if no types are registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Parent of a type, if any
    pub fn parent_of(&self, ty: &TypeDescriptor) -> Option<&TypeDescriptor> {
        ty.parent.and_then(|key| self.get(key))
    }

    /// Walk the parent chain from the immediate parent outward to the root.
    pub fn ancestors<'r>(&'r self, ty: &TypeDescriptor) -> Ancestors<'r> {
        Ancestors {
            registry: self,
            next: ty.parent,
        }
    }

    /// The type itself followed by its ancestors
    pub fn hierarchy<'r>(&'r self, ty: &'r TypeDescriptor) -> impl Iterator<Item = &'r TypeDescriptor> {
        std::iter::once(ty).chain(self.ancestors(ty))
    }

    /// Check if `ancestor` appears anywhere in the parent chain of `ty`.
    ///
    /// A type is not its own ancestor.
    pub fn descends_from(&self, ty: &TypeDescriptor, ancestor: TypeKey) -> bool {
        let found = self.ancestors(ty).any(|a| a.key == ancestor);
        tracing::trace!(ty = %ty.name, %ancestor, found, "ancestor walk");
        found
    }
}

/// Iterator over a parent chain, immediate parent first
#[derive(Debug, Clone)]
pub struct Ancestors<'r> {
    registry: &'r Registry,
    next: Option<TypeKey>,
}

impl<'r> Iterator for Ancestors<'r> {
    type Item = &'r TypeDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.registry.get(self.next?)?;
        self.next = current.parent;
        Some(current)
    }
}
