//! Typeprobe
//!
//! Structural introspection over a registered type universe:
//! - **Registry**: descriptors for every declared type, grouped into named modules (`registry`)
//! - **Discovery**: module resolution, lazy enumeration and the four query
//!   combinators (`module`, `universe`, `query`)
//! - **Accessor**: opt-in access to non-public members of live instances, for
//!   test harnesses only (`accessor`)
//!
//! # Example
//!
//! ```rust,ignore
//! use typeprobe::{find_types_with_marker_and_capability, MarkerKind, ModuleSet, Registry, TypeDecl};
//!
//! let mut registry = Registry::new();
//! registry.register("Lib", TypeDecl::contract("Thing"))?;
//! registry.register("Lib", TypeDecl::class("Foo").implements("Thing").marker("Marked", 42))?;
//!
//! let thing = registry.require_type("Thing")?;
//! let found: Vec<_> = find_types_with_marker_and_capability(
//!     &registry,
//!     &ModuleSet::new(["Lib"]),
//!     &MarkerKind::new("Marked"),
//!     thing,
//! )?
//! .collect();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Member accessor: test-only access to non-public members
pub mod accessor;

/// File-backed metadata source
pub mod catalog;

/// Configuration file (`typeprobe.toml`)
pub mod config;

/// Error types
pub mod error;

/// Process-wide registry for self-registration at startup
pub mod global;

/// Module resolver
pub mod module;

/// Predicate combinators, capability checker and marker requirement
pub mod query;

/// Type descriptor registry
pub mod registry;

/// Type universe enumeration
pub mod universe;

/// Dynamic values (marker data, member values)
pub mod value;

pub use accessor::{
    invoke_method, read_field, try_invoke_method, write_field, AccessPermission, AccessPolicy,
    Inspectable, MemberAccessor, MemberTable, Visibility,
};
pub use catalog::{Catalog, CatalogError};
pub use config::{ConfigError, ProbeConfig};
pub use error::{ProbeError, ProbeResult};
pub use module::{ModuleHandle, ModuleResolver, ModuleSet};
pub use query::{
    find_types_with_capability, find_types_with_marker, find_types_with_marker_and_ancestor,
    find_types_with_marker_and_capability, is_capability_implemented, require_marker,
    require_marker_as, Discovery,
};
pub use registry::{
    MarkerInstance, MarkerKind, ModuleMetadata, Registry, RegistryError, TypeDecl,
    TypeDescriptor, TypeKey, TypeKind,
};
pub use universe::TypeUniverse;
pub use value::{FromValue, IntoValue, Value, ValueKind};
