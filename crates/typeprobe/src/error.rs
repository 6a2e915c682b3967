//! Error types for discovery and member access

use thiserror::Error;

use crate::value::ValueKind;

/// Errors reported synchronously by discovery queries and the member accessor.
///
/// Nothing is retried or recovered locally. Failures raised by an invoked
/// method travel through [`ProbeError::Raised`] untouched.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A requested module name is not known to the registry
    #[error("Module not found: {module}")]
    ModuleNotFound {
        /// Offending module name
        module: String,
    },

    /// A type name is not known to the registry
    #[error("Type not found: {name}")]
    UnknownType {
        /// Offending type name
        name: String,
    },

    /// A required marker is absent from a type
    #[error("There is no marker on specified type. SourceType={type_name}. MarkerKind={marker}")]
    MarkerMissing {
        /// Name of the type that was inspected
        type_name: String,
        /// Marker kind that was required
        marker: String,
    },

    /// A non-contract descriptor was passed where a capability contract was required
    #[error("Type is not a capability contract. Type={type_name}")]
    NotACapabilityContract {
        /// Name of the offending descriptor
        type_name: String,
    },

    /// Marker data does not have the requested shape
    #[error("Marker data for {marker} on {type_name} has an unexpected shape: {source}")]
    MarkerData {
        /// Name of the type carrying the marker
        type_name: String,
        /// Marker kind
        marker: String,
        /// Deserialization failure
        #[source]
        source: serde_json::Error,
    },

    /// A non-public field or method is not exposed by the target's member table
    #[error("Member not found: {type_name}.{member}")]
    MemberNotFound {
        /// Name of the target instance's type
        type_name: String,
        /// Requested member name
        member: String,
    },

    /// A value of the wrong kind was written to a field
    #[error("Cannot assign {actual} to {type_name}.{member} (expected {expected})")]
    ValueKindMismatch {
        /// Name of the target instance's type
        type_name: String,
        /// Field name
        member: String,
        /// Declared kind of the field
        expected: ValueKind,
        /// Kind of the supplied value
        actual: ValueKind,
    },

    /// The access policy forbids the operation
    #[error("Access denied: {operation} on {type_name}.{member}")]
    AccessDenied {
        /// Name of the target instance's type
        type_name: String,
        /// Requested member name
        member: String,
        /// Operation that was attempted (read, write, invoke)
        operation: &'static str,
    },

    /// Failure raised inside an invoked method
    #[error(transparent)]
    Raised(#[from] anyhow::Error),
}

/// Result alias for discovery and accessor operations
pub type ProbeResult<T> = Result<T, ProbeError>;

impl ProbeError {
    /// Shorthand for [`ProbeError::MemberNotFound`]
    pub fn member_not_found(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        ProbeError::MemberNotFound {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    /// True if this error reports an absent member
    pub fn is_member_not_found(&self) -> bool {
        matches!(self, ProbeError::MemberNotFound { .. })
    }
}
