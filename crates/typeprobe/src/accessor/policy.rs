//! Access policy for the member accessor
//!
//! Controls which non-public operations the accessor may perform, per type.
//! Resolution order, most specific first:
//!
//! 1. Exact type-name entry
//! 2. Wildcard rules (`Lib::*`, `Lib::**`, `*`), first match wins
//! 3. Global default (`ALL` unless configured)

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Accessor permission flags (bitflags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessPermission(u8);

impl AccessPermission {
    /// Nothing allowed
    pub const NONE: Self = Self(0x00);
    /// Read non-public fields
    pub const READ_PRIVATE: Self = Self(0x01);
    /// Write non-public fields
    pub const WRITE_PRIVATE: Self = Self(0x02);
    /// Invoke non-public methods
    pub const INVOKE_PRIVATE: Self = Self(0x04);

    /// READ_PRIVATE | WRITE_PRIVATE
    pub const READ_WRITE: Self = Self(0x03);
    /// Everything
    pub const ALL: Self = Self(0x07);

    /// Create from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Get raw bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Check if permission contains a flag
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of permissions
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Difference (remove flags)
    pub const fn difference(&self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    fn from_name(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NONE" => Some(Self::NONE),
            "READ_PRIVATE" => Some(Self::READ_PRIVATE),
            "WRITE_PRIVATE" => Some(Self::WRITE_PRIVATE),
            "INVOKE_PRIVATE" => Some(Self::INVOKE_PRIVATE),
            "READ_WRITE" => Some(Self::READ_WRITE),
            "ALL" => Some(Self::ALL),
            _ => {
                if let Some(hex) = s.strip_prefix("0x") {
                    u8::from_str_radix(hex, 16).ok().map(Self::from_bits)
                } else {
                    s.parse::<u8>().ok().map(Self::from_bits)
                }
            }
        }
    }
}

impl Default for AccessPermission {
    fn default() -> Self {
        Self::ALL
    }
}

/// A permission string could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid permission value: {0}")]
pub struct InvalidPermission(pub String);

impl FromStr for AccessPermission {
    type Err = InvalidPermission;

    /// Parse pipe-separated flags (e.g. `"READ_PRIVATE|WRITE_PRIVATE"`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut result = Self::NONE;
        for part in s.split('|') {
            let perm = Self::from_name(part.trim()).ok_or_else(|| InvalidPermission(s.to_string()))?;
            result = result.union(perm);
        }
        Ok(result)
    }
}

impl fmt::Display for AccessPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NONE => f.write_str("NONE"),
            Self::READ_PRIVATE => f.write_str("READ_PRIVATE"),
            Self::WRITE_PRIVATE => f.write_str("WRITE_PRIVATE"),
            Self::INVOKE_PRIVATE => f.write_str("INVOKE_PRIVATE"),
            Self::READ_WRITE => f.write_str("READ_WRITE"),
            Self::ALL => f.write_str("ALL"),
            _ => write!(f, "0x{:02X}", self.0),
        }
    }
}

/// Type-name pattern rule (supports trailing wildcards)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRule {
    /// Pattern (e.g. "Lib::*", "Lib::**", "*")
    pub pattern: String,
    /// Permissions for matching types
    pub permissions: AccessPermission,
}

impl TypeRule {
    /// Check if a type name matches this pattern
    pub fn matches(&self, type_name: &str) -> bool {
        if self.pattern == "**" || self.pattern == "*" {
            return true;
        }

        if let Some(prefix) = self.pattern.strip_suffix("::**") {
            type_name
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with("::"))
        } else if let Some(prefix) = self.pattern.strip_suffix("::*") {
            type_name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix("::"))
                .is_some_and(|rest| !rest.is_empty() && !rest.contains("::"))
        } else {
            self.pattern == type_name
        }
    }
}

/// Per-type permissions for the member accessor
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    global: AccessPermission,
    types: FxHashMap<String, AccessPermission>,
    rules: Vec<TypeRule>,
}

impl AccessPolicy {
    /// Policy allowing everything
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Policy denying everything not explicitly granted
    pub fn deny_all() -> Self {
        Self {
            global: AccessPermission::NONE,
            ..Self::default()
        }
    }

    /// Set the global default
    pub fn set_global(&mut self, permissions: AccessPermission) {
        self.global = permissions;
    }

    /// Get the global default
    pub fn global(&self) -> AccessPermission {
        self.global
    }

    /// Set permissions for one type name, or add a rule if `pattern` has a wildcard
    pub fn set_type(&mut self, pattern: &str, permissions: AccessPermission) {
        if pattern.contains('*') {
            self.rules.push(TypeRule {
                pattern: pattern.to_string(),
                permissions,
            });
        } else {
            self.types.insert(pattern.to_string(), permissions);
        }
    }

    /// Check if anything beyond the permissive default is configured
    pub fn has_any_restrictions(&self) -> bool {
        self.global != AccessPermission::ALL || !self.types.is_empty() || !self.rules.is_empty()
    }

    /// Resolve the effective permissions for a type
    pub fn resolve(&self, type_name: &str) -> AccessPermission {
        if let Some(perms) = self.types.get(type_name) {
            return *perms;
        }
        self.rules
            .iter()
            .find(|rule| rule.matches(type_name))
            .map(|rule| rule.permissions)
            .unwrap_or(self.global)
    }

    /// Check if `required` is allowed on `type_name`
    pub fn allows(&self, type_name: &str, required: AccessPermission) -> bool {
        self.resolve(type_name).contains(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_flags() {
        let rw = AccessPermission::READ_WRITE;
        assert!(rw.contains(AccessPermission::READ_PRIVATE));
        assert!(rw.contains(AccessPermission::WRITE_PRIVATE));
        assert!(!rw.contains(AccessPermission::INVOKE_PRIVATE));
        assert_eq!(
            AccessPermission::ALL.difference(AccessPermission::INVOKE_PRIVATE),
            AccessPermission::READ_WRITE
        );
    }

    #[test]
    fn test_permission_parse() {
        assert_eq!("ALL".parse::<AccessPermission>().unwrap(), AccessPermission::ALL);
        assert_eq!(
            "read_private | invoke_private".parse::<AccessPermission>().unwrap(),
            AccessPermission::from_bits(0x05)
        );
        assert_eq!("0x02".parse::<AccessPermission>().unwrap(), AccessPermission::WRITE_PRIVATE);
        assert_eq!("3".parse::<AccessPermission>().unwrap(), AccessPermission::READ_WRITE);
        assert!("SUDO".parse::<AccessPermission>().is_err());
    }

    #[test]
    fn test_permission_display() {
        assert_eq!(AccessPermission::ALL.to_string(), "ALL");
        assert_eq!(AccessPermission::from_bits(0x05).to_string(), "0x05");
    }

    #[test]
    fn test_type_rule_matching() {
        let single = TypeRule {
            pattern: "Lib::*".to_string(),
            permissions: AccessPermission::NONE,
        };
        assert!(single.matches("Lib::Foo"));
        assert!(!single.matches("Lib::Inner::Foo"));
        assert!(!single.matches("Lib::"));
        assert!(!single.matches("Library::Foo"));

        let deep = TypeRule {
            pattern: "Lib::**".to_string(),
            permissions: AccessPermission::NONE,
        };
        assert!(deep.matches("Lib::Inner::Foo"));
        assert!(!deep.matches("Lib"));

        let exact = TypeRule {
            pattern: "Foo".to_string(),
            permissions: AccessPermission::NONE,
        };
        assert!(exact.matches("Foo"));
        assert!(!exact.matches("FooBar"));
    }

    #[test]
    fn test_policy_resolution_order() {
        let mut policy = AccessPolicy::deny_all();
        policy.set_type("Lib::*", AccessPermission::READ_PRIVATE);
        policy.set_type("Lib::Open", AccessPermission::ALL);

        assert_eq!(policy.resolve("Lib::Open"), AccessPermission::ALL);
        assert_eq!(policy.resolve("Lib::Other"), AccessPermission::READ_PRIVATE);
        assert_eq!(policy.resolve("Elsewhere"), AccessPermission::NONE);
        assert!(policy.has_any_restrictions());
        assert!(!AccessPolicy::permissive().has_any_restrictions());
    }
}
