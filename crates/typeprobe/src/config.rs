//! Configuration file (typeprobe.toml)
//!
//! ```toml
//! [discovery]
//! modules = ["Lib"]
//!
//! [access]
//! global = "ALL"
//!
//! [access.types]
//! "Lib::Secret" = "READ_PRIVATE"
//! "Lib::*" = "READ_PRIVATE|WRITE_PRIVATE"
//!
//! [log]
//! filter = "warn"
//! ```
//!
//! Every section is optional.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::accessor::{AccessPermission, AccessPolicy, InvalidPermission};
use crate::module::ModuleSet;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A permission string in `[access]` is not valid
    #[error("Invalid config: {0}")]
    InvalidPermission(#[from] InvalidPermission),
}

/// Parsed `typeprobe.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Discovery defaults
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Accessor permissions
    #[serde(default)]
    pub access: AccessConfig,

    /// Logging
    #[serde(default)]
    pub log: LogConfig,
}

/// `[discovery]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Module set used when none is given explicitly
    #[serde(default)]
    pub modules: Vec<String>,
}

impl DiscoveryConfig {
    /// Default module set
    pub fn module_set(&self) -> ModuleSet {
        ModuleSet::new(self.modules.iter().cloned())
    }
}

/// `[access]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Permissions for types without a more specific entry
    #[serde(default = "default_global")]
    pub global: String,

    /// Exact type names or wildcard patterns mapped to permission strings.
    ///
    /// Kept in file order: the first matching wildcard wins.
    #[serde(default)]
    pub types: IndexMap<String, String>,
}

fn default_global() -> String {
    "ALL".to_string()
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            global: default_global(),
            types: IndexMap::new(),
        }
    }
}

impl AccessConfig {
    /// Build the accessor policy described by this section
    pub fn to_policy(&self) -> Result<AccessPolicy, ConfigError> {
        let mut policy = AccessPolicy::permissive();
        policy.set_global(self.global.parse::<AccessPermission>()?);
        for (pattern, perms) in &self.types {
            policy.set_type(pattern, perms.parse::<AccessPermission>()?);
        }
        Ok(policy)
    }
}

/// `[log]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl ProbeConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a string.
    ///
    /// Permission strings are validated here so a bad file fails at load.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ProbeConfig = toml::from_str(content)?;
        config.access.to_policy()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = ProbeConfig::from_toml_str("").unwrap();
        assert!(config.discovery.modules.is_empty());
        assert_eq!(config.access.global, "ALL");
        assert_eq!(config.log.filter, "warn");
        assert!(!config.access.to_policy().unwrap().has_any_restrictions());
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
[discovery]
modules = ["Lib", "Plugins"]

[access]
global = "NONE"

[access.types]
"Lib::Secret" = "READ_PRIVATE"
"Lib::*" = "READ_PRIVATE|WRITE_PRIVATE"

[log]
filter = "typeprobe=debug"
"#;
        let config = ProbeConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.discovery.module_set().names(), &["Lib", "Plugins"]);
        assert_eq!(config.log.filter, "typeprobe=debug");

        let policy = config.access.to_policy().unwrap();
        assert_eq!(policy.resolve("Lib::Secret"), AccessPermission::READ_PRIVATE);
        assert_eq!(policy.resolve("Lib::Other"), AccessPermission::READ_WRITE);
        assert_eq!(policy.resolve("Other"), AccessPermission::NONE);
    }

    #[test]
    fn test_wildcard_rules_keep_file_order() {
        let toml = r#"
[access]
global = "NONE"

[access.types]
"Lib::*" = "ALL"
"*" = "READ_PRIVATE"
"Lib::Inner::*" = "WRITE_PRIVATE"
"Lib::**" = "INVOKE_PRIVATE"
"#;
        let config = ProbeConfig::from_toml_str(toml).unwrap();
        let patterns: Vec<&str> = config.access.types.keys().map(String::as_str).collect();
        assert_eq!(patterns, vec!["Lib::*", "*", "Lib::Inner::*", "Lib::**"]);

        let policy = config.access.to_policy().unwrap();
        // "Lib::*" is written before "*", so it wins for direct members of Lib
        assert_eq!(policy.resolve("Lib::Session"), AccessPermission::ALL);
        // "*" is written before the nested rules and shadows them
        assert_eq!(policy.resolve("Lib::Inner::Deep"), AccessPermission::READ_PRIVATE);
        assert_eq!(policy.resolve("Other"), AccessPermission::READ_PRIVATE);
    }

    #[test]
    fn test_invalid_permission() {
        let toml = r#"
[access.types]
"Lib::Secret" = "READ_EVERYTHING"
"#;
        let err = ProbeConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPermission(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typeprobe.toml");
        std::fs::write(&path, "[discovery]\nmodules = [\"Lib\"]\n").unwrap();

        let config = ProbeConfig::from_file(&path).unwrap();
        assert_eq!(config.discovery.modules, vec!["Lib".to_string()]);

        assert!(matches!(
            ProbeConfig::from_file(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
