//! Typeprobe command-line tool
//!
//! Loads a catalog file into a registry and runs discovery queries over it.

mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use typeprobe::{Catalog, ProbeConfig};

#[derive(Parser)]
#[command(name = "typeprobe")]
#[command(about = "Discover types in a catalog by marker, capability and ancestry", long_about = None)]
#[command(version)]
struct Cli {
    /// Catalog file (.toml or .json)
    #[arg(short, long)]
    catalog: PathBuf,

    /// Configuration file (typeprobe.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find types matching a marker, capability or ancestor
    Find {
        /// Module to search (repeatable; defaults to [discovery] modules)
        #[arg(short, long = "module")]
        modules: Vec<String>,
        /// Required marker kind
        #[arg(long)]
        marker: Option<String>,
        /// Capability contract the type must implement directly
        #[arg(long)]
        capability: Option<String>,
        /// Type that must appear in the parent chain
        #[arg(long)]
        ancestor: Option<String>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a type directly implements a capability contract
    Implements {
        /// Type name
        #[arg(value_name = "TYPE")]
        ty: String,
        /// Contract name
        contract: String,
    },

    /// Print a marker's data as JSON, failing if the type lacks it
    Marker {
        /// Type name
        #[arg(value_name = "TYPE")]
        ty: String,
        /// Marker kind
        marker: String,
    },

    /// Print a type and its ancestor chain
    Hierarchy {
        /// Type name
        #[arg(value_name = "TYPE")]
        ty: String,
    },

    /// List modules with their type counts
    Modules,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ProbeConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ProbeConfig::default(),
    };
    logging::init_logging(cli.config.as_ref().map(|_| config.log.filter.as_str()));

    let registry = Catalog::from_file(&cli.catalog)
        .and_then(Catalog::into_registry)
        .with_context(|| format!("loading catalog {}", cli.catalog.display()))?;
    tracing::info!(types = registry.len(), "catalog ready");

    let mut out = std::io::stdout().lock();
    match cli.command {
        Commands::Find {
            modules,
            marker,
            capability,
            ancestor,
            json,
        } => {
            let modules = if modules.is_empty() {
                config.discovery.modules.clone()
            } else {
                modules
            };
            let query = commands::find::FindArgs {
                modules,
                marker,
                capability,
                ancestor,
                json,
            };
            commands::find::execute(&registry, &query, &mut out)?;
        }

        Commands::Implements { ty, contract } => {
            commands::implements::execute(&registry, &ty, &contract, &mut out)?;
        }

        Commands::Marker { ty, marker } => {
            commands::marker::execute(&registry, &ty, &marker, &mut out)?;
        }

        Commands::Hierarchy { ty } => {
            commands::hierarchy::execute(&registry, &ty, &mut out)?;
        }

        Commands::Modules => {
            commands::modules::execute(&registry, &mut out)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_find() {
        let cli = Cli::try_parse_from([
            "typeprobe",
            "--catalog",
            "lib.toml",
            "find",
            "-m",
            "Lib",
            "--module",
            "Extra",
            "--marker",
            "Marked",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Find {
                modules,
                marker,
                capability,
                json,
                ..
            } => {
                assert_eq!(modules, vec!["Lib", "Extra"]);
                assert_eq!(marker.as_deref(), Some("Marked"));
                assert!(capability.is_none());
                assert!(json);
            }
            _ => panic!("expected find"),
        }
    }

    #[test]
    fn test_catalog_is_required() {
        assert!(Cli::try_parse_from(["typeprobe", "modules"]).is_err());
    }
}
