//! `typeprobe find`: Run one of the four discovery combinators.

use std::io::Write;

use anyhow::bail;
use serde_json::json;
use typeprobe::{Discovery, MarkerKind, ModuleSet, Registry, TypeDescriptor, Value};

/// Options of a `find` invocation
#[derive(Debug, Clone, Default)]
pub struct FindArgs {
    pub modules: Vec<String>,
    pub marker: Option<String>,
    pub capability: Option<String>,
    pub ancestor: Option<String>,
    pub json: bool,
}

pub fn execute(registry: &Registry, args: &FindArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    if args.modules.is_empty() {
        bail!("no modules to search: pass --module or set [discovery] modules");
    }

    let discovery = Discovery::new(registry, &ModuleSet::new(args.modules.iter().cloned()))?;
    let marker = args.marker.as_deref().map(MarkerKind::new);

    let found: Vec<(&TypeDescriptor, Option<&Value>)> =
        match (&marker, &args.capability, &args.ancestor) {
            (Some(marker), None, None) => discovery
                .with_marker(marker)
                .map(|(ty, data)| (ty, Some(data)))
                .collect(),
            (None, Some(contract), None) => {
                let contract = registry.require_type(contract)?;
                discovery
                    .with_capability(contract)?
                    .map(|ty| (ty, None))
                    .collect()
            }
            (Some(marker), Some(contract), None) => {
                let contract = registry.require_type(contract)?;
                discovery
                    .with_marker_and_capability(marker, contract)?
                    .map(|(ty, data)| (ty, Some(data)))
                    .collect()
            }
            (Some(marker), None, Some(ancestor)) => {
                let ancestor = registry.require_type(ancestor)?;
                discovery
                    .with_marker_and_ancestor(marker, ancestor)
                    .map(|(ty, data)| (ty, Some(data)))
                    .collect()
            }
            (None, None, None) => bail!("find needs --marker or --capability"),
            (None, _, Some(_)) => bail!("--ancestor can only be combined with --marker"),
            (_, Some(_), Some(_)) => bail!("--capability and --ancestor cannot be combined"),
        };
    tracing::debug!(matches = found.len(), "find complete");

    if args.json {
        let rows: Vec<serde_json::Value> = found
            .iter()
            .map(|(ty, data)| {
                json!({
                    "name": ty.name(),
                    "module": ty.declaring_module(),
                    "data": data,
                })
            })
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
        return Ok(());
    }

    for (ty, data) in &found {
        match data {
            Some(data) => writeln!(
                out,
                "{}\t{}\t{}",
                ty.name(),
                ty.declaring_module(),
                serde_json::to_string(data)?
            )?,
            None => writeln!(out, "{}\t{}", ty.name(), ty.declaring_module())?,
        }
    }
    Ok(())
}
