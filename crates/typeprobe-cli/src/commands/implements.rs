//! `typeprobe implements`: Capability check for one type.

use std::io::Write;

use typeprobe::{is_capability_implemented, Registry};

pub fn execute(
    registry: &Registry,
    type_name: &str,
    contract_name: &str,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let ty = registry.require_type(type_name)?;
    let contract = registry.require_type(contract_name)?;
    let implemented = is_capability_implemented(ty, contract)?;
    writeln!(out, "{}", implemented)?;
    Ok(())
}
