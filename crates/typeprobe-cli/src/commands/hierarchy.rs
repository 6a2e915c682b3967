//! `typeprobe hierarchy`: Print a type followed by its ancestors.

use std::io::Write;

use typeprobe::Registry;

pub fn execute(registry: &Registry, type_name: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let ty = registry.require_type(type_name)?;
    for (depth, ancestor) in registry.hierarchy(ty).enumerate() {
        writeln!(
            out,
            "{}{} ({})",
            "  ".repeat(depth),
            ancestor.name(),
            ancestor.kind()
        )?;
    }
    Ok(())
}
