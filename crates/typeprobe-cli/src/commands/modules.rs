//! `typeprobe modules`: List modules with their type counts.

use std::io::Write;

use typeprobe::Registry;

pub fn execute(registry: &Registry, out: &mut dyn Write) -> anyhow::Result<()> {
    let mut modules: Vec<_> = registry.modules().collect();
    modules.sort_by(|a, b| a.name().cmp(b.name()));

    for module in modules {
        writeln!(out, "{}\t{}", module.name(), module.types().len())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{output, registry};

    #[test]
    fn test_modules_sorted() {
        let mut buf = Vec::new();
        execute(&registry(), &mut buf).unwrap();
        assert_eq!(output(buf), "Extra\t1\nLib\t5\n");
    }
}
