//! `typeprobe marker`: Print the data of a required marker.

use std::io::Write;

use typeprobe::{require_marker, MarkerKind, Registry};

pub fn execute(
    registry: &Registry,
    type_name: &str,
    marker: &str,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let ty = registry.require_type(type_name)?;
    let data = require_marker(ty, &MarkerKind::new(marker))?;
    writeln!(out, "{}", serde_json::to_string_pretty(data)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{output, registry};

    fn run(ty: &str, marker: &str) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        execute(&registry(), ty, marker, &mut buf)?;
        Ok(output(buf))
    }

    #[test]
    fn test_marker_data() {
        assert_eq!(run("Foo", "Marked").unwrap(), "42\n");
        let bar: serde_json::Value = serde_json::from_str(&run("Bar", "Marked").unwrap()).unwrap();
        assert_eq!(bar["label"], "bar");
    }

    #[test]
    fn test_marker_missing() {
        let err = run("Base", "Marked").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Base"));
        assert!(message.contains("Marked"));
    }
}
