//! Subcommand implementations
//!
//! Each command takes the loaded registry and writes its report to `out`.

pub mod find;
pub mod hierarchy;
pub mod implements;
pub mod marker;
pub mod modules;
