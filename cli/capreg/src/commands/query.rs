//! `capreg --mode ...` — the three registry queries.

use std::fmt::Display;

use anyhow::Result;
use capreg_core::{ArchSet, CompilerId, Registry};
use serde::Serialize;

use super::Format;

fn render<T: Display + Serialize>(value: &T, format: Format) -> Result<String> {
    match format {
        Format::Text => Ok(value.to_string()),
        Format::Json => Ok(serde_json::to_string(value)?),
    }
}

/// `--mode arch_flags --compiler <id>`
pub fn arch_flags(registry: &Registry, compiler: &str, format: Format) -> Result<String> {
    let list = capreg_core::arch_flags(registry, &CompilerId::new(compiler));
    tracing::debug!(compiler, archs = list.0.len(), "arch_flags");
    render(&list, format)
}

/// `--mode machines --archs <a;b;c>`
pub fn machines(registry: &Registry, archs: &str, format: Format) -> Result<String> {
    let available = ArchSet::parse(archs);
    let list = capreg_core::machines_matching(registry, &available);
    tracing::debug!(available = available.len(), matched = list.0.len(), "machines");
    render(&list, format)
}

/// `--mode machine_flags --compiler <id> --machine <name>`
pub fn machine_flags(
    registry: &Registry,
    compiler: &str,
    machine: &str,
    format: Format,
) -> Result<String> {
    let flags = capreg_core::machine_flags(registry, &CompilerId::new(compiler), machine)?;
    render(&flags, format)
}
