//! CLI command implementations.

pub mod query;

use std::path::Path;

use anyhow::{Context, Result};
use capreg_core::{find_definitions, load_definitions_toml, Definitions, Registry};
use clap::ValueEnum;

/// Rendering of a query result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// The `;`/`,`/space-joined line build scripts consume.
    #[default]
    Text,
    Json,
}

/// Load definitions and build the registry.
///
/// `defs` wins when given; otherwise `capreg.toml` is searched upward from
/// `cwd`, and the built-in catalogue is the fallback.
pub fn load_registry(defs: Option<&Path>, cwd: &Path) -> Result<Registry> {
    let path = defs.map(Path::to_path_buf).or_else(|| find_definitions(cwd));
    let definitions = match path {
        Some(path) => load_definitions_toml(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            tracing::info!("no definitions file found, using built-in catalogue");
            Definitions::builtin().context("parsing built-in catalogue")?
        }
    };
    let registry = definitions
        .into_registry()
        .context("building capability registry")?;
    tracing::info!(
        archs = registry.archs().len(),
        machines = registry.machines().len(),
        "registry ready"
    );
    Ok(registry)
}
