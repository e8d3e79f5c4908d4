//! Typed definitions files: loading, serialization, and registry construction.
//!
//! A definitions file lists `[[arch]]` records followed by `[[machine]]`
//! declarations. Architectures are registered in file order, then machines,
//! so a machine may reference any architecture in the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::arch::ArchDef;
use crate::error::{RegistryError, Result};
use crate::registry::{Registry, RegistryBuilder};

/// File name searched for by [`find_definitions`].
pub const DEFINITIONS_FILE: &str = "capreg.toml";

const BUILTIN_TOML: &str = include_str!("../defs/builtin.toml");

/// Member list of a machine declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberList {
    /// Explicit list of entries.
    List(Vec<String>),
    /// Whitespace-separated entries, e.g. `"generic 32|64 sse orc|"`.
    Words(String),
}

impl MemberList {
    pub fn entries(&self) -> Vec<String> {
        match self {
            MemberList::List(list) => list.clone(),
            MemberList::Words(words) => words.split_whitespace().map(String::from).collect(),
        }
    }
}

impl Default for MemberList {
    fn default() -> Self {
        MemberList::List(Vec::new())
    }
}

/// A machine declaration as it appears in a definitions file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MachineDef {
    /// Base machine name.
    pub name: String,
    /// Member entries; each may be an alternative slot.
    #[serde(default)]
    pub archs: MemberList,
}

/// Parsed contents of a definitions file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definitions {
    #[serde(default, rename = "arch")]
    pub archs: Vec<ArchDef>,
    #[serde(default, rename = "machine")]
    pub machines: Vec<MachineDef>,
}

impl Definitions {
    /// The catalogue bundled with this crate.
    pub fn builtin() -> Result<Self> {
        parse_definitions_toml(BUILTIN_TOML)
    }

    /// Register every architecture, then every machine, and freeze.
    ///
    /// The first failure aborts and no registry is produced.
    pub fn into_registry(self) -> Result<Registry> {
        let mut builder = RegistryBuilder::new();
        for arch in self.archs {
            builder.register_arch(arch)?;
        }
        for machine in &self.machines {
            builder.register_machine(&machine.name, &machine.archs.entries())?;
        }
        Ok(builder.finish())
    }
}

/// Load definitions from a TOML file.
pub fn load_definitions_toml(path: &Path) -> Result<Definitions> {
    if !path.exists() {
        return Err(RegistryError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let defs = parse_definitions_toml(&content)?;
    tracing::info!(
        path = %path.display(),
        archs = defs.archs.len(),
        machines = defs.machines.len(),
        "loaded definitions"
    );
    Ok(defs)
}

/// Parse definitions from a TOML string.
pub fn parse_definitions_toml(toml_str: &str) -> Result<Definitions> {
    let defs: Definitions = toml::from_str(toml_str)?;
    Ok(defs)
}

/// Serialize definitions to pretty TOML.
pub fn definitions_to_toml(defs: &Definitions) -> Result<String> {
    let toml_str = toml::to_string_pretty(defs)?;
    Ok(toml_str)
}

/// Search upward from `start_dir` for a [`DEFINITIONS_FILE`].
pub fn find_definitions(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(DEFINITIONS_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}
