//! Read-only queries over a finalized [`Registry`].
//!
//! Results are ordered sequences; the `Display` impls render them in the
//! line formats build scripts consume:
//!
//! | query                 | format                     |
//! |-----------------------|----------------------------|
//! | [`arch_flags`]        | `name,flag,flag;name,flag` |
//! | [`machines_matching`] | `machine;machine`          |
//! | [`machine_flags`]     | `flag flag flag`           |

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::arch::CompilerId;
use crate::error::{RegistryError, Result};
use crate::registry::Registry;

/// Separates records in list output.
pub const LIST_SEPARATOR: &str = ";";
/// Separates fields within an `arch_flags` record.
pub const FIELD_SEPARATOR: &str = ",";
/// Separates flag tokens in `machine_flags` output.
pub const FLAG_SEPARATOR: &str = " ";

/// One supported architecture and the flags a compiler needs for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchFlags {
    pub arch: String,
    pub flags: Vec<String>,
}

/// Result of [`arch_flags`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArchFlagsList(pub Vec<ArchFlags>);

impl fmt::Display for ArchFlagsList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, record) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(LIST_SEPARATOR)?;
            }
            f.write_str(&record.arch)?;
            for flag in &record.flags {
                write!(f, "{FIELD_SEPARATOR}{flag}")?;
            }
        }
        Ok(())
    }
}

/// Result of [`machines_matching`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MachineList(pub Vec<String>);

impl fmt::Display for MachineList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(LIST_SEPARATOR))
    }
}

/// Result of [`machine_flags`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlagList(pub Vec<String>);

impl fmt::Display for FlagList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(FLAG_SEPARATOR))
    }
}

/// A set of architecture names known to be available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchSet(BTreeSet<String>);

impl ArchSet {
    /// Parse a `;`-separated list. Empty tokens are ignored.
    pub fn parse(list: &str) -> Self {
        list.split(LIST_SEPARATOR)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ArchSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Every architecture `compiler` supports, with its flags, in catalogue order.
///
/// Supported architectures without flags for `compiler` still appear.
pub fn arch_flags(registry: &Registry, compiler: &CompilerId) -> ArchFlagsList {
    ArchFlagsList(
        registry
            .archs()
            .iter()
            .filter(|arch| arch.is_supported(compiler))
            .map(|arch| ArchFlags {
                arch: arch.name.clone(),
                flags: arch.flags(compiler).to_vec(),
            })
            .collect(),
    )
}

/// Machines whose every member is in `available`, in catalogue order.
///
/// Machines with no members always match.
pub fn machines_matching(registry: &Registry, available: &ArchSet) -> MachineList {
    MachineList(
        registry
            .machines()
            .iter()
            .filter(|m| m.arch_names().iter().all(|a| available.contains(a)))
            .map(|m| m.name().to_string())
            .collect(),
    )
}

/// Flags `compiler` needs for every member of `machine_name`, concatenated in
/// member order without deduplication.
pub fn machine_flags(
    registry: &Registry,
    compiler: &CompilerId,
    machine_name: &str,
) -> Result<FlagList> {
    let members = registry
        .machine_members(machine_name)
        .ok_or_else(|| RegistryError::MachineNotFound {
            name: machine_name.to_string(),
        })?;
    let flags = members
        .flat_map(|arch| arch.flags(compiler).iter().cloned())
        .collect();
    Ok(FlagList(flags))
}
