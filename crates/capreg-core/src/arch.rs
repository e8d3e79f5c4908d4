//! Architecture model and registry.
//!
//! An architecture is a named instruction-set extension (e.g. "sse2", "neon")
//! carrying per-compiler flags, an alignment requirement, and opaque
//! capability-check descriptors that downstream generators hand off to
//! detection code.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// A compiler identifier used to select an architecture's flag set.
///
/// Identifiers are case-normalized: `CompilerId::new("GNU") == CompilerId::new("gnu")`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CompilerId(String);

impl CompilerId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CompilerId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for CompilerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<CompilerId> for String {
    fn from(id: CompilerId) -> Self {
        id.0
    }
}

impl fmt::Display for CompilerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An opaque capability-test descriptor, stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Check {
    /// Check name (e.g. "cpuid_x86_bit").
    pub name: String,
    /// Ordered check parameters.
    #[serde(default)]
    pub params: Vec<String>,
}

fn default_alignment() -> u32 {
    1
}

fn is_default_alignment(alignment: &u32) -> bool {
    *alignment == 1
}

/// An architecture record as it appears in a definitions file, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArchDef {
    /// Unique architecture name (required, non-empty).
    #[serde(default)]
    pub name: String,
    /// Free-form environment tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Header associated with this architecture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    /// Byte alignment requirement.
    #[serde(default = "default_alignment", skip_serializing_if = "is_default_alignment")]
    pub alignment: u32,
    /// Capability checks, in declaration order.
    #[serde(default, rename = "check", skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<Check>,
    /// Flags keyed by compiler identifier.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, Vec<String>>,
}

impl ArchDef {
    /// A bare record with the given name and default alignment.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environment: None,
            include: None,
            alignment: default_alignment(),
            checks: Vec::new(),
            flags: BTreeMap::new(),
        }
    }

    pub fn with_alignment(mut self, alignment: u32) -> Self {
        self.alignment = alignment;
        self
    }

    /// Add flags for `compiler`, appending to any already present.
    pub fn with_flags(mut self, compiler: &str, flags: &[&str]) -> Self {
        self.flags
            .entry(compiler.to_string())
            .or_default()
            .extend(flags.iter().map(|f| f.to_string()));
        self
    }
}

/// A validated architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Architecture {
    pub name: String,
    pub environment: Option<String>,
    pub include: Option<String>,
    /// Always >= 1.
    pub alignment: u32,
    pub checks: Vec<Check>,
    /// An empty map means every compiler is supported.
    pub compiler_flags: BTreeMap<CompilerId, Vec<String>>,
}

impl TryFrom<ArchDef> for Architecture {
    type Error = RegistryError;

    fn try_from(def: ArchDef) -> Result<Self> {
        let name = def.name.trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::MissingArchName);
        }
        if def.alignment == 0 {
            return Err(RegistryError::InvalidAlignment {
                arch: name,
                alignment: def.alignment,
            });
        }

        // Keys must stay distinct after lowercasing.
        let mut compiler_flags: BTreeMap<CompilerId, Vec<String>> = BTreeMap::new();
        for (compiler, flags) in def.flags {
            let id = CompilerId::new(compiler);
            if compiler_flags.contains_key(&id) {
                return Err(RegistryError::DuplicateCompiler {
                    arch: name,
                    compiler: id.into(),
                });
            }
            compiler_flags.insert(id, flags);
        }

        Ok(Self {
            name,
            environment: def.environment,
            include: def.include,
            alignment: def.alignment,
            checks: def.checks,
            compiler_flags,
        })
    }
}

impl Architecture {
    /// Whether `compiler` can build code for this architecture.
    pub fn is_supported(&self, compiler: &CompilerId) -> bool {
        self.compiler_flags.is_empty() || self.compiler_flags.contains_key(compiler)
    }

    /// Flags `compiler` needs for this architecture; empty when it has none.
    pub fn flags(&self, compiler: &CompilerId) -> &[String] {
        self.compiler_flags
            .get(compiler)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Position of an architecture in the registry catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArchIndex(usize);

/// Ordered catalogue of architectures with a name lookup.
#[derive(Debug, Clone, Default)]
pub struct ArchRegistry {
    archs: Vec<Architecture>,
    index: HashMap<String, ArchIndex>,
}

impl ArchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append an architecture.
    pub fn register(&mut self, def: ArchDef) -> Result<ArchIndex> {
        let arch = Architecture::try_from(def)?;
        if self.index.contains_key(&arch.name) {
            return Err(RegistryError::DuplicateArch { name: arch.name });
        }

        let idx = ArchIndex(self.archs.len());
        tracing::debug!(
            arch = %arch.name,
            alignment = arch.alignment,
            compilers = arch.compiler_flags.len(),
            "registered architecture"
        );
        self.index.insert(arch.name.clone(), idx);
        self.archs.push(arch);
        Ok(idx)
    }

    /// Look up an architecture's catalogue position by name.
    pub fn lookup(&self, name: &str) -> Option<ArchIndex> {
        self.index.get(name).copied()
    }

    /// Look up an architecture by name.
    pub fn get(&self, name: &str) -> Option<&Architecture> {
        self.lookup(name).and_then(|idx| self.at(idx))
    }

    /// The architecture at a catalogue position; `None` for an index from another registry.
    pub fn at(&self, idx: ArchIndex) -> Option<&Architecture> {
        self.archs.get(idx.0)
    }

    /// Architectures in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Architecture> {
        self.archs.iter()
    }

    pub fn len(&self) -> usize {
        self.archs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gcc() -> CompilerId {
        CompilerId::new("gcc")
    }

    #[test]
    fn compiler_id_is_case_normalized() {
        assert_eq!(CompilerId::new("GCC"), gcc());
        assert_eq!(CompilerId::new(" Clang ").as_str(), "clang");
    }

    #[test]
    fn empty_flag_map_is_universal() {
        let arch = Architecture::try_from(ArchDef::named("generic")).unwrap();
        assert!(arch.is_supported(&gcc()));
        assert!(arch.is_supported(&CompilerId::new("msvc")));
        assert!(arch.flags(&gcc()).is_empty());
    }

    #[test]
    fn flags_for_absent_compiler_are_empty() {
        let arch =
            Architecture::try_from(ArchDef::named("sse").with_flags("gcc", &["-msse"])).unwrap();
        assert!(arch.is_supported(&gcc()));
        assert!(!arch.is_supported(&CompilerId::new("msvc")));
        assert_eq!(arch.flags(&gcc()), ["-msse"]);
        assert!(arch.flags(&CompilerId::new("msvc")).is_empty());
    }

    #[test]
    fn flag_keys_are_normalized() {
        let def = ArchDef::named("avx").with_flags("GCC", &["-mavx", "-mfma"]);
        let arch = Architecture::try_from(def).unwrap();
        assert_eq!(arch.flags(&gcc()), ["-mavx", "-mfma"]);
        assert!(arch.is_supported(&CompilerId::new("Gcc")));
    }

    #[test]
    fn case_colliding_compiler_keys_are_rejected() {
        let def = ArchDef::named("avx")
            .with_flags("gcc", &["-mfirst"])
            .with_flags("GCC", &["-msecond"]);
        let err = Architecture::try_from(def).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateCompiler { ref arch, ref compiler } if arch == "avx" && compiler == "gcc"
        ));
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = Architecture::try_from(ArchDef::named("  ")).unwrap_err();
        assert!(matches!(err, RegistryError::MissingArchName));
    }

    #[test]
    fn zero_alignment_is_rejected() {
        let err = Architecture::try_from(ArchDef::named("sse").with_alignment(0)).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidAlignment { alignment: 0, .. }));
    }

    #[test]
    fn registry_preserves_order_and_rejects_duplicates() {
        let mut reg = ArchRegistry::new();
        let a = reg.register(ArchDef::named("generic")).unwrap();
        let b = reg.register(ArchDef::named("sse").with_alignment(16)).unwrap();
        assert_ne!(a, b);
        assert_eq!(reg.at(b).unwrap().alignment, 16);
        assert_eq!(reg.lookup("generic"), Some(a));
        assert!(reg.get("neon").is_none());

        let names: Vec<_> = reg.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["generic", "sse"]);

        let err = reg.register(ArchDef::named("sse")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateArch { ref name } if name == "sse"));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn foreign_index_is_not_found() {
        let mut big = ArchRegistry::new();
        big.register(ArchDef::named("generic")).unwrap();
        let second = big.register(ArchDef::named("sse")).unwrap();

        let mut small = ArchRegistry::new();
        small.register(ArchDef::named("generic")).unwrap();
        assert!(small.at(second).is_none());
    }
}
