//! Machine model, alternative-slot expansion, and the machine registry.
//!
//! A machine is an ordered bundle of architectures describing one concrete
//! target CPU profile. Declarations may contain alternative slots such as
//! `"sse|avx|"`, which expand into one machine per choice; an empty choice
//! drops the slot and keeps the base name.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::arch::{ArchIndex, ArchRegistry};
use crate::error::{RegistryError, Result};

/// Separates the choices of an alternative slot.
pub const ALTERNATIVE_DELIMITER: char = '|';

/// Joins a base machine name and a chosen architecture.
pub const NAME_SEPARATOR: char = '_';

/// One fully concrete declaration produced by expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineVariant {
    pub name: String,
    pub archs: Vec<String>,
}

/// Expand a machine declaration into its concrete variants.
///
/// The first alternative slot is split; each choice recurses over the
/// remaining slots, so variants come out depth-first in choice order.
/// Duplicate choices within a slot are ignored after their first occurrence,
/// and empty member entries are dropped from concrete variants.
pub fn expand(name: &str, archs: &[impl AsRef<str>]) -> Vec<MachineVariant> {
    let archs: Vec<String> = archs.iter().map(|a| a.as_ref().trim().to_string()).collect();
    let mut out = Vec::new();
    expand_into(name.to_string(), archs, &mut out);
    out
}

fn expand_into(name: String, archs: Vec<String>, out: &mut Vec<MachineVariant>) {
    let Some(slot) = archs.iter().position(|a| a.contains(ALTERNATIVE_DELIMITER)) else {
        let archs = archs.into_iter().filter(|a| !a.is_empty()).collect();
        out.push(MachineVariant { name, archs });
        return;
    };

    let choices = split_choices(&archs[slot]);
    tracing::trace!(machine = %name, slot, ?choices, "expanding alternative slot");

    for choice in choices {
        let mut next = archs.clone();
        if choice.is_empty() {
            next.remove(slot);
            expand_into(name.clone(), next, out);
        } else {
            next[slot] = choice.clone();
            expand_into(format!("{name}{NAME_SEPARATOR}{choice}"), next, out);
        }
    }
}

fn split_choices(slot: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    slot.split(ALTERNATIVE_DELIMITER)
        .map(|c| c.trim().to_string())
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

/// A resolved machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Machine {
    name: String,
    #[serde(rename = "archs")]
    arch_names: Vec<String>,
    #[serde(skip)]
    members: Vec<ArchIndex>,
    alignment: u32,
}

impl Machine {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member architecture names, in declared order.
    pub fn arch_names(&self) -> &[String] {
        &self.arch_names
    }

    /// Member catalogue positions, in declared order.
    pub fn members(&self) -> &[ArchIndex] {
        &self.members
    }

    /// Largest member alignment; 1 for a machine with no members.
    pub fn alignment(&self) -> u32 {
        self.alignment
    }

    fn resolve(variant: MachineVariant, archs: &ArchRegistry) -> Result<Self> {
        let members = variant
            .archs
            .iter()
            .map(|arch| {
                archs.lookup(arch).ok_or_else(|| RegistryError::UnknownArch {
                    machine: variant.name.clone(),
                    arch: arch.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let alignment = members
            .iter()
            .filter_map(|&idx| archs.at(idx))
            .map(|arch| arch.alignment)
            .max()
            .unwrap_or(1);

        Ok(Self {
            name: variant.name,
            arch_names: variant.archs,
            members,
            alignment,
        })
    }
}

/// Ordered catalogue of machines with a name lookup.
#[derive(Debug, Clone, Default)]
pub struct MachineRegistry {
    machines: Vec<Machine>,
    index: HashMap<String, usize>,
}

impl MachineRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand and register a machine declaration.
    ///
    /// Every variant is resolved against `archs` before any is inserted; on
    /// error the registry is left unchanged. Returns the machines added.
    pub fn register(
        &mut self,
        archs: &ArchRegistry,
        name: &str,
        members: &[impl AsRef<str>],
    ) -> Result<&[Machine]> {
        let variants = expand(name, members);

        let mut batch = Vec::with_capacity(variants.len());
        let mut batch_names = HashSet::new();
        for variant in variants {
            if self.index.contains_key(&variant.name) || !batch_names.insert(variant.name.clone())
            {
                return Err(RegistryError::DuplicateMachine { name: variant.name });
            }
            batch.push(Machine::resolve(variant, archs)?);
        }

        let start = self.machines.len();
        for machine in batch {
            tracing::debug!(
                declared = name,
                machine = %machine.name,
                archs = ?machine.arch_names,
                alignment = machine.alignment,
                "registered machine"
            );
            self.index.insert(machine.name.clone(), self.machines.len());
            self.machines.push(machine);
        }
        Ok(&self.machines[start..])
    }

    /// Look up a machine by name.
    pub fn get(&self, name: &str) -> Option<&Machine> {
        self.index.get(name).map(|&i| &self.machines[i])
    }

    /// Machines in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Machine> {
        self.machines.iter()
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::ArchDef;

    fn archs() -> ArchRegistry {
        let mut reg = ArchRegistry::new();
        reg.register(ArchDef::named("generic")).unwrap();
        reg.register(ArchDef::named("sse").with_alignment(16)).unwrap();
        reg.register(ArchDef::named("avx").with_alignment(32)).unwrap();
        reg.register(ArchDef::named("32")).unwrap();
        reg.register(ArchDef::named("64")).unwrap();
        reg
    }

    fn names(variants: &[MachineVariant]) -> Vec<&str> {
        variants.iter().map(|v| v.name.as_str()).collect()
    }

    #[test]
    fn concrete_declaration_is_unchanged() {
        let variants = expand("plain", &["generic", "sse"]);
        assert_eq!(
            variants,
            vec![MachineVariant {
                name: "plain".into(),
                archs: vec!["generic".into(), "sse".into()],
            }]
        );
    }

    #[test]
    fn omit_choice_keeps_base_name() {
        let variants = expand("base", &["sse|avx|"]);
        assert_eq!(names(&variants), ["base_sse", "base_avx", "base"]);
        assert_eq!(variants[0].archs, ["sse"]);
        assert_eq!(variants[1].archs, ["avx"]);
        assert!(variants[2].archs.is_empty());
    }

    #[test]
    fn two_slots_form_a_cross_product() {
        let variants = expand("m", &["generic", "32|64", "sse|avx"]);
        assert_eq!(names(&variants), ["m_32_sse", "m_32_avx", "m_64_sse", "m_64_avx"]);
        for v in &variants {
            assert_eq!(v.archs.len(), 3);
            assert_eq!(v.archs[0], "generic");
            assert!(v.archs[1] == "32" || v.archs[1] == "64");
            assert!(v.archs[2] == "sse" || v.archs[2] == "avx");
            assert!(v.name.ends_with(&v.archs[2]));
        }
    }

    #[test]
    fn omitted_slot_preserves_later_positions() {
        let variants = expand("m", &["32|", "generic", "sse|"]);
        assert_eq!(names(&variants), ["m_32_sse", "m_32", "m_sse", "m"]);
        assert_eq!(variants[2].archs, ["generic", "sse"]);
        assert_eq!(variants[3].archs, ["generic"]);
    }

    #[test]
    fn duplicate_choices_collapse() {
        let variants = expand("m", &["sse||sse|"]);
        assert_eq!(names(&variants), ["m_sse", "m"]);
    }

    #[test]
    fn register_resolves_members_and_alignment() {
        let archs = archs();
        let mut reg = MachineRegistry::new();
        let added = reg.register(&archs, "base", &["generic", "sse|avx|"]).unwrap();
        assert_eq!(added.len(), 3);

        let sse = reg.get("base_sse").unwrap();
        assert_eq!(sse.arch_names(), ["generic", "sse"]);
        assert_eq!(sse.alignment(), 16);
        assert_eq!(reg.get("base_avx").unwrap().alignment(), 32);
        assert_eq!(reg.get("base").unwrap().alignment(), 1);
        assert_eq!(archs.at(sse.members()[1]).unwrap().name, "sse");
    }

    #[test]
    fn empty_machine_has_unit_alignment() {
        let archs = archs();
        let mut reg = MachineRegistry::new();
        let empty: [&str; 0] = [];
        reg.register(&archs, "none", &empty).unwrap();
        let m = reg.get("none").unwrap();
        assert!(m.members().is_empty());
        assert_eq!(m.alignment(), 1);
    }

    #[test]
    fn unknown_arch_leaves_registry_untouched() {
        let archs = archs();
        let mut reg = MachineRegistry::new();
        let err = reg.register(&archs, "m", &["sse|neon"]).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::UnknownArch { ref machine, ref arch } if machine == "m_neon" && arch == "neon"
        ));
        assert!(reg.is_empty());
        assert!(reg.get("m_sse").is_none());
    }

    #[test]
    fn duplicate_machine_name_is_rejected() {
        let archs = archs();
        let mut reg = MachineRegistry::new();
        reg.register(&archs, "m_sse", &["sse"]).unwrap();
        let err = reg.register(&archs, "m", &["avx|sse"]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateMachine { ref name } if name == "m_sse"));
        assert_eq!(reg.len(), 1);
        assert!(reg.get("m_avx").is_none());
    }
}
