//! Two-phase registry lifecycle.
//!
//! A [`RegistryBuilder`] accumulates architectures and machine declarations
//! during the load phase. [`RegistryBuilder::finish`] freezes it into a
//! [`Registry`], which only hands out shared references.

use std::sync::Arc;

use crate::arch::{ArchDef, ArchIndex, ArchRegistry, Architecture};
use crate::error::Result;
use crate::machine::{Machine, MachineRegistry};

/// Mutable load-phase state.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    archs: ArchRegistry,
    machines: MachineRegistry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an architecture.
    pub fn register_arch(&mut self, def: ArchDef) -> Result<ArchIndex> {
        self.archs.register(def)
    }

    /// Register a machine declaration, expanding any alternative slots.
    ///
    /// Members must name architectures registered earlier.
    pub fn register_machine(
        &mut self,
        name: &str,
        members: &[impl AsRef<str>],
    ) -> Result<&[Machine]> {
        self.machines.register(&self.archs, name, members)
    }

    /// Freeze the builder. No further registration is possible.
    pub fn finish(self) -> Registry {
        tracing::debug!(
            archs = self.archs.len(),
            machines = self.machines.len(),
            "registry finalized"
        );
        Registry {
            inner: Arc::new(Inner {
                archs: self.archs,
                machines: self.machines,
            }),
        }
    }
}

#[derive(Debug)]
struct Inner {
    archs: ArchRegistry,
    machines: MachineRegistry,
}

/// Immutable, cheaply clonable registry shared by every query.
#[derive(Debug, Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// The architecture catalogue.
    pub fn archs(&self) -> &ArchRegistry {
        &self.inner.archs
    }

    /// The machine catalogue.
    pub fn machines(&self) -> &MachineRegistry {
        &self.inner.machines
    }

    pub fn arch(&self, name: &str) -> Option<&Architecture> {
        self.inner.archs.get(name)
    }

    pub fn machine(&self, name: &str) -> Option<&Machine> {
        self.inner.machines.get(name)
    }

    /// Member architectures of the named machine, in declared order.
    pub fn machine_members(&self, name: &str) -> Option<impl Iterator<Item = &Architecture>> {
        let machine = self.inner.machines.get(name)?;
        let archs = &self.inner.archs;
        Some(machine.members().iter().filter_map(move |&idx| archs.at(idx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;

    #[test]
    fn build_then_query() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_arch(ArchDef::named("sse").with_alignment(16))
            .unwrap();
        builder.register_arch(ArchDef::named("avx")).unwrap();
        let added = builder.register_machine("m", &["sse", "avx"]).unwrap();
        assert_eq!(added[0].name(), "m");

        let registry = builder.finish();
        let members: Vec<_> = registry
            .machine_members("m")
            .unwrap()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(members, ["sse", "avx"]);
        assert!(registry.machine_members("other").is_none());
        assert_eq!(registry.arch("sse").unwrap().alignment, 16);
        assert!(registry.machine("missing").is_none());
    }

    #[test]
    fn machine_before_arch_fails() {
        let mut builder = RegistryBuilder::new();
        let err = builder.register_machine("m", &["sse"]).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownArch { .. }));
    }

    #[test]
    fn registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();

        let registry = RegistryBuilder::new().finish();
        let clone = registry.clone();
        let handle = std::thread::spawn(move || clone.archs().len());
        assert_eq!(handle.join().unwrap(), 0);
        assert!(registry.machines().is_empty());
    }
}
