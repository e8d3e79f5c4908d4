//! Build-time capability registry for instruction-set architectures.
//!
//! Models a catalogue of CPU architecture extensions and composes them into
//! named machines, then answers the queries build systems use to drive
//! conditional compilation:
//! - **[`arch_flags`]:** architectures a compiler supports, with their flags
//! - **[`machines_matching`]:** machines buildable from a detected architecture set
//! - **[`machine_flags`]:** the concatenated flags one machine needs
//!
//! Definitions are loaded once into a [`RegistryBuilder`] and frozen into an
//! immutable [`Registry`] before any query runs.

pub mod arch;
pub mod config;
pub mod error;
pub mod machine;
pub mod query;
pub mod registry;

pub use arch::{ArchDef, ArchRegistry, Architecture, Check, CompilerId};
pub use config::{
    definitions_to_toml, find_definitions, load_definitions_toml, parse_definitions_toml,
    Definitions, MachineDef, MemberList,
};
pub use error::{RegistryError, Result};
pub use machine::{expand, Machine, MachineRegistry, MachineVariant};
pub use query::{
    arch_flags, machine_flags, machines_matching, ArchFlags, ArchFlagsList, ArchSet, FlagList,
    MachineList,
};
pub use registry::{Registry, RegistryBuilder};
