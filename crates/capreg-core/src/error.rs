//! Error types for registry construction and queries.

use std::path::PathBuf;

/// Errors that can occur while loading definitions, building the registry,
/// or answering a named query.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading a definitions file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Definitions file not found.
    #[error("definitions file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// An architecture record without a name.
    #[error("architecture record has no name")]
    MissingArchName,

    /// An architecture declared a zero alignment.
    #[error("architecture '{arch}' has invalid alignment {alignment} (must be >= 1)")]
    InvalidAlignment { arch: String, alignment: u32 },

    /// Two compiler keys of one architecture differ only in case.
    #[error("architecture '{arch}' lists flags for compiler '{compiler}' more than once")]
    DuplicateCompiler { arch: String, compiler: String },

    /// Two architecture records share a name.
    #[error("duplicate architecture '{name}'")]
    DuplicateArch { name: String },

    /// A machine references an architecture that was never registered.
    #[error("machine '{machine}' references unknown architecture '{arch}'")]
    UnknownArch { machine: String, arch: String },

    /// Two machines (declared or produced by expansion) share a name.
    #[error("duplicate machine '{name}'")]
    DuplicateMachine { name: String },

    /// A query named a machine that is not in the registry.
    #[error("machine not found: {name}")]
    MachineNotFound { name: String },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
