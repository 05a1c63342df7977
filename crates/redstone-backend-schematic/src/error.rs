//! Error types for the schematic backend.

use redstone_spec::{BackendError, Dimensions, ErrorKind, SchematicFormat};
use thiserror::Error;

/// Result type for schematic operations.
pub type SchematicResult<T> = Result<T, SchematicError>;

/// Errors from encoding or decoding schematic containers.
#[derive(Debug, Error)]
pub enum SchematicError {
    /// The layout does not fit the format's limits.
    #[error("{format} cannot hold a {dimensions} region: {reason}")]
    TooLarge {
        format: SchematicFormat,
        dimensions: Dimensions,
        reason: String,
    },

    /// The layout has no cells.
    #[error("layout is empty")]
    EmptyLayout,

    /// Compression or stream I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The NBT stream is malformed.
    #[error("malformed NBT: {message}")]
    Nbt {
        /// Error message.
        message: String,
    },

    /// The NBT is valid but not the expected structure.
    #[error("invalid {format} file: {message}")]
    Structure {
        format: SchematicFormat,
        /// Error message.
        message: String,
    },

    /// The bytes match neither supported format.
    #[error("unrecognized schematic container")]
    UnknownFormat,
}

impl SchematicError {
    /// Creates a malformed-NBT error.
    pub fn nbt(message: impl Into<String>) -> Self {
        Self::Nbt {
            message: message.into(),
        }
    }

    /// Creates a structure error for `format`.
    pub fn structure(format: SchematicFormat, message: impl Into<String>) -> Self {
        Self::Structure {
            format,
            message: message.into(),
        }
    }
}

impl BackendError for SchematicError {
    fn code(&self) -> &'static str {
        match self {
            SchematicError::TooLarge { .. } => "SCHEM_001",
            SchematicError::EmptyLayout => "SCHEM_002",
            SchematicError::Io(_) => "SCHEM_003",
            SchematicError::Nbt { .. } => "SCHEM_004",
            SchematicError::Structure { .. } => "SCHEM_005",
            SchematicError::UnknownFormat => "SCHEM_006",
        }
    }

    fn category(&self) -> &'static str {
        "schematic"
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::Serialization
    }
}
