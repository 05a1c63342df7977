//! Error types for the circuit backend.

use redstone_spec::{BackendError, ErrorKind, ParameterError};
use thiserror::Error;

/// Result type for circuit operations.
pub type CircuitResult<T> = Result<T, CircuitError>;

/// Errors from sequence transforms and circuit mapping.
#[derive(Debug, Error)]
pub enum CircuitError {
    /// There are no notes to transform or lay out.
    #[error("note sequence is empty")]
    EmptySequence,

    /// A lane's trigger path needs more repeaters than the safety cap.
    #[error("lane for pitch {pitch} needs {repeaters} repeaters, cap is {cap}")]
    LayoutOverflow {
        /// Note-block pitch of the lane.
        pitch: u8,
        /// Repeaters on the path to the lane's last note.
        repeaters: u32,
        /// Configured cap.
        cap: u32,
    },

    /// A dust path would run out of signal before reaching its note block.
    #[error("dust run of {run} blocks to pitch {pitch} exceeds maximum of {max}")]
    DustRunTooLong {
        /// Note-block pitch at the end of the path.
        pitch: u8,
        /// Dust blocks since the last power source.
        run: u32,
        /// Configured maximum.
        max: u32,
    },

    /// A transform parameter is out of range.
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// A mapper setting is invalid.
    #[error("invalid mapper config '{name}': {message}")]
    InvalidConfig {
        /// Setting name.
        name: &'static str,
        /// Error message.
        message: String,
    },
}

impl BackendError for CircuitError {
    fn code(&self) -> &'static str {
        match self {
            CircuitError::EmptySequence => "CIRCUIT_001",
            CircuitError::LayoutOverflow { .. } => "CIRCUIT_002",
            CircuitError::DustRunTooLong { .. } => "CIRCUIT_003",
            CircuitError::Parameter(_) => "CIRCUIT_004",
            CircuitError::InvalidConfig { .. } => "CIRCUIT_005",
        }
    }

    fn category(&self) -> &'static str {
        "circuit"
    }

    fn kind(&self) -> ErrorKind {
        match self {
            CircuitError::EmptySequence => ErrorKind::Analysis,
            CircuitError::LayoutOverflow { .. } | CircuitError::DustRunTooLong { .. } => {
                ErrorKind::LayoutOverflow
            }
            CircuitError::Parameter(_) | CircuitError::InvalidConfig { .. } => {
                ErrorKind::Parameter
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_kinds() {
        let err = CircuitError::LayoutOverflow {
            pitch: 6,
            repeaters: 5000,
            cap: 4096,
        };
        assert_eq!(err.code(), "CIRCUIT_002");
        assert_eq!(err.kind(), ErrorKind::LayoutOverflow);
        assert_eq!(err.to_string(), "lane for pitch 6 needs 5000 repeaters, cap is 4096");

        let err: CircuitError = ParameterError::invalid("density", "bad").into();
        assert_eq!(err.kind(), ErrorKind::Parameter);
        assert_eq!(err.to_string(), "invalid density: bad");
    }
}
