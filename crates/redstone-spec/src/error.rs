//! Error taxonomy shared by all pipeline stages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse error classes surfaced to callers.
///
/// Every backend error maps onto exactly one kind; the kind decides how a
/// failure is presented (HTTP status, exit code, client-visible message).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or unsupported audio.
    Decode,
    /// No detectable melody.
    Analysis,
    /// Out-of-range transform inputs.
    Parameter,
    /// Note density exceeds the circuit safety caps.
    LayoutOverflow,
    /// Format size limits exceeded.
    Serialization,
    /// Unknown file id on download.
    NotFound,
    /// The consumer went away mid-pipeline.
    Cancelled,
    /// Anything unexpected.
    Internal,
}

impl ErrorKind {
    /// Returns the stable name of this kind (e.g., "decode").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Decode => "decode",
            ErrorKind::Analysis => "analysis",
            ErrorKind::Parameter => "parameter",
            ErrorKind::LayoutOverflow => "layout_overflow",
            ErrorKind::Serialization => "serialization",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }

    /// Whether the failure was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::Decode
                | ErrorKind::Analysis
                | ErrorKind::Parameter
                | ErrorKind::LayoutOverflow
                | ErrorKind::Serialization
                | ErrorKind::NotFound
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common trait for backend errors.
///
/// Each backend error type implements this trait so callers can report
/// errors uniformly without depending on every backend crate.
///
/// # Example
///
/// ```ignore
/// use redstone_spec::error::BackendError;
///
/// fn handle_error<E: BackendError>(err: E) {
///     eprintln!("[{}] {}", err.code(), err.message());
/// }
/// ```
pub trait BackendError: std::error::Error {
    /// Stable error code, e.g. "AUDIO_001" or "CIRCUIT_002".
    fn code(&self) -> &'static str;

    /// Human-readable message. Defaults to `Display`.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Error category for grouping, e.g. "audio", "circuit", "schematic".
    fn category(&self) -> &'static str;

    /// Taxonomy class of this error.
    fn kind(&self) -> ErrorKind;
}

/// Errors for out-of-range or unparseable transform parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    /// A numeric parameter is outside its accepted range.
    #[error("{name} must be in {expected}, got {value}")]
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Offending value, formatted.
        value: String,
        /// Accepted range, formatted.
        expected: &'static str,
    },

    /// A parameter could not be parsed.
    #[error("invalid {name}: {message}")]
    Invalid {
        /// Parameter name.
        name: String,
        /// What was wrong.
        message: String,
    },
}

impl ParameterError {
    /// Creates an invalid-parameter error.
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl BackendError for ParameterError {
    fn code(&self) -> &'static str {
        match self {
            ParameterError::OutOfRange { .. } => "PARAM_001",
            ParameterError::Invalid { .. } => "PARAM_002",
        }
    }

    fn category(&self) -> &'static str {
        "parameter"
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::Parameter
    }
}

/// A uniform error wrapping any backend error.
///
/// Captures code, message and kind so the CLI and the server can report
/// failures from any stage the same way.
#[derive(Debug)]
pub struct PipelineError {
    /// Taxonomy class.
    pub kind: ErrorKind,
    /// The error code (e.g., "AUDIO_001").
    pub code: &'static str,
    /// The human-readable message.
    pub message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl PipelineError {
    /// Wraps a backend error.
    pub fn from_backend<E: BackendError + Send + Sync + 'static>(err: E) -> Self {
        Self {
            kind: err.kind(),
            code: err.code(),
            message: err.message(),
            source: Some(Box::new(err)),
        }
    }

    /// Creates an error with explicit values and no underlying source.
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            source: None,
        }
    }

    /// The pipeline was cancelled at a checkpoint.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "PIPELINE_001", "generation cancelled")
    }

    /// An unexpected internal fault.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, "PIPELINE_002", message)
    }

    /// An unknown or expired file id.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, "STORE_001", message)
    }

    /// Message safe to show a remote client; internal faults are not described.
    pub fn client_message(&self) -> String {
        match self.kind {
            ErrorKind::Internal => "internal error".to_string(),
            _ => self.message.clone(),
        }
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<ParameterError> for PipelineError {
    fn from(err: ParameterError) -> Self {
        Self::from_backend(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_error_codes() {
        let err = ParameterError::OutOfRange {
            name: "speed_factor",
            value: "0".to_string(),
            expected: "(0, 16]",
        };
        assert_eq!(err.code(), "PARAM_001");
        assert_eq!(err.kind(), ErrorKind::Parameter);
        assert_eq!(err.to_string(), "speed_factor must be in (0, 16], got 0");

        let err = ParameterError::invalid("density", "expected low, medium or high");
        assert_eq!(err.code(), "PARAM_002");
    }

    #[test]
    fn test_pipeline_error_from_backend() {
        let err = PipelineError::from_backend(ParameterError::invalid("pitch", "not a number"));
        assert_eq!(err.kind, ErrorKind::Parameter);
        assert_eq!(err.code, "PARAM_002");
        assert_eq!(err.to_string(), "[PARAM_002] invalid pitch: not a number");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_internal_message_hidden() {
        let err = PipelineError::internal("worker thread panicked at src/foo.rs:12");
        assert_eq!(err.client_message(), "internal error");
        assert!(err.to_string().contains("panicked"));

        let err = PipelineError::not_found("file not found or expired");
        assert_eq!(err.client_message(), "file not found or expired");
    }

    #[test]
    fn test_client_error_classes() {
        assert!(ErrorKind::Decode.is_client_error());
        assert!(ErrorKind::NotFound.is_client_error());
        assert!(!ErrorKind::Internal.is_client_error());
        assert!(!ErrorKind::Cancelled.is_client_error());
        assert_eq!(ErrorKind::LayoutOverflow.to_string(), "layout_overflow");
    }
}
