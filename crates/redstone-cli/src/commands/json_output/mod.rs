//! JSON output types for machine-readable CLI output.
//!
//! These back the `--json` flag on `generate`, `preview` and `inspect`.
//! Every output has `success` and `errors`; successful runs add a `result`.

mod records;

pub use records::{
    GenerateOutput, GenerateResult, GeneratedFile, InspectOutput, InspectResult, PreviewOutput,
    PreviewResult,
};

use redstone_spec::PipelineError;
use serde::{Deserialize, Serialize};

/// Error codes for CLI operations.
///
/// These codes are stable. Pipeline failures pass through their own codes
/// (`AUDIO_004`, `CIRCUIT_002`, ...).
pub mod error_codes {
    /// Input file could not be read
    pub const FILE_READ: &str = "CLI_001";
    /// Output file could not be written
    pub const FILE_WRITE: &str = "CLI_002";
    /// Config file missing or malformed
    pub const CONFIG_LOAD: &str = "CLI_003";
    /// Config loaded but failed validation
    pub const INVALID_CONFIG: &str = "CLI_004";
    /// File is not a readable schematic
    pub const SCHEMATIC_READ: &str = "CLI_005";
    /// JSON serialization error
    pub const JSON_SERIALIZE: &str = "CLI_006";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "AUDIO_004")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error taxonomy class, for pipeline failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// File the error refers to (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl JsonError {
    /// Creates a new error with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            kind: None,
            file: None,
        }
    }

    /// Sets the file path for this error.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Converts a pipeline failure, keeping its code and kind.
    pub fn from_pipeline(err: &PipelineError) -> Self {
        Self {
            code: err.code.to_string(),
            message: err.message.clone(),
            kind: Some(err.kind.as_str().to_string()),
            file: None,
        }
    }
}

/// Prints any output record as pretty JSON on stdout.
pub fn print_json<T: Serialize>(output: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(output).map_err(|e| {
        anyhow::anyhow!("{}: failed to serialize output: {}", error_codes::JSON_SERIALIZE, e)
    })?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use redstone_spec::ErrorKind;

    #[test]
    fn test_json_error_serialization() {
        let error = JsonError::new(error_codes::FILE_READ, "missing").with_file("song.mp3");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"CLI_001\""));
        assert!(json.contains("\"file\":\"song.mp3\""));
        assert!(!json.contains("\"kind\""));
    }

    #[test]
    fn test_from_pipeline() {
        let err = PipelineError::new(ErrorKind::Analysis, "AUDIO_004", "no melody detected");
        let json = JsonError::from_pipeline(&err);
        assert_eq!(json.code, "AUDIO_004");
        assert_eq!(json.kind.as_deref(), Some("analysis"));
    }
}
