//! Output record types for the `generate`, `preview` and `inspect` commands.

use super::JsonError;
use redstone_spec::{Dimensions, GenerationStats, Projection, SchematicFormat};
use serde::{Deserialize, Serialize};

/// JSON output for the `generate` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOutput {
    /// Whether generation succeeded
    pub success: bool,
    /// Errors encountered
    pub errors: Vec<JsonError>,
    /// Generation details (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerateResult>,
}

/// Details of a successful generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResult {
    pub name: String,
    pub stats: GenerationStats,
    pub projection: Projection,
    /// Files written
    pub files: Vec<GeneratedFile>,
    /// Wall-clock time in milliseconds
    pub duration_ms: u64,
}

/// One written schematic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub format: SchematicFormat,
    pub path: String,
    pub byte_size: usize,
    /// BLAKE3 hex digest
    pub hash: String,
}

impl GenerateOutput {
    /// Creates a successful generate output.
    pub fn success(result: GenerateResult) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            result: Some(result),
        }
    }

    /// Creates a failed generate output.
    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            errors,
            result: None,
        }
    }
}

/// JSON output for the `preview` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PreviewResult>,
}

/// Details of a rendered preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResult {
    /// WAV file written
    pub path: String,
    pub notes: usize,
    /// Playback length in seconds
    pub duration: f64,
    pub sample_rate: u32,
}

impl PreviewOutput {
    pub fn success(result: PreviewResult) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            result: Some(result),
        }
    }

    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            errors,
            result: None,
        }
    }
}

/// JSON output for the `inspect` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<InspectResult>,
}

/// Contents of an inspected schematic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectResult {
    pub path: String,
    pub format: SchematicFormat,
    /// Name stored in the file (litematic only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub dimensions: Dimensions,
    /// Non-air blocks
    pub blocks: usize,
    pub note_blocks: usize,
    pub redstone_dust: usize,
    pub repeaters: usize,
    /// Distinct note-block pitches, ascending
    pub pitches: Vec<u8>,
}

impl InspectOutput {
    pub fn success(result: InspectResult) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            result: Some(result),
        }
    }

    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            errors,
            result: None,
        }
    }
}
