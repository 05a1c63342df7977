//! Request and response types for the HTTP service.

use redstone_spec::{
    Density, ErrorKind, ParameterError, PipelineError, TransformParameters,
};
use serde::{Deserialize, Serialize};

use crate::commands::json_output::JsonError;
use crate::config::sanitize_name;
use crate::store::{CleanupReport, EntryMetadata};

/// Audio extensions accepted on upload.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["mp3", "wav", "ogg", "m4a", "flac", "aac"];

/// Multipart field carrying the audio file.
pub const AUDIO_FIELD: &str = "audio";

/// One multipart field, read in full.
#[derive(Debug, Clone, Default)]
pub struct FormField {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FormField {
    /// A plain text field.
    pub fn text(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            bytes: value.as_bytes().to_vec(),
            ..Default::default()
        }
    }
}

/// A parsed `/preview` or `/generate` upload.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub audio: Vec<u8>,
    /// Decoder hint: the file extension, else the content type.
    pub hint: Option<String>,
    pub params: TransformParameters,
    /// Sanitized schematic name, when given.
    pub name: Option<String>,
}

fn invalid(name: &str, message: impl Into<String>) -> PipelineError {
    PipelineError::from(ParameterError::invalid(name, message))
}

fn parse_value<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, PipelineError> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(field, format!("could not parse '{}'", raw.trim())))
}

/// Accepts the usual form encodings of a checkbox.
pub fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1" | "on"
    )
}

impl UploadForm {
    /// Builds a request from its fields. Unset parameters take `defaults`.
    ///
    /// The parameters are validated here, so a bad request fails before any
    /// audio is decoded.
    pub fn from_fields(
        fields: Vec<FormField>,
        defaults: &TransformParameters,
    ) -> Result<Self, PipelineError> {
        let mut params = defaults.clone();
        let mut audio = None;
        let mut name = None;

        for field in fields {
            if field.name == AUDIO_FIELD {
                audio = Some(field);
                continue;
            }
            let value = String::from_utf8_lossy(&field.bytes).into_owned();
            if value.trim().is_empty() {
                continue;
            }
            match field.name.as_str() {
                "pitch" => params.pitch_shift = parse_value("pitch", &value)?,
                "octave" => params.octave_shift = parse_value("octave", &value)?,
                "speed" => params.speed_factor = parse_value("speed", &value)?,
                "density" => params.density = value.parse::<Density>()?,
                "max_notes" => params.max_notes = parse_value("max_notes", &value)?,
                "auto_tune" => params.auto_tune = parse_bool(&value),
                "name" => name = Some(sanitize_name(&value)),
                _ => {}
            }
        }
        params.validate()?;

        let audio = audio.ok_or_else(|| invalid(AUDIO_FIELD, "no audio file uploaded"))?;
        if audio.bytes.is_empty() {
            return Err(invalid(AUDIO_FIELD, "uploaded file is empty"));
        }

        let extension = audio
            .file_name
            .as_deref()
            .and_then(|f| std::path::Path::new(f).extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        if let Some(ext) = &extension {
            if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
                return Err(invalid(
                    AUDIO_FIELD,
                    format!(
                        "unsupported file type '.{}' (supported: {})",
                        ext,
                        ALLOWED_EXTENSIONS.join(", ")
                    ),
                ));
            }
        }

        Ok(Self {
            hint: extension.or(audio.content_type),
            audio: audio.bytes,
            params,
            name,
        })
    }
}

/// Error body for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false.
    pub success: bool,
    /// Client-safe message.
    pub error: String,
    pub errors: Vec<JsonError>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            error: message.clone(),
            errors: vec![JsonError::new(code, message)],
        }
    }

    /// Internal faults are described only as "internal error".
    pub fn from_pipeline(err: &PipelineError) -> Self {
        let message = err.client_message();
        let mut json = JsonError::new(err.code, message.clone());
        json.kind = Some(err.kind.as_str().to_string());
        if err.kind == ErrorKind::Internal {
            json.code = "INTERNAL".to_string();
        }
        Self {
            success: false,
            error: message,
            errors: vec![json],
        }
    }
}

/// `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// `POST /preview`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub success: bool,
    /// Where the rendered WAV can be fetched.
    pub audio_url: String,
    pub file_id: String,
    pub notes: usize,
    /// Seconds.
    pub duration: f64,
    pub sample_rate: u32,
    pub message: String,
}

/// `GET /download/{file_id}` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadQuery {
    /// "litematic" (default) or "schematic".
    pub format: Option<String>,
}

/// `GET /list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub success: bool,
    /// Newest first.
    pub files: Vec<EntryMetadata>,
}

/// `POST /cleanup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub success: bool,
    pub removed_entries: usize,
    pub removed_files: usize,
}

impl From<CleanupReport> for CleanupResponse {
    fn from(report: CleanupReport) -> Self {
        Self {
            success: true,
            removed_entries: report.entries,
            removed_files: report.files,
        }
    }
}
