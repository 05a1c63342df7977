//! Generate command implementation
//!
//! Runs the full pipeline on an audio file and writes the schematics to a
//! directory.

mod human;
mod json;


use anyhow::Result;
use redstone_spec::{SchematicFile, SchematicFormat, TransformParameters};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{AudioFile, ConfigSource, SetupError};
use crate::config::{sanitize_name, RedstoneConfig};

/// Options for `redstone generate`.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Audio file to convert.
    pub input: PathBuf,
    /// Directory the schematics are written to.
    pub out_dir: PathBuf,
    /// Formats to write; the configured formats when `None`.
    pub formats: Option<Vec<SchematicFormat>>,
    /// Schematic name; derived from the input file name when `None`.
    pub name: Option<String>,
    pub source: ConfigSource,
    /// Whether to output machine-readable JSON instead of colored text.
    pub json: bool,
}

/// Run the generate command
///
/// # Returns
/// Exit code: 0 success, 1 input or config error, 2 pipeline error
pub fn run(options: &GenerateOptions) -> Result<ExitCode> {
    if options.json {
        json::run_json(options)
    } else {
        human::run_human(options)
    }
}

/// Parses the `--format` flag.
pub fn parse_formats(value: &str) -> Result<Vec<SchematicFormat>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "both" | "all" => Ok(SchematicFormat::ALL.to_vec()),
        other => Ok(vec![other.parse::<SchematicFormat>()?]),
    }
}

/// Everything a generate run needs, loaded and validated.
pub(crate) struct Job {
    pub config: RedstoneConfig,
    pub params: TransformParameters,
    pub name: String,
    pub audio: AudioFile,
}

pub(crate) fn prepare(options: &GenerateOptions) -> Result<Job, SetupError> {
    let mut config = options.source.load()?;
    if let Some(formats) = &options.formats {
        config.output.formats = formats.clone();
    }

    let name = match &options.name {
        Some(name) => sanitize_name(name),
        None => options
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .map(sanitize_name)
            .unwrap_or_else(|| config.output.name.clone()),
    };

    let audio = AudioFile::read(&options.input)?;
    Ok(Job {
        params: config.transform.clone(),
        config,
        name,
        audio,
    })
}

/// Writes each file as `<out_dir>/<name>.<ext>`.
pub(crate) fn write_outputs(out_dir: &Path, files: &[SchematicFile]) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;
    files
        .iter()
        .map(|file| {
            let path = out_dir.join(file.file_name());
            std::fs::write(&path, &file.bytes)?;
            Ok(path)
        })
        .collect()
}
