//! CLI command implementations.

pub mod generate;
pub mod inspect;
pub mod json_output;
pub mod preview;

#[cfg(feature = "serve")]
pub mod serve;

use std::fmt;
use std::path::{Path, PathBuf};

use redstone_spec::TransformParameters;

use crate::config::{RedstoneConfig, TransformOverrides};
use json_output::{error_codes, JsonError};

/// Where a command's configuration comes from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// JSON config file.
    pub path: Option<PathBuf>,
    /// Preset name, applied over the file.
    pub preset: Option<String>,
    /// Flags, applied last.
    pub overrides: TransformOverrides,
}

/// Why a command could not start.
#[derive(Debug)]
pub enum SetupError {
    /// The config file could not be loaded.
    Config(anyhow::Error),
    /// The effective configuration is invalid.
    Invalid(Vec<String>),
    /// The input file could not be read.
    Input { path: PathBuf, error: std::io::Error },
}

impl SetupError {
    pub fn to_json_errors(&self) -> Vec<JsonError> {
        match self {
            SetupError::Config(e) => vec![JsonError::new(error_codes::CONFIG_LOAD, format!("{:#}", e))],
            SetupError::Invalid(problems) => problems
                .iter()
                .map(|p| JsonError::new(error_codes::INVALID_CONFIG, p.clone()))
                .collect(),
            SetupError::Input { path, error } => vec![JsonError::new(
                error_codes::FILE_READ,
                format!("Failed to read input: {}", error),
            )
            .with_file(path.display().to_string())],
        }
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::Config(e) => write!(f, "{:#}", e),
            SetupError::Invalid(problems) => {
                write!(f, "invalid configuration")?;
                for p in problems {
                    write!(f, "\n  - {}", p)?;
                }
                Ok(())
            }
            SetupError::Input { path, error } => {
                write!(f, "failed to read {}: {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for SetupError {}

impl ConfigSource {
    /// Loads, layers and validates the configuration.
    pub fn load(&self) -> Result<RedstoneConfig, SetupError> {
        let mut config = RedstoneConfig::load(self.path.as_deref(), self.preset.as_deref())
            .map_err(SetupError::Config)?;
        self.overrides.apply(&mut config.transform);

        let problems = config.validate();
        if problems.is_empty() {
            Ok(config)
        } else {
            Err(SetupError::Invalid(problems))
        }
    }
}

/// An input file read into memory.
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub bytes: Vec<u8>,
    /// Lowercase extension, passed to the decoder as a hint.
    pub hint: Option<String>,
}

impl AudioFile {
    pub fn read(path: &Path) -> Result<Self, SetupError> {
        let bytes = std::fs::read(path).map_err(|error| SetupError::Input {
            path: path.to_path_buf(),
            error,
        })?;
        let hint = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        Ok(Self { bytes, hint })
    }
}

/// One-line summary of transform parameters for human output.
pub(crate) fn describe_params(params: &TransformParameters) -> String {
    format!(
        "pitch {:+}, octave {:+}, speed {}x, density {}, max notes {}, auto-tune {}",
        params.pitch_shift,
        params.octave_shift,
        params.speed_factor,
        params.density,
        params.max_notes,
        if params.auto_tune { "on" } else { "off" }
    )
}
