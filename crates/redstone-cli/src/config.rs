//! Configuration for the CLI and the HTTP service.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then a
//! named preset, then command-line flags.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use redstone_backend_audio::ExtractorConfig;
use redstone_backend_circuit::{InstrumentStrategy, MapperConfig};
use redstone_spec::{Density, SchematicFormat, TransformParameters};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default upload limit, 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Default retention for stored results.
pub const DEFAULT_RETENTION_HOURS: u64 = 24;

/// Name used when none (or nothing usable) is given.
pub const DEFAULT_OUTPUT_NAME: &str = "redstone_music";

const MAX_NAME_LEN: usize = 64;

/// Complete configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedstoneConfig {
    pub server: ServerConfig,
    /// Defaults for requests that do not set their own parameters.
    pub transform: TransformParameters,
    pub extractor: ExtractorConfig,
    pub mapper: MapperConfig,
    pub output: OutputConfig,
    pub long_audio: LongAudioPolicy,
    /// Stored results older than this are removed by cleanup.
    pub retention_hours: u64,
}

impl Default for RedstoneConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            transform: TransformParameters::default(),
            extractor: ExtractorConfig::default(),
            mapper: MapperConfig::default(),
            output: OutputConfig::default(),
            long_audio: LongAudioPolicy::default(),
            retention_hours: DEFAULT_RETENTION_HOURS,
        }
    }
}

/// HTTP service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Pipelines allowed to run at once.
    pub max_concurrent_jobs: usize,
    pub max_upload_bytes: usize,
    /// Root of the result store.
    pub store_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_concurrent_jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            store_dir: PathBuf::from("redstone-store"),
        }
    }
}

/// Metadata written into generated schematics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub name: String,
    pub author: String,
    pub description: String,
    pub formats: Vec<SchematicFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_OUTPUT_NAME.to_string(),
            author: "redstone-music".to_string(),
            description: String::new(),
            formats: SchematicFormat::ALL.to_vec(),
        }
    }
}

/// Tighter note budgets for long recordings. Off unless `enabled`.
///
/// Past `long_seconds` the budget is `long_notes_per_second` per second of
/// audio. Past `very_long_seconds` it drops to `very_long_notes_per_second`
/// and density falls one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongAudioPolicy {
    pub enabled: bool,
    pub long_seconds: f64,
    pub long_notes_per_second: f64,
    pub very_long_seconds: f64,
    pub very_long_notes_per_second: f64,
}

impl Default for LongAudioPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            long_seconds: 180.0,
            long_notes_per_second: 3.0,
            very_long_seconds: 300.0,
            very_long_notes_per_second: 2.0,
        }
    }
}

impl LongAudioPolicy {
    /// Parameters for a recording of `seconds`. `None` when nothing changes.
    pub fn adjust(&self, seconds: f64, params: &TransformParameters) -> Option<TransformParameters> {
        if !self.enabled || seconds.is_nan() || seconds <= self.long_seconds {
            return None;
        }
        let (rate, density) = if seconds > self.very_long_seconds {
            (self.very_long_notes_per_second, params.density.lower())
        } else {
            (self.long_notes_per_second, params.density)
        };
        let budget = ((seconds * rate) as usize).max(1);
        let max_notes = params.max_notes.min(budget);
        if max_notes == params.max_notes && density == params.density {
            return None;
        }
        Some(TransformParameters {
            max_notes,
            density,
            ..params.clone()
        })
    }

    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.long_seconds) {
            problems.push("long_audio.long_seconds: must be positive".to_string());
        }
        if !(positive(self.very_long_seconds) && self.very_long_seconds >= self.long_seconds) {
            problems.push(
                "long_audio.very_long_seconds: must be at least long_seconds".to_string(),
            );
        }
        if !positive(self.long_notes_per_second) {
            problems.push("long_audio.long_notes_per_second: must be positive".to_string());
        }
        if !positive(self.very_long_notes_per_second) {
            problems.push("long_audio.very_long_notes_per_second: must be positive".to_string());
        }
        problems
    }
}

/// Named bundles of transform and mapper settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Thinned melody on a single instrument.
    Basic,
    /// Every note, snapped to key, instruments chosen by register.
    Advanced,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::Basic, Preset::Advanced];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Basic => "basic",
            Preset::Advanced => "advanced",
        }
    }

    /// Overwrites the settings this preset controls.
    pub fn apply(&self, config: &mut RedstoneConfig) {
        match self {
            Preset::Basic => {
                config.transform.density = Density::Medium;
                config.transform.auto_tune = false;
                config.mapper.instrument_strategy = InstrumentStrategy::Harp;
            }
            Preset::Advanced => {
                config.transform.density = Density::High;
                config.transform.auto_tune = true;
                config.mapper.instrument_strategy = InstrumentStrategy::Frequency;
            }
        }
    }
}

impl FromStr for Preset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Preset::Basic),
            "advanced" => Ok(Preset::Advanced),
            other => anyhow::bail!("unknown preset: {} (expected basic or advanced)", other),
        }
    }
}

impl RedstoneConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Builds the effective configuration from an optional file and preset.
    pub fn load(path: Option<&Path>, preset: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(name) = preset {
            name.parse::<Preset>()?.apply(&mut config);
        }
        Ok(config)
    }

    /// Every problem found, as human-readable messages. Empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if let Err(e) = self.transform.validate() {
            problems.push(format!("transform: {}", e));
        }
        if let Err(e) = self.extractor.validate() {
            problems.push(format!("extractor: {}", e));
        }
        if let Err(e) = self.mapper.validate() {
            problems.push(format!("mapper: {}", e));
        }

        problems.extend(self.long_audio.problems());

        if self.server.host.trim().is_empty() {
            problems.push("server.host: must not be empty".to_string());
        }
        if self.server.max_concurrent_jobs == 0 {
            problems.push("server.max_concurrent_jobs: must be at least 1".to_string());
        }
        if self.server.max_upload_bytes == 0 {
            problems.push("server.max_upload_bytes: must be positive".to_string());
        }

        if !name_pattern().is_match(&self.output.name) {
            problems.push(format!(
                "output.name: '{}' must be 1-{} letters, digits, '_' or '-'",
                self.output.name, MAX_NAME_LEN
            ));
        }
        if self.output.formats.is_empty() {
            problems.push("output.formats: at least one format is required".to_string());
        }
        if self.retention_hours == 0 {
            problems.push("retention_hours: must be at least 1".to_string());
        }
        problems
    }

    pub fn retention(&self) -> chrono::Duration {
        // chrono::Duration panics on overflow
        chrono::Duration::hours(self.retention_hours.min(1_000_000) as i64)
    }
}

/// Command-line transform flags. `None` keeps the configured value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOverrides {
    pub pitch: Option<i32>,
    pub octave: Option<i32>,
    pub speed: Option<f64>,
    pub density: Option<Density>,
    pub max_notes: Option<usize>,
    /// Only turns auto-tune on; a flag cannot express "off".
    pub auto_tune: bool,
}

impl TransformOverrides {
    pub fn apply(&self, params: &mut TransformParameters) {
        if let Some(v) = self.pitch {
            params.pitch_shift = v;
        }
        if let Some(v) = self.octave {
            params.octave_shift = v;
        }
        if let Some(v) = self.speed {
            params.speed_factor = v;
        }
        if let Some(v) = self.density {
            params.density = v;
        }
        if let Some(v) = self.max_notes {
            params.max_notes = v;
        }
        if self.auto_tune {
            params.auto_tune = true;
        }
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid regex"))
}

/// Turns free text into a name safe for file names and schematic regions.
pub fn sanitize_name(raw: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("valid regex"));

    let cleaned = unsafe_chars.replace_all(raw.trim(), "_");
    let cleaned: String = cleaned.trim_matches('_').chars().take(MAX_NAME_LEN).collect();
    if cleaned.is_empty() {
        DEFAULT_OUTPUT_NAME.to_string()
    } else {
        cleaned
    }
}
