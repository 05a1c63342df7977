//! Transform parameters.

use crate::error::ParameterError;
use crate::validation::{validate_int_range, validate_positive_up_to};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maximum accepted speed factor.
pub const MAX_SPEED_FACTOR: f64 = 16.0;

/// Maximum accepted note cap.
pub const MAX_NOTES_LIMIT: usize = 20_000;

/// Default note cap.
pub const DEFAULT_MAX_NOTES: usize = 500;

/// How aggressively the sequence is thinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Low,
    Medium,
    #[default]
    High,
}

impl Density {
    pub fn as_str(&self) -> &'static str {
        match self {
            Density::Low => "low",
            Density::Medium => "medium",
            Density::High => "high",
        }
    }

    /// One step sparser; `Low` stays `Low`.
    pub fn lower(self) -> Self {
        match self {
            Density::High => Density::Medium,
            Density::Medium | Density::Low => Density::Low,
        }
    }
}

impl FromStr for Density {
    type Err = ParameterError;

    /// Accepts names and the 1..=3 slider values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "1" => Ok(Density::Low),
            "medium" | "2" => Ok(Density::Medium),
            "high" | "3" => Ok(Density::High),
            other => Err(ParameterError::invalid(
                "density",
                format!("expected low, medium or high, got '{}'", other),
            )),
        }
    }
}

impl std::fmt::Display for Density {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing transform options, scoped to a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformParameters {
    /// Semitones added to every note.
    pub pitch_shift: i32,
    /// Octaves added to every note.
    pub octave_shift: i32,
    /// Playback speed multiplier; 2.0 plays twice as fast.
    pub speed_factor: f64,
    pub density: Density,
    pub max_notes: usize,
    /// Snap pitches to the inferred key's major scale.
    pub auto_tune: bool,
}

impl Default for TransformParameters {
    fn default() -> Self {
        Self {
            pitch_shift: 0,
            octave_shift: 0,
            speed_factor: 1.0,
            density: Density::High,
            max_notes: DEFAULT_MAX_NOTES,
            auto_tune: false,
        }
    }
}

impl TransformParameters {
    /// Checks every parameter range, returning the first violation.
    pub fn validate(&self) -> Result<(), ParameterError> {
        validate_int_range("pitch_shift", self.pitch_shift, -24..=24, "[-24, 24]")?;
        validate_int_range("octave_shift", self.octave_shift, -4..=4, "[-4, 4]")?;
        validate_positive_up_to("speed_factor", self.speed_factor, MAX_SPEED_FACTOR, "(0, 16]")?;
        validate_int_range("max_notes", self.max_notes, 1..=MAX_NOTES_LIMIT, "[1, 20000]")?;
        Ok(())
    }
}
