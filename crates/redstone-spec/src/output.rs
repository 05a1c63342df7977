//! Schematic output formats and file metadata.

use crate::error::ParameterError;
use crate::layout::Dimensions;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchematicFormat {
    /// Litematica structured-region format.
    Litematic,
    /// MCEdit legacy block-array format.
    Schematic,
}

impl SchematicFormat {
    pub const ALL: [SchematicFormat; 2] = [SchematicFormat::Litematic, SchematicFormat::Schematic];

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            SchematicFormat::Litematic => "litematic",
            SchematicFormat::Schematic => "schematic",
        }
    }

    /// Detects the format from a file name's extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl FromStr for SchematicFormat {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "litematic" => Ok(SchematicFormat::Litematic),
            "schematic" => Ok(SchematicFormat::Schematic),
            other => Err(ParameterError::invalid(
                "format",
                format!("expected litematic or schematic, got '{}'", other),
            )),
        }
    }
}

impl std::fmt::Display for SchematicFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// A serialized container plus the statistics reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchematicFile {
    pub format: SchematicFormat,
    pub name: String,
    pub dimensions: Dimensions,
    pub note_block_count: usize,
    pub redstone_dust_count: usize,
    pub repeater_count: usize,
    pub byte_size: usize,
    /// BLAKE3 hex digest of `bytes`.
    pub hash: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl SchematicFile {
    /// File name for this output, e.g. "song.litematic".
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.format.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_format_parsing() {
        assert_eq!("litematic".parse::<SchematicFormat>().unwrap(), SchematicFormat::Litematic);
        assert_eq!(" Schematic ".parse::<SchematicFormat>().unwrap(), SchematicFormat::Schematic);
        assert!("nbt".parse::<SchematicFormat>().is_err());
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            SchematicFormat::from_path(Path::new("out/song.litematic")),
            Some(SchematicFormat::Litematic)
        );
        assert_eq!(SchematicFormat::from_path(Path::new("song.wav")), None);
        assert_eq!(SchematicFormat::from_path(Path::new("song")), None);
    }
}
