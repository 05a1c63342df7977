//! Redstone Music Schematic Backend - Deterministic Schematic Encoding
//!
//! Encodes a [`CircuitLayout`] into the two container formats world editors
//! load, and decodes them back for inspection.
//!
//! # Formats
//!
//! - **Litematic**: structured region with a block-state palette and packed
//!   long array. Carries names, author and timestamps.
//! - **Schematic**: legacy MCEdit block-id and data arrays plus `Music` tile
//!   entities for note pitch.
//!
//! Both are gzip-compressed big-endian NBT.
//!
//! # Determinism
//!
//! Equal layouts and options produce byte-identical files. Compound entries
//! keep insertion order, palette order follows the cell scan, block-state
//! properties are sorted, timestamps come from [`SerializeOptions`] and the
//! gzip header has no mtime.
//!
//! # Example
//!
//! ```
//! use redstone_backend_schematic::{read, serialize, SerializeOptions};
//! use redstone_spec::{BlockCell, BlockPos, CircuitLayout, SchematicFormat};
//!
//! let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
//! layout.set(BlockPos::new(0, 0, 0), BlockCell::SolidSupport);
//! layout.set(BlockPos::new(0, 1, 0), BlockCell::RedstoneDust);
//!
//! let file = serialize(&layout, SchematicFormat::Litematic, &SerializeOptions::named("demo")).unwrap();
//! let decoded = read(&file.bytes).unwrap();
//! assert_eq!(decoded.cell_count(), 2);
//! ```

pub mod blocks;
pub mod decoded;
pub mod error;
pub mod litematic;
pub mod nbt;
pub mod schematic;

pub use decoded::DecodedSchematic;
pub use error::{SchematicError, SchematicResult};
pub use litematic::{read_litematic, write_litematic};
pub use schematic::{read_schematic, write_schematic};

use redstone_spec::{CircuitLayout, SchematicFile, SchematicFormat};
use tracing::info;

/// File-level metadata that is not part of the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Schematic and region name.
    pub name: String,
    pub author: String,
    pub description: String,
    /// Milliseconds since the Unix epoch.
    pub time_created_ms: i64,
    /// Milliseconds since the Unix epoch.
    pub time_modified_ms: i64,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            name: "redstone_music".to_string(),
            author: "redstone-music".to_string(),
            description: String::new(),
            time_created_ms: 0,
            time_modified_ms: 0,
        }
    }
}

impl SerializeOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets both timestamps.
    pub fn at(mut self, millis: i64) -> Self {
        self.time_created_ms = millis;
        self.time_modified_ms = millis;
        self
    }
}

/// Serializes `layout` to `format`, returning the bytes with their statistics.
pub fn serialize(
    layout: &CircuitLayout,
    format: SchematicFormat,
    options: &SerializeOptions,
) -> SchematicResult<SchematicFile> {
    if layout.is_empty() {
        return Err(SchematicError::EmptyLayout);
    }

    let bytes = match format {
        SchematicFormat::Litematic => write_litematic(layout, options)?,
        SchematicFormat::Schematic => write_schematic(layout)?,
    };
    let hash = blake3::hash(&bytes).to_hex().to_string();

    let file = SchematicFile {
        format,
        name: options.name.clone(),
        dimensions: layout.dimensions(),
        note_block_count: layout.note_block_count(),
        redstone_dust_count: layout.dust_count(),
        repeater_count: layout.repeater_count(),
        byte_size: bytes.len(),
        hash,
        bytes,
    };
    info!(
        format = %format,
        dimensions = %file.dimensions,
        bytes = file.byte_size,
        "serialized schematic"
    );
    Ok(file)
}

/// Decodes either format, detected from the NBT structure.
pub fn read(bytes: &[u8]) -> SchematicResult<DecodedSchematic> {
    let (_, root) = nbt::from_gzip_bytes(bytes)?;
    if root.get("Regions").is_some() {
        litematic::decode_root(&root)
    } else if schematic::is_legacy_root(&root) {
        schematic::decode_root(&root)
    } else {
        Err(SchematicError::UnknownFormat)
    }
}
