//! Named Binary Tag encoding, the container both schematic formats use.
//!
//! Files are a single named root compound, big-endian, gzip-compressed.

mod read;
mod tag;
mod write;

pub use read::{read_root, MAX_DEPTH};
pub use tag::{Compound, List, Tag, TagId};
pub use write::write_root;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::error::{SchematicError, SchematicResult};

/// Gzip magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Encodes and gzips a root compound.
///
/// The gzip header carries no timestamp, so equal input gives equal bytes.
pub fn to_gzip_bytes(name: &str, root: &Compound) -> SchematicResult<Vec<u8>> {
    let mut raw = Vec::new();
    write_root(&mut raw, name, root)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    Ok(encoder.finish()?)
}

/// Inflates and decodes a gzipped root compound.
pub fn from_gzip_bytes(data: &[u8]) -> SchematicResult<(String, Compound)> {
    if !data.starts_with(&GZIP_MAGIC) {
        return Err(SchematicError::nbt("not gzip-compressed"));
    }
    let mut raw = Vec::new();
    GzDecoder::new(data).read_to_end(&mut raw)?;
    read_root(&raw)
}
