//! MCEdit `.schematic` writer and reader.
//!
//! Numeric block ids and 4-bit data values in two flat byte arrays indexed
//! `(y * Length + z) * Width + x`. Note-block pitch lives both in the data
//! value and in a `Music` tile entity.

use std::collections::BTreeMap;

use redstone_spec::{BlockCell, BlockPos, CircuitLayout, Dimensions, SchematicFormat};
use tracing::debug;

use crate::blocks::{cell_from_legacy, legacy_block};
use crate::decoded::DecodedSchematic;
use crate::error::{SchematicError, SchematicResult};
use crate::nbt::{self, Compound, List, Tag};

/// Largest edge a `Short` dimension can hold.
pub const MAX_DIMENSION: u32 = i16::MAX as u32;

/// Root tag name.
pub const ROOT_NAME: &str = "Schematic";

/// Encodes `layout` as a gzipped legacy schematic.
pub fn write_schematic(layout: &CircuitLayout) -> SchematicResult<Vec<u8>> {
    let dims = layout.dimensions();
    check_limits(dims)?;

    let volume = dims.volume() as usize;
    let mut blocks = vec![0i8; volume];
    let mut data = vec![0i8; volume];
    let mut tile_entities = List::compounds();

    for (pos, cell) in layout.iter() {
        let (id, meta) = legacy_block(layout, pos);
        let i = index(pos, dims);
        blocks[i] = id as i8;
        data[i] = meta as i8;

        if let BlockCell::NoteBlock { pitch, .. } = cell {
            let entity = Compound::new()
                .with("id", "Music")
                .with("x", Tag::Int(pos.x as i32))
                .with("y", Tag::Int(pos.y as i32))
                .with("z", Tag::Int(pos.z as i32))
                .with("note", Tag::Byte(pitch as i8));
            // Compounds always match a compound list.
            let _ = tile_entities.push(Tag::Compound(entity));
        }
    }
    debug!(
        volume,
        tile_entities = tile_entities.len(),
        "encoded schematic arrays"
    );

    let root = Compound::new()
        .with("Width", Tag::Short(dims.width as i16))
        .with("Height", Tag::Short(dims.height as i16))
        .with("Length", Tag::Short(dims.length as i16))
        .with("Materials", "Alpha")
        .with("Blocks", Tag::ByteArray(blocks))
        .with("Data", Tag::ByteArray(data))
        .with("Entities", List::compounds())
        .with("TileEntities", tile_entities);

    nbt::to_gzip_bytes(ROOT_NAME, &root)
}

/// Decodes a gzipped legacy schematic.
pub fn read_schematic(bytes: &[u8]) -> SchematicResult<DecodedSchematic> {
    let (_, root) = nbt::from_gzip_bytes(bytes)?;
    decode_root(&root)
}

pub(crate) fn decode_root(root: &Compound) -> SchematicResult<DecodedSchematic> {
    let invalid = |message: &str| SchematicError::structure(SchematicFormat::Schematic, message);

    let edge = |name: &str| -> SchematicResult<u32> {
        let v = root.get_i64(name).ok_or_else(|| invalid("missing dimension"))?;
        u32::try_from(v).map_err(|_| invalid("negative dimension"))
    };
    let dims = Dimensions::new(edge("Width")?, edge("Height")?, edge("Length")?);
    let volume = dims.volume() as usize;

    let blocks = byte_array(root, "Blocks").ok_or_else(|| invalid("missing Blocks"))?;
    let data = byte_array(root, "Data").ok_or_else(|| invalid("missing Data"))?;
    if blocks.len() < volume || data.len() < volume {
        return Err(invalid("block arrays shorter than region"));
    }

    let mut cells = BTreeMap::new();
    for y in 0..dims.height {
        for z in 0..dims.length {
            for x in 0..dims.width {
                let pos = BlockPos::new(x, y, z);
                let i = index(pos, dims);
                let below = pos.below().map(|b| blocks[index(b, dims)] as u8);
                let cell = cell_from_legacy(blocks[i] as u8, data[i] as u8, below);
                if !cell.is_air() {
                    cells.insert(pos, cell);
                }
            }
        }
    }

    // Tile entities carry the authoritative pitch.
    if let Some(entities) = root.get_list("TileEntities") {
        for entity in entities.items().iter().filter_map(Tag::as_compound) {
            if entity.get_str("id") != Some("Music") {
                continue;
            }
            let coord = |k: &str| entity.get_i64(k).and_then(|v| u32::try_from(v).ok());
            let (Some(x), Some(y), Some(z), Some(note)) =
                (coord("x"), coord("y"), coord("z"), entity.get_i64("note"))
            else {
                continue;
            };
            if let Some(BlockCell::NoteBlock { pitch, .. }) = cells.get_mut(&BlockPos::new(x, y, z)) {
                *pitch = note.clamp(0, 24) as u8;
            }
        }
    }

    Ok(DecodedSchematic {
        format: SchematicFormat::Schematic,
        name: None,
        dimensions: dims,
        cells,
    })
}

/// Whether a decoded root looks like a legacy schematic.
pub(crate) fn is_legacy_root(root: &Compound) -> bool {
    root.get("Blocks").is_some() && root.get("Width").is_some()
}

fn check_limits(dims: Dimensions) -> SchematicResult<()> {
    let too_large = |reason: String| SchematicError::TooLarge {
        format: SchematicFormat::Schematic,
        dimensions: dims,
        reason,
    };
    for (axis, edge) in [
        ("width", dims.width),
        ("height", dims.height),
        ("length", dims.length),
    ] {
        if edge > MAX_DIMENSION {
            return Err(too_large(format!("{} exceeds {}", axis, MAX_DIMENSION)));
        }
    }
    if dims.volume() > i32::MAX as u64 {
        return Err(too_large(format!("volume {} exceeds {}", dims.volume(), i32::MAX)));
    }
    Ok(())
}

fn index(pos: BlockPos, dims: Dimensions) -> usize {
    let (w, l) = (dims.width as usize, dims.length as usize);
    (pos.y as usize * l + pos.z as usize) * w + pos.x as usize
}

fn byte_array<'a>(root: &'a Compound, name: &str) -> Option<&'a [i8]> {
    match root.get(name) {
        Some(Tag::ByteArray(v)) => Some(v.as_slice()),
        _ => None,
    }
}
