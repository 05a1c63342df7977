//! Litematica `.litematic` writer and reader.
//!
//! One region at the origin. Block states are stored as palette indices
//! packed LSB-first into a long array, `max(2, ceil(log2(palette)))` bits per
//! entry, with entries allowed to straddle two longs. Cell order is
//! `(y * size_z + z) * size_x + x`.

use std::collections::{BTreeMap, HashMap};

use redstone_spec::{BlockPos, CircuitLayout, Dimensions, SchematicFormat};
use tracing::debug;

use crate::blocks::{block_state, cell_from_state, BlockState};
use crate::decoded::DecodedSchematic;
use crate::error::{SchematicError, SchematicResult};
use crate::nbt::{self, Compound, List, Tag};
use crate::SerializeOptions;

/// Litematica format version written.
pub const LITEMATIC_VERSION: i32 = 5;

/// Minecraft data version written (1.18.2).
pub const MINECRAFT_DATA_VERSION: i32 = 2975;

/// Largest region edge accepted.
pub const MAX_DIMENSION: u32 = 1 << 15;

/// Encodes `layout` as a gzipped litematic.
pub fn write_litematic(layout: &CircuitLayout, options: &SerializeOptions) -> SchematicResult<Vec<u8>> {
    let dims = layout.dimensions();
    check_limits(dims)?;

    let (palette, indices) = build_palette(layout, dims);
    let bits = bits_per_entry(palette.len());
    let states = pack(&indices, bits);
    debug!(
        palette = palette.len(),
        bits,
        longs = states.len(),
        "packed litematic block states"
    );

    let size = xyz(dims.width, dims.height, dims.length);
    let region = Compound::new()
        .with("Position", xyz(0, 0, 0))
        .with("Size", size.clone())
        .with(
            "BlockStatePalette",
            palette.iter().map(palette_entry).collect::<List>(),
        )
        .with("BlockStates", Tag::LongArray(states))
        .with("Entities", List::compounds())
        .with("TileEntities", List::compounds())
        .with("PendingBlockTicks", List::compounds())
        .with("PendingFluidTicks", List::compounds());

    let metadata = Compound::new()
        .with("Name", options.name.as_str())
        .with("Author", options.author.as_str())
        .with("Description", options.description.as_str())
        .with("RegionCount", Tag::Int(1))
        .with("TimeCreated", Tag::Long(options.time_created_ms))
        .with("TimeModified", Tag::Long(options.time_modified_ms))
        .with("TotalBlocks", Tag::Int(to_i32(layout.cell_count() as u64)))
        .with("TotalVolume", Tag::Int(to_i32(dims.volume())))
        .with("EnclosingSize", size);

    let root = Compound::new()
        .with("Version", Tag::Int(LITEMATIC_VERSION))
        .with("MinecraftDataVersion", Tag::Int(MINECRAFT_DATA_VERSION))
        .with("Metadata", metadata)
        .with("Regions", Compound::new().with(options.name.as_str(), region));

    nbt::to_gzip_bytes("", &root)
}

/// Decodes a gzipped litematic. Only the first region is read.
pub fn read_litematic(data: &[u8]) -> SchematicResult<DecodedSchematic> {
    let (_, root) = nbt::from_gzip_bytes(data)?;
    decode_root(&root)
}

pub(crate) fn decode_root(root: &Compound) -> SchematicResult<DecodedSchematic> {
    let invalid = |message: &str| SchematicError::structure(SchematicFormat::Litematic, message);

    if root.get_i64("Version").is_none() {
        return Err(invalid("missing Version"));
    }
    let name = root
        .get_compound("Metadata")
        .and_then(|m| m.get_str("Name"))
        .map(str::to_string);
    let (_, region) = root
        .get_compound("Regions")
        .and_then(|r| r.iter().next())
        .ok_or_else(|| invalid("no regions"))?;
    let region = region.as_compound().ok_or_else(|| invalid("region is not a compound"))?;

    let size = region.get_compound("Size").ok_or_else(|| invalid("missing Size"))?;
    let edge = |axis: &str| -> SchematicResult<u32> {
        let v = size.get_i64(axis).ok_or_else(|| invalid("incomplete Size"))?;
        let v = u32::try_from(v.unsigned_abs()).map_err(|_| invalid("Size out of range"))?;
        if v > MAX_DIMENSION {
            return Err(invalid("Size out of range"));
        }
        Ok(v)
    };
    let dims = Dimensions::new(edge("x")?, edge("y")?, edge("z")?);

    let palette = region
        .get_list("BlockStatePalette")
        .ok_or_else(|| invalid("missing BlockStatePalette"))?
        .items()
        .iter()
        .map(|tag| tag.as_compound().map(parse_palette_entry).ok_or_else(|| invalid("bad palette entry")))
        .collect::<SchematicResult<Vec<BlockState>>>()?;
    if palette.is_empty() {
        return Err(invalid("empty palette"));
    }

    let states = match region.get("BlockStates") {
        Some(Tag::LongArray(v)) => v,
        _ => return Err(invalid("missing BlockStates")),
    };
    let volume = usize::try_from(dims.volume()).map_err(|_| invalid("region too large"))?;
    let bits = bits_per_entry(palette.len());
    if states.len() < (volume * bits as usize).div_ceil(64) {
        return Err(invalid("BlockStates shorter than region"));
    }
    let indices = unpack(states, bits, volume);

    let mut cells = BTreeMap::new();
    for (i, index) in indices.into_iter().enumerate() {
        let state = palette
            .get(index as usize)
            .ok_or_else(|| invalid("palette index out of range"))?;
        if state.is_air() {
            continue;
        }
        cells.insert(position(i, dims), cell_from_state(state));
    }

    Ok(DecodedSchematic {
        format: SchematicFormat::Litematic,
        name,
        dimensions: dims,
        cells,
    })
}

fn check_limits(dims: Dimensions) -> SchematicResult<()> {
    let too_large = |reason: String| SchematicError::TooLarge {
        format: SchematicFormat::Litematic,
        dimensions: dims,
        reason,
    };
    for (axis, edge) in [("x", dims.width), ("y", dims.height), ("z", dims.length)] {
        if edge > MAX_DIMENSION {
            return Err(too_large(format!("{} exceeds {}", axis, MAX_DIMENSION)));
        }
    }
    if dims.volume() > i32::MAX as u64 {
        return Err(too_large(format!("volume {} exceeds {}", dims.volume(), i32::MAX)));
    }
    Ok(())
}

/// Palette in first-appearance order with air at 0, and the index per cell.
fn build_palette(layout: &CircuitLayout, dims: Dimensions) -> (Vec<BlockState>, Vec<u32>) {
    let mut palette = vec![BlockState::air()];
    let mut lookup: HashMap<BlockState, u32> = HashMap::new();
    lookup.insert(BlockState::air(), 0);

    let mut indices = Vec::with_capacity(dims.volume() as usize);
    for y in 0..dims.height {
        for z in 0..dims.length {
            for x in 0..dims.width {
                let state = block_state(layout, BlockPos::new(x, y, z));
                let next = palette.len() as u32;
                let index = *lookup.entry(state.clone()).or_insert_with(|| {
                    palette.push(state);
                    next
                });
                indices.push(index);
            }
        }
    }
    (palette, indices)
}

/// Bits per packed entry for a palette of `len` states.
pub fn bits_per_entry(len: usize) -> u32 {
    let needed = if len <= 1 {
        0
    } else {
        usize::BITS - (len - 1).leading_zeros()
    };
    needed.max(2)
}

/// Packs values LSB-first, letting an entry span two longs.
pub fn pack(values: &[u32], bits: u32) -> Vec<i64> {
    let bits = bits as usize;
    let mut longs = vec![0u64; (values.len() * bits).div_ceil(64)];
    for (i, &value) in values.iter().enumerate() {
        let start = i * bits;
        let (word, offset) = (start / 64, start % 64);
        let value = u64::from(value);
        longs[word] |= value << offset;
        if offset + bits > 64 {
            longs[word + 1] |= value >> (64 - offset);
        }
    }
    longs.into_iter().map(|v| v as i64).collect()
}

/// Inverse of [`pack`].
pub fn unpack(longs: &[i64], bits: u32, count: usize) -> Vec<u32> {
    let bits = bits as usize;
    let mask = (1u64 << bits) - 1;
    (0..count)
        .map(|i| {
            let start = i * bits;
            let (word, offset) = (start / 64, start % 64);
            let mut value = (longs[word] as u64) >> offset;
            if offset + bits > 64 {
                value |= (longs[word + 1] as u64) << (64 - offset);
            }
            (value & mask) as u32
        })
        .collect()
}

fn position(index: usize, dims: Dimensions) -> BlockPos {
    let (w, l) = (dims.width as usize, dims.length as usize);
    let x = index % w;
    let z = (index / w) % l;
    let y = index / (w * l);
    BlockPos::new(x as u32, y as u32, z as u32)
}

fn palette_entry(state: &BlockState) -> Compound {
    let mut entry = Compound::new().with("Name", state.name.as_str());
    if !state.properties.is_empty() {
        let mut props = Compound::new();
        for (k, v) in &state.properties {
            props.insert(k.as_str(), v.as_str());
        }
        entry.insert("Properties", props);
    }
    entry
}

fn parse_palette_entry(entry: &Compound) -> BlockState {
    let mut state = BlockState::new(entry.get_str("Name").unwrap_or(crate::blocks::AIR));
    if let Some(props) = entry.get_compound("Properties") {
        for (k, v) in props.iter() {
            if let Some(v) = v.as_str() {
                state = state.with(k, v);
            }
        }
    }
    state
}

fn xyz(x: u32, y: u32, z: u32) -> Compound {
    Compound::new()
        .with("x", Tag::Int(to_i32(u64::from(x))))
        .with("y", Tag::Int(to_i32(u64::from(y))))
        .with("z", Tag::Int(to_i32(u64::from(z))))
}

fn to_i32(v: u64) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use redstone_spec::{BlockCell, Direction, Instrument};

    fn small_layout() -> CircuitLayout {
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        for x in 0..3 {
            layout.set(BlockPos::new(x, 0, 0), BlockCell::SolidSupport);
        }
        layout.set(BlockPos::new(0, 1, 0), BlockCell::RedstoneDust);
        layout.set(
            BlockPos::new(1, 1, 0),
            BlockCell::Repeater {
                facing: Direction::East,
                delay: 2,
            },
        );
        layout.set(
            BlockPos::new(2, 1, 0),
            BlockCell::NoteBlock {
                pitch: 7,
                instrument: Instrument::Flute,
            },
        );
        layout
    }

    #[test]
    fn test_bits_per_entry() {
        assert_eq!(bits_per_entry(1), 2);
        assert_eq!(bits_per_entry(4), 2);
        assert_eq!(bits_per_entry(5), 3);
        assert_eq!(bits_per_entry(8), 3);
        assert_eq!(bits_per_entry(9), 4);
        assert_eq!(bits_per_entry(300), 9);
    }

    #[test]
    fn test_pack_spans_longs() {
        // 5-bit entries: entry 12 starts at bit 60 and straddles the boundary.
        let values: Vec<u32> = (0..20).map(|i| (i * 7) % 32).collect();
        let longs = pack(&values, 5);
        assert_eq!(longs.len(), 2);
        assert_eq!(unpack(&longs, 5, values.len()), values);
    }

    #[test]
    fn test_pack_layout_is_lsb_first() {
        let longs = pack(&[1, 2, 3], 2);
        assert_eq!(longs, vec![0b11_10_01]);
    }

    #[test]
    fn test_write_read() {
        let layout = small_layout();
        let bytes = write_litematic(&layout, &SerializeOptions::named("demo")).unwrap();
        let decoded = read_litematic(&bytes).unwrap();
        assert_eq!(decoded.name.as_deref(), Some("demo"));
        assert_eq!(decoded.dimensions, Dimensions::new(3, 2, 1));
        assert_eq!(decoded.cell_count(), layout.cell_count());
        assert_eq!(
            decoded.cells.get(&BlockPos::new(2, 1, 0)),
            Some(&BlockCell::NoteBlock {
                pitch: 7,
                instrument: Instrument::Flute
            })
        );
    }

    #[test]
    fn test_palette_starts_with_air() {
        let layout = small_layout();
        let (palette, indices) = build_palette(&layout, layout.dimensions());
        assert!(palette[0].is_air());
        // first scanned cell (0,0,0) is stone, the next (1,0,0) too
        assert_eq!(palette[1].name, "minecraft:stone");
        assert_eq!(&indices[..2], &[1, 1]);
    }

    #[test]
    fn test_oversized_region() {
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        layout.set(BlockPos::new(MAX_DIMENSION, 0, 0), BlockCell::SolidSupport);
        let err = write_litematic(&layout, &SerializeOptions::default()).unwrap_err();
        assert!(matches!(err, SchematicError::TooLarge { .. }));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(read_litematic(b"not a litematic").is_err());
    }
}
