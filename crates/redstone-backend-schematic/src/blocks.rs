//! Block naming for both formats.
//!
//! Layout cells become namespaced block states for litematic and numeric
//! id/data pairs for the legacy format. `SolidSupport` is resolved from its
//! surroundings: under a note block it is the block that selects the note
//! block's instrument, elsewhere it is stone.

use std::collections::BTreeMap;

use redstone_spec::{BlockCell, BlockPos, CircuitLayout, Direction, Instrument};

pub const AIR: &str = "minecraft:air";
pub const STONE: &str = "minecraft:stone";
pub const NOTE_BLOCK: &str = "minecraft:note_block";
pub const REDSTONE_WIRE: &str = "minecraft:redstone_wire";
pub const REPEATER: &str = "minecraft:repeater";

/// Legacy numeric block ids.
pub mod legacy {
    pub const AIR: u8 = 0;
    pub const STONE: u8 = 1;
    pub const DIRT: u8 = 3;
    pub const PLANKS: u8 = 5;
    pub const SAND: u8 = 12;
    pub const GLASS: u8 = 20;
    pub const NOTE_BLOCK: u8 = 25;
    pub const WOOL: u8 = 35;
    pub const GOLD_BLOCK: u8 = 41;
    pub const REDSTONE_WIRE: u8 = 55;
    pub const CLAY: u8 = 82;
    pub const GLOWSTONE: u8 = 89;
    pub const REPEATER: u8 = 93;
    pub const PACKED_ICE: u8 = 174;
    pub const BONE_BLOCK: u8 = 216;
}

/// Block placed under a note block to select each instrument.
const INSTRUMENT_BLOCKS: [(Instrument, &str, u8); 8] = [
    (Instrument::Harp, "minecraft:dirt", legacy::DIRT),
    (Instrument::Bass, "minecraft:oak_planks", legacy::PLANKS),
    (Instrument::Guitar, "minecraft:white_wool", legacy::WOOL),
    (Instrument::Bell, "minecraft:gold_block", legacy::GOLD_BLOCK),
    (Instrument::Flute, "minecraft:clay", legacy::CLAY),
    (Instrument::Chime, "minecraft:packed_ice", legacy::PACKED_ICE),
    (Instrument::Xylophone, "minecraft:bone_block", legacy::BONE_BLOCK),
    (Instrument::Pling, "minecraft:glowstone", legacy::GLOWSTONE),
];

/// A namespaced block with its properties, keys sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockState {
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

impl BlockState {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn air() -> Self {
        Self::new(AIR)
    }

    pub fn is_air(&self) -> bool {
        self.name == AIR
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Block state for the cell at `pos`.
pub fn block_state(layout: &CircuitLayout, pos: BlockPos) -> BlockState {
    match layout.get(pos) {
        BlockCell::Air => BlockState::air(),
        BlockCell::NoteBlock { pitch, instrument } => BlockState::new(NOTE_BLOCK)
            .with("instrument", instrument.name())
            .with("note", pitch)
            .with("powered", false),
        BlockCell::RedstoneDust => {
            let conns = layout.dust_connections(pos);
            let side = |dir: Direction| if conns.contains(&dir) { "side" } else { "none" };
            BlockState::new(REDSTONE_WIRE)
                .with("east", side(Direction::East))
                .with("north", side(Direction::North))
                .with("power", 0)
                .with("south", side(Direction::South))
                .with("west", side(Direction::West))
        }
        // The block-state facing points back toward the input.
        BlockCell::Repeater { facing, delay } => BlockState::new(REPEATER)
            .with("delay", delay)
            .with("facing", facing.opposite().name())
            .with("locked", false)
            .with("powered", false),
        BlockCell::SolidSupport => match supported_instrument(layout, pos) {
            Some(instrument) => {
                let (_, name, _) = instrument_block(instrument);
                let state = BlockState::new(name);
                if instrument == Instrument::Xylophone {
                    state.with("axis", "y")
                } else {
                    state
                }
            }
            None => BlockState::new(STONE),
        },
    }
}

/// Legacy `(id, data)` for the cell at `pos`.
pub fn legacy_block(layout: &CircuitLayout, pos: BlockPos) -> (u8, u8) {
    match layout.get(pos) {
        BlockCell::Air => (legacy::AIR, 0),
        BlockCell::NoteBlock { pitch, .. } => (legacy::NOTE_BLOCK, pitch),
        BlockCell::RedstoneDust => (legacy::REDSTONE_WIRE, 0),
        BlockCell::Repeater { facing, delay } => (
            legacy::REPEATER,
            legacy_facing_bits(facing.opposite()) | (delay.saturating_sub(1) & 0x3) << 2,
        ),
        BlockCell::SolidSupport => match supported_instrument(layout, pos) {
            Some(instrument) => (instrument_block(instrument).2, 0),
            None => (legacy::STONE, 0),
        },
    }
}

/// Decodes a litematic block state back to a layout cell.
pub fn cell_from_state(state: &BlockState) -> BlockCell {
    match state.name.as_str() {
        AIR => BlockCell::Air,
        NOTE_BLOCK => BlockCell::NoteBlock {
            pitch: state
                .property("note")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            instrument: state
                .property("instrument")
                .and_then(instrument_from_name)
                .unwrap_or_default(),
        },
        REDSTONE_WIRE => BlockCell::RedstoneDust,
        REPEATER => BlockCell::Repeater {
            facing: state
                .property("facing")
                .and_then(direction_from_name)
                .map(|d| d.opposite())
                .unwrap_or(Direction::East),
            delay: state
                .property("delay")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
        },
        _ => BlockCell::SolidSupport,
    }
}

/// Decodes a legacy id/data pair; `below` is the id under the block.
pub fn cell_from_legacy(id: u8, data: u8, below: Option<u8>) -> BlockCell {
    match id {
        legacy::AIR => BlockCell::Air,
        legacy::NOTE_BLOCK => BlockCell::NoteBlock {
            pitch: data,
            instrument: below.and_then(instrument_from_legacy).unwrap_or_default(),
        },
        legacy::REDSTONE_WIRE => BlockCell::RedstoneDust,
        legacy::REPEATER => BlockCell::Repeater {
            facing: direction_from_legacy_bits(data & 0x3).opposite(),
            delay: ((data >> 2) & 0x3) + 1,
        },
        _ => BlockCell::SolidSupport,
    }
}

fn supported_instrument(layout: &CircuitLayout, pos: BlockPos) -> Option<Instrument> {
    let above = BlockPos::new(pos.x, pos.y + 1, pos.z);
    match layout.get(above) {
        BlockCell::NoteBlock { instrument, .. } => Some(instrument),
        _ => None,
    }
}

fn instrument_block(instrument: Instrument) -> (Instrument, &'static str, u8) {
    INSTRUMENT_BLOCKS
        .into_iter()
        .find(|(i, _, _)| *i == instrument)
        .unwrap_or(INSTRUMENT_BLOCKS[0])
}

fn instrument_from_name(name: &str) -> Option<Instrument> {
    INSTRUMENT_BLOCKS
        .into_iter()
        .map(|(i, _, _)| i)
        .find(|i| i.name() == name)
}

fn instrument_from_legacy(id: u8) -> Option<Instrument> {
    INSTRUMENT_BLOCKS
        .into_iter()
        .find(|(_, _, legacy_id)| *legacy_id == id)
        .map(|(i, _, _)| i)
}

fn direction_from_name(name: &str) -> Option<Direction> {
    Direction::ALL.into_iter().find(|d| d.name() == name)
}

/// Legacy repeater orientation bits: south 0, west 1, north 2, east 3.
fn legacy_facing_bits(dir: Direction) -> u8 {
    match dir {
        Direction::South => 0,
        Direction::West => 1,
        Direction::North => 2,
        Direction::East => 3,
    }
}

fn direction_from_legacy_bits(bits: u8) -> Direction {
    match bits {
        0 => Direction::South,
        1 => Direction::West,
        2 => Direction::North,
        _ => Direction::East,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(instrument: Instrument) -> CircuitLayout {
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        layout.set(BlockPos::new(0, 0, 0), BlockCell::SolidSupport);
        layout.set(
            BlockPos::new(0, 1, 0),
            BlockCell::NoteBlock {
                pitch: 12,
                instrument,
            },
        );
        layout
    }

    #[test]
    fn test_support_selects_instrument() {
        let layout = column(Instrument::Bell);
        let state = block_state(&layout, BlockPos::new(0, 0, 0));
        assert_eq!(state.name, "minecraft:gold_block");
        assert_eq!(legacy_block(&layout, BlockPos::new(0, 0, 0)), (41, 0));
        assert_eq!(legacy_block(&layout, BlockPos::new(0, 1, 0)), (25, 12));
    }

    #[test]
    fn test_plain_support_is_stone() {
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        layout.set(BlockPos::new(0, 0, 0), BlockCell::SolidSupport);
        layout.set(BlockPos::new(0, 1, 0), BlockCell::RedstoneDust);
        assert_eq!(block_state(&layout, BlockPos::new(0, 0, 0)).name, STONE);
        assert_eq!(legacy_block(&layout, BlockPos::new(0, 0, 0)), (1, 0));
    }

    #[test]
    fn test_repeater_states() {
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        let pos = BlockPos::new(1, 1, 0);
        layout.set(
            pos,
            BlockCell::Repeater {
                facing: Direction::East,
                delay: 4,
            },
        );
        let state = block_state(&layout, pos);
        assert_eq!(state.property("facing"), Some("west"));
        assert_eq!(state.property("delay"), Some("4"));
        // faces west (1), delay 4 -> 3 << 2
        assert_eq!(legacy_block(&layout, pos), (93, 1 | 3 << 2));

        assert_eq!(cell_from_state(&state), layout.get(pos));
        assert_eq!(cell_from_legacy(93, 1 | 3 << 2, None), layout.get(pos));
    }

    #[test]
    fn test_wire_connections() {
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        layout.set(BlockPos::new(0, 1, 0), BlockCell::RedstoneDust);
        layout.set(BlockPos::new(1, 1, 0), BlockCell::RedstoneDust);
        layout.set(BlockPos::new(1, 1, 1), BlockCell::RedstoneDust);
        let state = block_state(&layout, BlockPos::new(1, 1, 0));
        assert_eq!(state.property("west"), Some("side"));
        assert_eq!(state.property("south"), Some("side"));
        assert_eq!(state.property("east"), Some("none"));
        let keys: Vec<&str> = state.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["east", "north", "power", "south", "west"]);
    }

    #[test]
    fn test_note_block_round_trip() {
        for (instrument, _, legacy_id) in INSTRUMENT_BLOCKS {
            let layout = column(instrument);
            let pos = BlockPos::new(0, 1, 0);
            let state = block_state(&layout, pos);
            assert_eq!(cell_from_state(&state), layout.get(pos));
            assert_eq!(cell_from_legacy(25, 12, Some(legacy_id)), layout.get(pos));
        }
    }
}
