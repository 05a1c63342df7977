//! Block cells and circuit layouts.
//!
//! Coordinates: `x` runs east along the time axis, `y` is height (0 is the
//! support layer, 1 the circuit layer), `z` runs south across the lanes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A position in the layout grid.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlockPos {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl BlockPos {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// The neighbouring position one step in `dir`, if it stays non-negative.
    pub fn step(&self, dir: Direction) -> Option<BlockPos> {
        let (dx, dz) = dir.offset();
        let x = self.x.checked_add_signed(dx)?;
        let z = self.z.checked_add_signed(dz)?;
        Some(BlockPos::new(x, self.y, z))
    }

    /// The position directly beneath, if any.
    pub fn below(&self) -> Option<BlockPos> {
        self.y.checked_sub(1).map(|y| BlockPos::new(self.x, y, self.z))
    }
}

/// Horizontal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// `(dx, dz)` unit offset.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

/// Note block instrument. Decided in-game by the block beneath the note block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    #[default]
    Harp,
    Bass,
    Guitar,
    Bell,
    Flute,
    Chime,
    Xylophone,
    Pling,
}

impl Instrument {
    /// Block-state value of the `instrument` property.
    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Harp => "harp",
            Instrument::Bass => "bass",
            Instrument::Guitar => "guitar",
            Instrument::Bell => "bell",
            Instrument::Flute => "flute",
            Instrument::Chime => "chime",
            Instrument::Xylophone => "xylophone",
            Instrument::Pling => "pling",
        }
    }
}

/// One addressable cell of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockCell {
    #[default]
    Air,
    /// A tuned note block; `pitch` is 0..=24.
    NoteBlock { pitch: u8, instrument: Instrument },
    RedstoneDust,
    /// `facing` is the direction the signal travels; `delay` is 1..=4.
    Repeater { facing: Direction, delay: u8 },
    SolidSupport,
}

impl BlockCell {
    pub fn is_air(&self) -> bool {
        matches!(self, BlockCell::Air)
    }

    /// Whether the cell carries or consumes redstone signal.
    pub fn is_redstone_component(&self) -> bool {
        matches!(
            self,
            BlockCell::RedstoneDust | BlockCell::Repeater { .. } | BlockCell::NoteBlock { .. }
        )
    }
}

/// Bounding-box dimensions: width (x), height (y), length (z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub length: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32, length: u32) -> Self {
        Self {
            width,
            height,
            length,
        }
    }

    pub fn volume(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * u64::from(self.length)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.length)
    }
}

/// A sparse grid of non-air cells plus the trigger entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircuitLayout {
    cells: BTreeMap<BlockPos, BlockCell>,
    trigger: BlockPos,
}

impl CircuitLayout {
    /// Creates an empty layout whose signal enters at `trigger`.
    pub fn new(trigger: BlockPos) -> Self {
        Self {
            cells: BTreeMap::new(),
            trigger,
        }
    }

    /// The cell powered first when the machine is started.
    pub fn trigger(&self) -> BlockPos {
        self.trigger
    }

    /// Places a cell; placing `Air` clears the position.
    pub fn set(&mut self, pos: BlockPos, cell: BlockCell) {
        if cell.is_air() {
            self.cells.remove(&pos);
        } else {
            self.cells.insert(pos, cell);
        }
    }

    /// Cell at `pos`, `Air` when unset.
    pub fn get(&self, pos: BlockPos) -> BlockCell {
        self.cells.get(&pos).copied().unwrap_or_default()
    }

    /// Non-air cells in `(x, y, z)` order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockPos, BlockCell)> + '_ {
        self.cells.iter().map(|(p, c)| (*p, *c))
    }

    /// Number of non-air cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Smallest box from the origin containing every cell.
    pub fn dimensions(&self) -> Dimensions {
        if self.cells.is_empty() {
            return Dimensions::default();
        }
        let mut dims = Dimensions::default();
        for pos in self.cells.keys() {
            dims.width = dims.width.max(pos.x + 1);
            dims.height = dims.height.max(pos.y + 1);
            dims.length = dims.length.max(pos.z + 1);
        }
        dims
    }

    /// Counts cells matching a predicate.
    pub fn count(&self, pred: impl Fn(&BlockCell) -> bool) -> usize {
        self.cells.values().filter(|c| pred(c)).count()
    }

    pub fn note_block_count(&self) -> usize {
        self.count(|c| matches!(c, BlockCell::NoteBlock { .. }))
    }

    pub fn dust_count(&self) -> usize {
        self.count(|c| matches!(c, BlockCell::RedstoneDust))
    }

    pub fn repeater_count(&self) -> usize {
        self.count(|c| matches!(c, BlockCell::Repeater { .. }))
    }

    pub fn support_count(&self) -> usize {
        self.count(|c| matches!(c, BlockCell::SolidSupport))
    }

    /// Positions of note blocks in grid order.
    pub fn note_blocks(&self) -> Vec<(BlockPos, u8, Instrument)> {
        self.cells
            .iter()
            .filter_map(|(pos, cell)| match cell {
                BlockCell::NoteBlock { pitch, instrument } => Some((*pos, *pitch, *instrument)),
                _ => None,
            })
            .collect()
    }

    /// Sides a dust cell at `pos` connects toward: neighbouring dust, and
    /// repeaters whose axis lines up with the side. Note blocks do not attract
    /// a connection.
    pub fn dust_connections(&self, pos: BlockPos) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&dir| {
                pos.step(dir)
                    .map(|q| match self.get(q) {
                        BlockCell::RedstoneDust => true,
                        BlockCell::Repeater { facing, .. } => {
                            facing == dir || facing == dir.opposite()
                        }
                        _ => false,
                    })
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Sides a dust cell at `pos` delivers power to.
    ///
    /// A dust with one connection also points out the opposite side; an
    /// unconnected dust points everywhere.
    pub fn dust_outputs(&self, pos: BlockPos) -> Vec<Direction> {
        let conns = self.dust_connections(pos);
        match conns.as_slice() {
            [] => Direction::ALL.to_vec(),
            [only] => vec![*only, only.opposite()],
            _ => conns,
        }
    }

    /// Returns every non-air cell above y=0 lacking a support beneath it.
    pub fn unsupported_cells(&self) -> Vec<BlockPos> {
        self.cells
            .iter()
            .filter(|(pos, cell)| cell.is_redstone_component() && pos.y > 0)
            .filter(|(pos, _)| {
                pos.below()
                    .map(|b| self.get(b) != BlockCell::SolidSupport)
                    .unwrap_or(true)
            })
            .map(|(pos, _)| *pos)
            .collect()
    }
}

/// Aggregate statistics reported for a mapped circuit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CircuitStats {
    pub note_blocks: usize,
    pub redstone_dust: usize,
    pub repeaters: usize,
    pub supports: usize,
    pub dimensions: Dimensions,
    /// Length of the trigger line in blocks.
    pub redstone_length: u32,
    pub duration_ticks: u32,
    pub duration_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_layout_is_empty_at_origin() {
        let layout = CircuitLayout::default();
        assert!(layout.is_empty());
        assert_eq!(layout.trigger(), BlockPos::new(0, 0, 0));
        assert_eq!(BlockPos::default(), BlockPos::new(0, 0, 0));
    }

    #[test]
    fn test_set_get_and_clear() {
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        let pos = BlockPos::new(2, 1, 3);
        assert_eq!(layout.get(pos), BlockCell::Air);

        layout.set(pos, BlockCell::RedstoneDust);
        assert_eq!(layout.get(pos), BlockCell::RedstoneDust);
        assert_eq!(layout.cell_count(), 1);

        layout.set(pos, BlockCell::Air);
        assert!(layout.is_empty());
    }

    #[test]
    fn test_dimensions() {
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        assert_eq!(layout.dimensions(), Dimensions::default());
        layout.set(BlockPos::new(4, 0, 2), BlockCell::SolidSupport);
        layout.set(BlockPos::new(0, 1, 0), BlockCell::RedstoneDust);
        assert_eq!(layout.dimensions(), Dimensions::new(5, 2, 3));
        assert_eq!(layout.dimensions().volume(), 30);
        assert_eq!(layout.dimensions().to_string(), "5x2x3");
    }

    #[test]
    fn test_unsupported_cells() {
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        layout.set(
            BlockPos::new(1, 1, 1),
            BlockCell::NoteBlock {
                pitch: 6,
                instrument: Instrument::Harp,
            },
        );
        assert_eq!(layout.unsupported_cells(), vec![BlockPos::new(1, 1, 1)]);
        layout.set(BlockPos::new(1, 0, 1), BlockCell::SolidSupport);
        assert!(layout.unsupported_cells().is_empty());
    }

    #[test]
    fn test_step() {
        let pos = BlockPos::new(0, 1, 0);
        assert_eq!(pos.step(Direction::East), Some(BlockPos::new(1, 1, 0)));
        assert_eq!(pos.step(Direction::North), None);
        assert_eq!(pos.below(), Some(BlockPos::new(0, 0, 0)));
        assert_eq!(Direction::East.opposite(), Direction::West);
    }

    #[test]
    fn test_dust_connections() {
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 1));
        let line = BlockPos::new(1, 1, 1);
        layout.set(BlockPos::new(0, 1, 1), BlockCell::RedstoneDust);
        layout.set(line, BlockCell::RedstoneDust);
        layout.set(
            BlockPos::new(2, 1, 1),
            BlockCell::Repeater {
                facing: Direction::East,
                delay: 1,
            },
        );
        layout.set(
            BlockPos::new(1, 1, 2),
            BlockCell::NoteBlock {
                pitch: 0,
                instrument: Instrument::Harp,
            },
        );
        assert_eq!(layout.dust_connections(line), vec![Direction::East, Direction::West]);

        // A lone branch end points straight through.
        let end = BlockPos::new(0, 1, 1);
        assert_eq!(layout.dust_connections(end), vec![Direction::East]);
        assert_eq!(layout.dust_outputs(end), vec![Direction::East, Direction::West]);
    }

    #[test]
    fn test_counts() {
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        layout.set(BlockPos::new(0, 1, 0), BlockCell::RedstoneDust);
        layout.set(
            BlockPos::new(1, 1, 0),
            BlockCell::Repeater {
                facing: Direction::East,
                delay: 2,
            },
        );
        layout.set(BlockPos::new(0, 0, 0), BlockCell::SolidSupport);
        assert_eq!(layout.dust_count(), 1);
        assert_eq!(layout.repeater_count(), 1);
        assert_eq!(layout.support_count(), 1);
        assert_eq!(layout.note_block_count(), 0);
    }
}
