//! Schematic contents read back from disk.

use std::collections::BTreeMap;

use redstone_spec::{BlockCell, BlockPos, CircuitLayout, Dimensions, SchematicFormat};

/// Cells and bounds recovered from a schematic file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSchematic {
    pub format: SchematicFormat,
    /// Name recorded in the file, when the format has one.
    pub name: Option<String>,
    pub dimensions: Dimensions,
    /// Non-air cells.
    pub cells: BTreeMap<BlockPos, BlockCell>,
}

impl DecodedSchematic {
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

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

    /// Rebuilds a layout. The trigger is the westernmost dust cell, which is
    /// where generated machines are started.
    pub fn to_layout(&self) -> CircuitLayout {
        let trigger = self
            .cells
            .iter()
            .find(|(_, cell)| matches!(cell, BlockCell::RedstoneDust))
            .map(|(pos, _)| *pos)
            .unwrap_or_default();
        let mut layout = CircuitLayout::new(trigger);
        for (pos, cell) in &self.cells {
            layout.set(*pos, *cell);
        }
        layout
    }
}
