//! Logical signal tracing.
//!
//! Walks the layout from its trigger the way a redstone signal would,
//! without simulating strength or game ticks: dust passes the signal on
//! instantly, repeaters add their delay, note blocks end a path. The result
//! is the earliest arrival time at every note block the signal reaches.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use redstone_spec::{BlockCell, BlockPos, CircuitLayout, Direction};

/// Earliest delay, in redstone ticks, at each reachable note block.
pub fn trace_delays(layout: &CircuitLayout) -> BTreeMap<BlockPos, u32> {
    let mut best: HashMap<BlockPos, u32> = HashMap::new();
    let mut queue = BinaryHeap::new();

    let start = layout.trigger();
    if !matches!(layout.get(start), BlockCell::RedstoneDust) {
        return BTreeMap::new();
    }
    best.insert(start, 0);
    queue.push(Reverse((0u32, start)));

    while let Some(Reverse((delay, pos))) = queue.pop() {
        if best.get(&pos).is_some_and(|&d| d < delay) {
            continue;
        }
        for (next, cost) in successors(layout, pos) {
            let arrival = delay + cost;
            if best.get(&next).map_or(true, |&d| arrival < d) {
                best.insert(next, arrival);
                queue.push(Reverse((arrival, next)));
            }
        }
    }

    best.into_iter()
        .filter(|(pos, _)| matches!(layout.get(*pos), BlockCell::NoteBlock { .. }))
        .collect()
}

/// Cells receiving signal from `pos`, with the delay added on the way.
fn successors(layout: &CircuitLayout, pos: BlockPos) -> Vec<(BlockPos, u32)> {
    match layout.get(pos) {
        BlockCell::RedstoneDust => {
            let outputs = layout.dust_outputs(pos);
            Direction::ALL
                .into_iter()
                .filter_map(|dir| {
                    let next = pos.step(dir)?;
                    match layout.get(next) {
                        BlockCell::RedstoneDust => Some((next, 0)),
                        BlockCell::Repeater { facing, .. } if facing == dir => Some((next, 0)),
                        BlockCell::NoteBlock { .. } if outputs.contains(&dir) => Some((next, 0)),
                        _ => None,
                    }
                })
                .collect()
        }
        BlockCell::Repeater { facing, delay } => {
            let Some(next) = pos.step(facing) else {
                return Vec::new();
            };
            let cost = u32::from(delay);
            match layout.get(next) {
                BlockCell::RedstoneDust | BlockCell::NoteBlock { .. } => vec![(next, cost)],
                BlockCell::Repeater { facing: f, .. } if f == facing => vec![(next, cost)],
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redstone_spec::Instrument;

    const NOTE: BlockCell = BlockCell::NoteBlock {
        pitch: 0,
        instrument: Instrument::Harp,
    };

    #[test]
    fn test_repeater_chain_adds_delays() {
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        layout.set(BlockPos::new(0, 1, 0), BlockCell::RedstoneDust);
        layout.set(
            BlockPos::new(1, 1, 0),
            BlockCell::Repeater {
                facing: Direction::East,
                delay: 3,
            },
        );
        layout.set(
            BlockPos::new(2, 1, 0),
            BlockCell::Repeater {
                facing: Direction::East,
                delay: 2,
            },
        );
        layout.set(BlockPos::new(3, 1, 0), NOTE);

        let traced = trace_delays(&layout);
        assert_eq!(traced.get(&BlockPos::new(3, 1, 0)), Some(&5));
    }

    #[test]
    fn test_backwards_repeater_blocks_signal() {
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        layout.set(BlockPos::new(0, 1, 0), BlockCell::RedstoneDust);
        layout.set(
            BlockPos::new(1, 1, 0),
            BlockCell::Repeater {
                facing: Direction::West,
                delay: 1,
            },
        );
        layout.set(BlockPos::new(2, 1, 0), NOTE);
        assert!(trace_delays(&layout).is_empty());
    }

    #[test]
    fn test_dust_beside_note_block_without_pointing() {
        // Line runs east; the note block sits beside it, not in front.
        let mut layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        layout.set(BlockPos::new(0, 1, 0), BlockCell::RedstoneDust);
        layout.set(BlockPos::new(1, 1, 0), BlockCell::RedstoneDust);
        layout.set(BlockPos::new(2, 1, 0), BlockCell::RedstoneDust);
        layout.set(BlockPos::new(1, 1, 1), NOTE);
        assert!(trace_delays(&layout).is_empty());
    }

    #[test]
    fn test_missing_trigger() {
        let layout = CircuitLayout::new(BlockPos::new(0, 1, 0));
        assert!(trace_delays(&layout).is_empty());
    }
}
