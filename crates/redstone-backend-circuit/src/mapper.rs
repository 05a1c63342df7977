//! Circuit layout.
//!
//! The trigger line runs east along `x` at `z = z0` on the circuit layer
//! (`y = 1`). Each note gets a tap: a dust cell on the line whose `x` is
//! `onset + index + 1`, reached through repeaters whose delays sum to the
//! note's onset. A dust branch runs from the tap across to the row of the
//! note's pitch lane, where its note block sits. Lower-pitched lanes lie north
//! of the line, higher ones south. Everything on the circuit layer stands on a
//! support block.

use std::collections::BTreeSet;

use redstone_spec::timing::{
    clamp_midi, midi_to_block_pitch, ticks_to_seconds, DEFAULT_MAX_REPEATERS_PER_LANE,
    MAX_DUST_RUN, MAX_REPEATER_DELAY,
};
use redstone_spec::{
    BlockCell, BlockPos, CircuitLayout, CircuitStats, Direction, Instrument, Note, NoteSequence,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CircuitError, CircuitResult};
use crate::instrument::InstrumentStrategy;

/// Height of the support layer.
pub const SUPPORT_Y: u32 = 0;
/// Height of the circuit layer.
pub const CIRCUIT_Y: u32 = 1;

/// Tunables for [`CircuitMapper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Longest dust path, counted from its power source, that still reaches
    /// a note block.
    pub max_dust_run: u32,
    /// Safety cap on repeaters along the path to any lane.
    pub max_repeaters_per_lane: u32,
    pub instrument_strategy: InstrumentStrategy,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_dust_run: MAX_DUST_RUN,
            max_repeaters_per_lane: DEFAULT_MAX_REPEATERS_PER_LANE,
            instrument_strategy: InstrumentStrategy::Harp,
        }
    }
}

impl MapperConfig {
    pub fn validate(&self) -> CircuitResult<()> {
        if !(1..=MAX_DUST_RUN).contains(&self.max_dust_run) {
            return Err(CircuitError::InvalidConfig {
                name: "max_dust_run",
                message: format!("must be in [1, {}], got {}", MAX_DUST_RUN, self.max_dust_run),
            });
        }
        if self.max_repeaters_per_lane == 0 {
            return Err(CircuitError::InvalidConfig {
                name: "max_repeaters_per_lane",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Which side of the trigger line a lane sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    North,
    South,
}

impl Side {
    fn direction(&self) -> Direction {
        match self {
            Side::North => Direction::North,
            Side::South => Direction::South,
        }
    }
}

/// A row of note blocks sharing one pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    /// Note-block pitch, 0..=24.
    pub pitch: u8,
    pub instrument: Instrument,
    pub side: Side,
    /// Row of the lane's note blocks.
    pub z: u32,
    /// Dust cells between the trigger line and the lane row.
    pub branch_len: u32,
}

/// Where and when one note is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tap {
    pub note_index: usize,
    pub onset_ticks: u32,
    /// Column of the tap dust on the trigger line.
    pub x: u32,
    pub note_block: BlockPos,
    /// Sum of repeater delays from the trigger to this tap.
    pub delay: u32,
    /// Repeaters passed on the way.
    pub repeaters: u32,
}

/// A mapped circuit with its bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedCircuit {
    pub layout: CircuitLayout,
    pub stats: CircuitStats,
    pub lanes: Vec<Lane>,
    pub taps: Vec<Tap>,
}

/// Lays note sequences out as redstone circuits.
#[derive(Debug, Clone, Default)]
pub struct CircuitMapper {
    config: MapperConfig,
}

impl CircuitMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Builds the circuit for `seq`.
    pub fn map(&self, seq: &NoteSequence) -> CircuitResult<MappedCircuit> {
        self.config.validate()?;
        if seq.is_empty() {
            return Err(CircuitError::EmptySequence);
        }

        let lanes = self.plan_lanes(seq);
        self.check_repeater_cap(seq, &lanes)?;

        let north = lanes.iter().filter(|l| l.side == Side::North).count() as u32;
        let z0 = if north > 0 { north + 1 } else { 0 };

        let mut builder = LineBuilder::new(z0);
        let mut taps = Vec::with_capacity(seq.len());
        let mut prev_onset = 0;

        for (index, note) in seq.iter().enumerate() {
            let lane = lane_for(&lanes, note);
            builder.delay(note.onset_ticks - prev_onset);
            prev_onset = note.onset_ticks;

            let run = builder.dust_run + 1 + lane.branch_len;
            if run > self.config.max_dust_run {
                return Err(CircuitError::DustRunTooLong {
                    pitch: lane.pitch,
                    run,
                    max: self.config.max_dust_run,
                });
            }

            let tap_x = builder.tap();
            let note_block = builder.branch(tap_x, lane);
            debug_assert_eq!(tap_x, note.onset_ticks + index as u32 + 1);

            taps.push(Tap {
                note_index: index,
                onset_ticks: note.onset_ticks,
                x: tap_x,
                note_block,
                delay: builder.delay_total,
                repeaters: builder.repeaters,
            });
        }

        let layout = builder.layout;
        let duration_ticks = seq.duration_ticks();
        let stats = CircuitStats {
            note_blocks: layout.note_block_count(),
            redstone_dust: layout.dust_count(),
            repeaters: layout.repeater_count(),
            supports: layout.support_count(),
            dimensions: layout.dimensions(),
            redstone_length: builder.cursor,
            duration_ticks,
            duration_seconds: ticks_to_seconds(duration_ticks),
        };

        info!(
            notes = seq.len(),
            lanes = lanes.len(),
            repeaters = stats.repeaters,
            dimensions = %stats.dimensions,
            "mapped circuit"
        );
        Ok(MappedCircuit {
            layout,
            stats,
            lanes,
            taps,
        })
    }

    /// One lane per distinct pitch, ascending; the lower half goes north.
    fn plan_lanes(&self, seq: &NoteSequence) -> Vec<Lane> {
        let pitches: BTreeSet<u8> = seq.iter().map(block_pitch).collect();
        let count = pitches.len() as u32;
        let north = count / 2;
        let z0 = if north > 0 { north + 1 } else { 0 };

        pitches
            .into_iter()
            .enumerate()
            .map(|(k, pitch)| {
                let k = k as u32;
                let instrument = self.config.instrument_strategy.select(pitch);
                if k < north {
                    Lane {
                        pitch,
                        instrument,
                        side: Side::North,
                        z: k,
                        branch_len: z0 - 1 - k,
                    }
                } else {
                    let depth = k - north;
                    Lane {
                        pitch,
                        instrument,
                        side: Side::South,
                        z: z0 + depth + 2,
                        branch_len: depth + 1,
                    }
                }
            })
            .collect()
    }

    /// Fails before building anything if a lane's path needs too many repeaters.
    fn check_repeater_cap(&self, seq: &NoteSequence, lanes: &[Lane]) -> CircuitResult<()> {
        let cap = u64::from(self.config.max_repeaters_per_lane);
        let mut total: u64 = 0;
        let mut prev = 0;
        for note in seq {
            total += repeaters_for_gap(note.onset_ticks - prev);
            prev = note.onset_ticks;
            if total > cap {
                let lane = lane_for(lanes, note);
                return Err(CircuitError::LayoutOverflow {
                    pitch: lane.pitch,
                    repeaters: u32::try_from(total).unwrap_or(u32::MAX),
                    cap: self.config.max_repeaters_per_lane,
                });
            }
        }
        debug!(repeaters = total, "repeater budget ok");
        Ok(())
    }
}

/// Maps with the default configuration.
pub fn map_circuit(seq: &NoteSequence) -> CircuitResult<MappedCircuit> {
    CircuitMapper::default().map(seq)
}

/// Repeaters used to delay a gap: full-delay repeaters plus 1-tick padding.
pub fn repeaters_for_gap(gap: u32) -> u64 {
    let full = u32::from(MAX_REPEATER_DELAY);
    u64::from(gap / full + gap % full)
}

fn block_pitch(note: &Note) -> u8 {
    midi_to_block_pitch(clamp_midi(note.midi())).unwrap_or(0)
}

fn lane_for<'a>(lanes: &'a [Lane], note: &Note) -> &'a Lane {
    let pitch = block_pitch(note);
    // plan_lanes covers every pitch of the sequence
    lanes
        .iter()
        .find(|l| l.pitch == pitch)
        .unwrap_or(&lanes[0])
}

/// Writes the trigger line and branches cell by cell.
struct LineBuilder {
    layout: CircuitLayout,
    z0: u32,
    cursor: u32,
    /// Dust cells since the last repeater (or the entry).
    dust_run: u32,
    delay_total: u32,
    repeaters: u32,
}

impl LineBuilder {
    fn new(z0: u32) -> Self {
        let entry = BlockPos::new(0, CIRCUIT_Y, z0);
        let mut builder = Self {
            layout: CircuitLayout::new(entry),
            z0,
            cursor: 0,
            dust_run: 0,
            delay_total: 0,
            repeaters: 0,
        };
        builder.line_dust();
        builder
    }

    fn place(&mut self, x: u32, z: u32, cell: BlockCell) {
        self.layout.set(BlockPos::new(x, CIRCUIT_Y, z), cell);
        self.layout
            .set(BlockPos::new(x, SUPPORT_Y, z), BlockCell::SolidSupport);
    }

    fn line_dust(&mut self) {
        self.place(self.cursor, self.z0, BlockCell::RedstoneDust);
        self.cursor += 1;
        self.dust_run += 1;
    }

    fn repeater(&mut self, delay: u8) {
        self.place(
            self.cursor,
            self.z0,
            BlockCell::Repeater {
                facing: Direction::East,
                delay,
            },
        );
        self.cursor += 1;
        self.dust_run = 0;
        self.delay_total += u32::from(delay);
        self.repeaters += 1;
    }

    /// Emits `gap` columns whose repeaters delay the signal by exactly `gap`.
    fn delay(&mut self, gap: u32) {
        let full = u32::from(MAX_REPEATER_DELAY);
        for _ in 0..gap / full {
            self.unit(MAX_REPEATER_DELAY);
        }
        for _ in 0..gap % full {
            self.unit(1);
        }
    }

    /// `delay - 1` padding dust, then a repeater: `delay` columns in all.
    fn unit(&mut self, delay: u8) {
        for _ in 1..delay {
            self.line_dust();
        }
        self.repeater(delay);
    }

    /// Places a tap dust on the line and returns its column.
    fn tap(&mut self) -> u32 {
        let x = self.cursor;
        self.line_dust();
        x
    }

    /// Runs dust from the tap to the lane row and places the note block.
    fn branch(&mut self, x: u32, lane: &Lane) -> BlockPos {
        let dir = lane.side.direction();
        let mut pos = BlockPos::new(x, CIRCUIT_Y, self.z0);
        for _ in 0..lane.branch_len {
            pos = step_or_stay(pos, dir);
            self.place(pos.x, pos.z, BlockCell::RedstoneDust);
        }
        let note_pos = step_or_stay(pos, dir);
        self.place(
            note_pos.x,
            note_pos.z,
            BlockCell::NoteBlock {
                pitch: lane.pitch,
                instrument: lane.instrument,
            },
        );
        note_pos
    }
}

fn step_or_stay(pos: BlockPos, dir: Direction) -> BlockPos {
    pos.step(dir).unwrap_or(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::trace_delays;
    use pretty_assertions::assert_eq;

    fn arpeggio() -> NoteSequence {
        NoteSequence::from_notes(vec![
            Note::from_midi(60, 0, 4, 0.8),
            Note::from_midi(64, 4, 4, 0.8),
            Note::from_midi(67, 8, 4, 0.8),
        ])
    }

    #[test]
    fn test_three_note_layout() {
        let mapped = map_circuit(&arpeggio()).unwrap();
        assert_eq!(mapped.stats.note_blocks, 3);
        assert_eq!(mapped.stats.repeaters, 2);
        assert_eq!(mapped.stats.duration_ticks, 12);
        assert_eq!(mapped.stats.redstone_length, 12);

        let xs: Vec<u32> = mapped.taps.iter().map(|t| t.x).collect();
        assert_eq!(xs, vec![1, 6, 11]);
        let delays: Vec<u32> = mapped.taps.iter().map(|t| t.delay).collect();
        assert_eq!(delays, vec![0, 4, 8]);
    }

    #[test]
    fn test_lane_sides() {
        let mapped = map_circuit(&arpeggio()).unwrap();
        let lanes: Vec<(u8, Side, u32)> = mapped.lanes.iter().map(|l| (l.pitch, l.side, l.z)).collect();
        // pitches 6, 10, 13; one lane north of the line at z0 = 2
        assert_eq!(
            lanes,
            vec![(6, Side::North, 0), (10, Side::South, 4), (13, Side::South, 5)]
        );
        assert_eq!(mapped.layout.trigger(), BlockPos::new(0, 1, 2));
        assert_eq!(mapped.stats.dimensions.length, 6);
        assert_eq!(mapped.stats.dimensions.height, 2);
    }

    #[test]
    fn test_single_lane_sits_south() {
        let seq = NoteSequence::from_notes(vec![Note::from_midi(60, 3, 1, 0.5)]);
        let mapped = map_circuit(&seq).unwrap();
        assert_eq!(mapped.lanes[0].side, Side::South);
        assert_eq!(mapped.layout.trigger().z, 0);
        assert_eq!(mapped.taps[0].note_block, BlockPos::new(4, 1, 2));
        // three 1-tick repeaters cover a 3 tick gap
        assert_eq!(mapped.stats.repeaters, 3);
    }

    #[test]
    fn test_every_component_supported() {
        let mapped = map_circuit(&arpeggio()).unwrap();
        assert!(mapped.layout.unsupported_cells().is_empty());
    }

    #[test]
    fn test_trace_matches_onsets() {
        let seq = NoteSequence::from_notes(vec![
            Note::from_midi(54, 0, 1, 0.5),
            Note::from_midi(78, 1, 6, 0.5),
            Note::from_midi(66, 7, 3, 0.5),
            Note::from_midi(54, 10, 9, 0.5),
            Note::from_midi(70, 19, 2, 0.5),
        ]);
        let mapped = map_circuit(&seq).unwrap();
        let traced = trace_delays(&mapped.layout);
        assert_eq!(traced.len(), seq.len());
        for tap in &mapped.taps {
            assert_eq!(traced.get(&tap.note_block), Some(&tap.onset_ticks));
        }
    }

    #[test]
    fn test_repeater_cap_overflow() {
        let mapper = CircuitMapper::new(MapperConfig {
            max_repeaters_per_lane: 3,
            ..Default::default()
        });
        let seq = NoteSequence::from_notes(vec![
            Note::from_midi(60, 0, 1, 0.5),
            Note::from_midi(62, 16, 1, 0.5),
        ]);
        assert!(matches!(
            mapper.map(&seq),
            Err(CircuitError::LayoutOverflow {
                pitch: 8,
                repeaters: 4,
                cap: 3
            })
        ));
    }

    #[test]
    fn test_dust_run_limit() {
        let mapper = CircuitMapper::new(MapperConfig {
            max_dust_run: 3,
            ..Default::default()
        });
        // Runs: entry + tap + 1 branch dust, then tap + 1, then tap + 2.
        let seq = NoteSequence::from_notes(vec![
            Note::from_midi(60, 0, 1, 0.5),
            Note::from_midi(62, 1, 1, 0.5),
            Note::from_midi(64, 2, 1, 0.5),
        ]);
        assert!(mapper.map(&seq).is_ok());

        // The deepest lane fed straight from the entry needs 4.
        let seq = NoteSequence::from_notes(vec![
            Note::from_midi(64, 0, 1, 0.5),
            Note::from_midi(60, 1, 1, 0.5),
            Note::from_midi(62, 2, 1, 0.5),
        ]);
        assert!(matches!(
            mapper.map(&seq),
            Err(CircuitError::DustRunTooLong { run: 4, max: 3, .. })
        ));
    }

    #[test]
    fn test_empty_sequence() {
        assert!(matches!(
            map_circuit(&NoteSequence::new()),
            Err(CircuitError::EmptySequence)
        ));
    }

    #[test]
    fn test_repeaters_for_gap() {
        assert_eq!(repeaters_for_gap(0), 0);
        assert_eq!(repeaters_for_gap(3), 3);
        assert_eq!(repeaters_for_gap(4), 1);
        assert_eq!(repeaters_for_gap(9), 3);
    }
}
