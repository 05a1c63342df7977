//! Key inference and scale snapping.

use redstone_spec::timing::{NOTE_BLOCK_MIDI_MAX, NOTE_BLOCK_MIDI_MIN};
use redstone_spec::NoteSequence;
use serde::{Deserialize, Serialize};

const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Major scale degrees as semitone offsets from the tonic.
pub const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Scale mode. Auto-tune only infers major keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Major,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Major => "major",
        }
    }

    /// Scale degrees as semitone offsets from the tonic.
    pub fn scale(&self) -> &'static [u8; 7] {
        match self {
            Mode::Major => &MAJOR_SCALE,
        }
    }
}

/// An inferred key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Tonic pitch class, 0 (C) through 11 (B).
    pub tonic: u8,
    pub mode: Mode,
}

impl Key {
    /// A major key on `tonic`.
    pub fn new(tonic: u8) -> Self {
        Self {
            tonic: tonic % 12,
            mode: Mode::Major,
        }
    }

    /// Name such as "G major".
    pub fn name(&self) -> String {
        format!("{} {}", PITCH_NAMES[usize::from(self.tonic)], self.mode.as_str())
    }

    /// Whether `midi` is a degree of this key's scale.
    pub fn contains(&self, midi: i32) -> bool {
        let rel = (midi - i32::from(self.tonic)).rem_euclid(12) as u8;
        self.mode.scale().contains(&rel)
    }

    /// Snaps `midi` to the nearest scale degree inside the note-block range.
    ///
    /// Equidistant candidates resolve downward unless that leaves the range.
    pub fn snap(&self, midi: i32) -> i32 {
        if self.contains(midi) {
            return midi;
        }
        let down = (1..12).map(|d| midi - d).find(|&m| self.contains(m));
        let up = (1..12).map(|d| midi + d).find(|&m| self.contains(m));
        let in_range = |m: &i32| (NOTE_BLOCK_MIDI_MIN..=NOTE_BLOCK_MIDI_MAX).contains(m);

        match (down.filter(in_range), up.filter(in_range)) {
            (Some(d), Some(u)) => {
                if midi - d <= u - midi {
                    d
                } else {
                    u
                }
            }
            (Some(d), None) => d,
            (None, Some(u)) => u,
            (None, None) => midi,
        }
    }
}

/// Infers the key from the most common pitch class.
///
/// Ties resolve to the lowest pitch class. Returns `None` for an empty
/// sequence.
pub fn infer_key(seq: &NoteSequence) -> Option<Key> {
    if seq.is_empty() {
        return None;
    }
    let mut counts = [0usize; 12];
    for note in seq {
        counts[usize::from(note.pitch_class % 12)] += 1;
    }
    let mut tonic = 0;
    for pc in 1..12 {
        if counts[pc] > counts[tonic] {
            tonic = pc;
        }
    }
    Some(Key::new(tonic as u8))
}
