//! Notes and note sequences.

use serde::{Deserialize, Serialize};

const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A discrete note, timed in music ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Pitch class, 0 (C) through 11 (B).
    pub pitch_class: u8,
    /// Scientific octave (C4 is middle C).
    pub octave: i8,
    /// Tick the note starts on.
    pub onset_ticks: u32,
    /// Length in ticks, at least 1.
    pub duration_ticks: u32,
    /// Loudness in [0, 1].
    pub velocity: f32,
}

impl Note {
    /// Creates a note from a MIDI number.
    pub fn from_midi(midi: i32, onset_ticks: u32, duration_ticks: u32, velocity: f32) -> Self {
        let (pitch_class, octave) = split_midi(midi);
        Self {
            pitch_class,
            octave,
            onset_ticks,
            duration_ticks: duration_ticks.max(1),
            velocity: sanitize_velocity(velocity),
        }
    }

    /// Combined pitch value as a MIDI number.
    pub fn midi(&self) -> i32 {
        (i32::from(self.octave) + 1) * 12 + i32::from(self.pitch_class)
    }

    /// Returns a copy with a different pitch, timing unchanged.
    pub fn with_midi(&self, midi: i32) -> Self {
        let (pitch_class, octave) = split_midi(midi);
        Self {
            pitch_class,
            octave,
            ..*self
        }
    }

    /// Tick just past the end of the note.
    pub fn end_ticks(&self) -> u32 {
        self.onset_ticks.saturating_add(self.duration_ticks)
    }

    /// Name such as "C4" or "F#3".
    pub fn name(&self) -> String {
        format!("{}{}", PITCH_NAMES[usize::from(self.pitch_class % 12)], self.octave)
    }
}

fn split_midi(midi: i32) -> (u8, i8) {
    let pitch_class = midi.rem_euclid(12) as u8;
    let octave = (midi.div_euclid(12) - 1).clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8;
    (pitch_class, octave)
}

fn sanitize_velocity(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Notes ordered by strictly increasing onset.
///
/// No two notes share an onset: simultaneous notes collapse to the loudest,
/// and durations are clipped so a note ends no later than the next one starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteSequence {
    notes: Vec<Note>,
}

impl NoteSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a sequence, restoring the ordering invariant.
    ///
    /// Sorting is stable, so equal onsets keep insertion order and the first
    /// of equally loud notes survives the collapse.
    pub fn from_notes(mut notes: Vec<Note>) -> Self {
        notes.sort_by_key(|n| n.onset_ticks);

        let mut out: Vec<Note> = Vec::with_capacity(notes.len());
        for mut note in notes {
            note.duration_ticks = note.duration_ticks.max(1);
            note.velocity = sanitize_velocity(note.velocity);
            match out.last_mut() {
                Some(last) if last.onset_ticks == note.onset_ticks => {
                    if note.velocity > last.velocity {
                        *last = note;
                    }
                }
                _ => out.push(note),
            }
        }

        for i in 1..out.len() {
            let gap = out[i].onset_ticks - out[i - 1].onset_ticks;
            let prev = &mut out[i - 1];
            prev.duration_ticks = prev.duration_ticks.min(gap).max(1);
        }

        Self { notes: out }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }

    /// Onsets in order.
    pub fn onsets(&self) -> Vec<u32> {
        self.notes.iter().map(|n| n.onset_ticks).collect()
    }

    /// Ticks from zero to the end of the last note.
    pub fn duration_ticks(&self) -> u32 {
        self.notes.last().map(Note::end_ticks).unwrap_or(0)
    }

    /// Keeps the first `n` notes.
    pub fn truncate(&mut self, n: usize) {
        self.notes.truncate(n);
    }
}

impl<'a> IntoIterator for &'a NoteSequence {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_midi_round_trip() {
        let note = Note::from_midi(60, 0, 4, 1.0);
        assert_eq!(note.pitch_class, 0);
        assert_eq!(note.octave, 4);
        assert_eq!(note.midi(), 60);
        assert_eq!(note.name(), "C4");

        let low = Note::from_midi(54, 0, 1, 1.0);
        assert_eq!(low.name(), "F#3");
        assert_eq!(low.with_midi(78).name(), "F#5");
    }

    #[test]
    fn test_negative_octave() {
        let note = Note::from_midi(-1, 0, 1, 0.5);
        assert_eq!(note.pitch_class, 11);
        assert_eq!(note.octave, -2);
        assert_eq!(note.midi(), -1);
    }

    #[test]
    fn test_velocity_and_duration_sanitized() {
        let note = Note::from_midi(60, 3, 0, 2.5);
        assert_eq!(note.duration_ticks, 1);
        assert_eq!(note.velocity, 1.0);
        assert_eq!(Note::from_midi(60, 0, 1, f32::NAN).velocity, 0.0);
    }

    #[test]
    fn test_from_notes_sorts_and_collapses() {
        let seq = NoteSequence::from_notes(vec![
            Note::from_midi(67, 8, 4, 0.5),
            Note::from_midi(60, 0, 4, 0.4),
            Note::from_midi(64, 0, 4, 0.9),
            Note::from_midi(62, 4, 4, 0.3),
        ]);
        assert_eq!(seq.onsets(), vec![0, 4, 8]);
        assert_eq!(seq.notes()[0].midi(), 64);
        assert_eq!(seq.duration_ticks(), 12);
    }

    #[test]
    fn test_equal_velocity_keeps_first() {
        let seq = NoteSequence::from_notes(vec![
            Note::from_midi(60, 2, 1, 0.5),
            Note::from_midi(72, 2, 1, 0.5),
        ]);
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.notes()[0].midi(), 60);
    }

    #[test]
    fn test_durations_clipped_to_next_onset() {
        let seq = NoteSequence::from_notes(vec![
            Note::from_midi(60, 0, 10, 0.5),
            Note::from_midi(62, 3, 2, 0.5),
        ]);
        assert_eq!(seq.notes()[0].duration_ticks, 3);
        assert_eq!(seq.notes()[1].duration_ticks, 2);
    }

    #[test]
    fn test_serde_transparent() {
        let seq = NoteSequence::from_notes(vec![Note::from_midi(60, 0, 4, 0.5)]);
        let json = serde_json::to_value(&seq).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["onset_ticks"], 0);
    }
}
