//! Sequence transforms.
//!
//! Applied in a fixed order: pitch shift, octave shift, speed rescale,
//! density thinning, max-note truncation, auto-tune. Pitch shifts clamp to the
//! note-block range instead of dropping notes.

use redstone_spec::timing::clamp_midi;
use redstone_spec::{Density, Note, NoteSequence, TransformParameters};
use tracing::debug;

use crate::error::{CircuitError, CircuitResult};
use crate::key::infer_key;

/// Notes shorter than this many ticks are dropped at medium and low density.
pub const MIN_DURATION_TICKS: u32 = 2;

/// At low density, every Nth surviving note is kept.
pub const LOW_DENSITY_STRIDE: usize = 2;

/// Applies every enabled transform to `seq`.
///
/// The result has at most `params.max_notes` notes and every pitch lies in
/// the playable range.
pub fn transform(seq: &NoteSequence, params: &TransformParameters) -> CircuitResult<NoteSequence> {
    params.validate()?;
    if seq.is_empty() {
        return Err(CircuitError::EmptySequence);
    }

    let notes: Vec<Note> = seq
        .iter()
        .map(|n| shift_pitch(n, params.pitch_shift))
        .map(|n| shift_pitch(&n, params.octave_shift * 12))
        .collect();

    let mut notes = rescale_speed(notes, params.speed_factor);
    notes = thin_density(notes, params.density);
    notes.truncate(params.max_notes);

    if params.auto_tune {
        let staged = NoteSequence::from_notes(notes);
        notes = match infer_key(&staged) {
            Some(key) => {
                debug!(key = %key.name(), "auto-tune key");
                staged.iter().map(|n| n.with_midi(key.snap(n.midi()))).collect()
            }
            None => staged.into_notes(),
        };
    }

    let out = NoteSequence::from_notes(notes);
    debug!(
        input = seq.len(),
        output = out.len(),
        density = %params.density,
        "transformed sequence"
    );
    Ok(out)
}

/// Shifts a note by `semitones`, clamping into the note-block range.
pub fn shift_pitch(note: &Note, semitones: i32) -> Note {
    note.with_midi(clamp_midi(note.midi() + semitones))
}

/// Divides onsets and durations by `speed`, rounding to whole ticks.
///
/// Notes that land on the same tick collapse to the loudest.
pub fn rescale_speed(notes: Vec<Note>, speed: f64) -> Vec<Note> {
    if speed == 1.0 {
        return NoteSequence::from_notes(notes).into_notes();
    }
    let scale = |ticks: u32| (f64::from(ticks) / speed).round() as u32;
    let scaled = notes
        .into_iter()
        .map(|n| Note {
            onset_ticks: scale(n.onset_ticks),
            duration_ticks: scale(n.duration_ticks).max(1),
            ..n
        })
        .collect();
    NoteSequence::from_notes(scaled).into_notes()
}

/// Thins an onset-ordered note list, always keeping the first and last note.
pub fn thin_density(notes: Vec<Note>, density: Density) -> Vec<Note> {
    if density == Density::High || notes.len() <= 2 {
        return notes;
    }

    let last = notes.len() - 1;
    let long_enough: Vec<Note> = notes
        .into_iter()
        .enumerate()
        .filter(|(i, n)| *i == 0 || *i == last || n.duration_ticks >= MIN_DURATION_TICKS)
        .map(|(_, n)| n)
        .collect();

    if density == Density::Medium || long_enough.len() <= 2 {
        return long_enough;
    }

    let last = long_enough.len() - 1;
    long_enough
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i % LOW_DENSITY_STRIDE == 0 || *i == last)
        .map(|(_, n)| n)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use redstone_spec::timing::{NOTE_BLOCK_MIDI_MAX, NOTE_BLOCK_MIDI_MIN};

    fn arpeggio() -> NoteSequence {
        NoteSequence::from_notes(vec![
            Note::from_midi(60, 0, 4, 0.8),
            Note::from_midi(64, 4, 4, 0.8),
            Note::from_midi(67, 8, 4, 0.8),
        ])
    }

    fn params(max_notes: usize) -> TransformParameters {
        TransformParameters {
            max_notes,
            ..Default::default()
        }
    }

    fn midis(seq: &NoteSequence) -> Vec<i32> {
        seq.iter().map(|n| n.midi()).collect()
    }

    #[test]
    fn test_identity_parameters() {
        let out = transform(&arpeggio(), &params(10)).unwrap();
        assert_eq!(out, arpeggio());
    }

    #[test]
    fn test_max_notes_truncates_tail() {
        let out = transform(&arpeggio(), &params(2)).unwrap();
        assert_eq!(out.onsets(), vec![0, 4]);
        assert_eq!(midis(&out), vec![60, 64]);
    }

    #[test]
    fn test_pitch_shift_clamps() {
        let p = TransformParameters {
            pitch_shift: 20,
            ..params(10)
        };
        let out = transform(&arpeggio(), &p).unwrap();
        assert_eq!(midis(&out), vec![NOTE_BLOCK_MIDI_MAX; 3]);

        let p = TransformParameters {
            octave_shift: -2,
            ..params(10)
        };
        let out = transform(&arpeggio(), &p).unwrap();
        assert_eq!(midis(&out), vec![NOTE_BLOCK_MIDI_MIN; 3]);
    }

    #[test]
    fn test_out_of_range_input_is_clamped_without_shift() {
        let seq = NoteSequence::from_notes(vec![Note::from_midi(40, 0, 1, 0.5)]);
        let out = transform(&seq, &params(10)).unwrap();
        assert_eq!(midis(&out), vec![NOTE_BLOCK_MIDI_MIN]);
    }

    #[test]
    fn test_octave_shift() {
        let p = TransformParameters {
            octave_shift: 1,
            ..params(10)
        };
        let out = transform(&arpeggio(), &p).unwrap();
        assert_eq!(midis(&out), vec![72, 76, 78]);
    }

    #[test]
    fn test_speed_doubles_tempo() {
        let p = TransformParameters {
            speed_factor: 2.0,
            ..params(10)
        };
        let out = transform(&arpeggio(), &p).unwrap();
        assert_eq!(out.onsets(), vec![0, 2, 4]);
        assert!(out.iter().all(|n| n.duration_ticks == 2));
    }

    #[test]
    fn test_speed_collapses_and_floors_duration() {
        let seq = NoteSequence::from_notes(vec![
            Note::from_midi(60, 0, 1, 0.3),
            Note::from_midi(62, 1, 1, 0.9),
            Note::from_midi(64, 4, 1, 0.5),
        ]);
        let p = TransformParameters {
            speed_factor: 4.0,
            ..params(10)
        };
        let out = transform(&seq, &p).unwrap();
        assert_eq!(out.onsets(), vec![0, 1]);
        assert_eq!(midis(&out), vec![62, 64]);
        assert!(out.iter().all(|n| n.duration_ticks >= 1));
    }

    #[test]
    fn test_slow_down() {
        let p = TransformParameters {
            speed_factor: 0.5,
            ..params(10)
        };
        let out = transform(&arpeggio(), &p).unwrap();
        assert_eq!(out.onsets(), vec![0, 8, 16]);
        assert_eq!(out.duration_ticks(), 24);
    }

    #[test]
    fn test_medium_density_drops_short_notes() {
        let seq = NoteSequence::from_notes(vec![
            Note::from_midi(60, 0, 1, 0.5),
            Note::from_midi(62, 1, 1, 0.5),
            Note::from_midi(64, 2, 3, 0.5),
            Note::from_midi(65, 5, 1, 0.5),
            Note::from_midi(67, 6, 1, 0.5),
        ]);
        let p = TransformParameters {
            density: Density::Medium,
            ..params(10)
        };
        let out = transform(&seq, &p).unwrap();
        assert_eq!(out.onsets(), vec![0, 2, 6]);
    }

    #[test]
    fn test_low_density_keeps_every_other() {
        let seq = NoteSequence::from_notes(
            (0..7).map(|i| Note::from_midi(60 + i, i as u32 * 2, 2, 0.5)).collect(),
        );
        let p = TransformParameters {
            density: Density::Low,
            ..params(10)
        };
        let out = transform(&seq, &p).unwrap();
        assert_eq!(out.onsets(), vec![0, 4, 8, 12]);

        let seq = NoteSequence::from_notes(
            (0..6).map(|i| Note::from_midi(60 + i, i as u32 * 2, 2, 0.5)).collect(),
        );
        let out = transform(&seq, &p).unwrap();
        assert_eq!(out.onsets(), vec![0, 4, 8, 10]);
    }

    #[test]
    fn test_auto_tune_snaps_to_inferred_key() {
        let seq = NoteSequence::from_notes(vec![
            Note::from_midi(60, 0, 2, 0.5),
            Note::from_midi(61, 2, 2, 0.5),
            Note::from_midi(60, 4, 2, 0.5),
            Note::from_midi(66, 6, 2, 0.5),
        ]);
        let p = TransformParameters {
            auto_tune: true,
            ..params(10)
        };
        let out = transform(&seq, &p).unwrap();
        assert_eq!(midis(&out), vec![60, 60, 60, 65]);
    }

    #[test]
    fn test_empty_sequence() {
        assert!(matches!(
            transform(&NoteSequence::new(), &params(10)),
            Err(CircuitError::EmptySequence)
        ));
    }

    #[test]
    fn test_invalid_parameters() {
        let p = TransformParameters {
            speed_factor: -1.0,
            ..params(10)
        };
        assert!(matches!(transform(&arpeggio(), &p), Err(CircuitError::Parameter(_))));
    }
}
