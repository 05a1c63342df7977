//! Property tests for circuit mapping.
//!
//! Every mapped layout must play each note exactly on its onset tick, keep
//! every component supported, and stay within the dust run limit.
//!
//! ```bash
//! cargo test -p redstone-backend-circuit --test proptest_mapper
//! ```

use proptest::prelude::*;

use redstone_backend_circuit::{map_circuit, trace_delays, transform, CircuitError};
use redstone_spec::timing::{NOTE_BLOCK_MIDI_MAX, NOTE_BLOCK_MIDI_MIN};
use redstone_spec::{BlockCell, Note, NoteSequence, TransformParameters};

/// Sequences with strictly increasing onsets inside the note-block range.
fn playable_sequence() -> impl Strategy<Value = NoteSequence> {
    prop::collection::vec(
        (NOTE_BLOCK_MIDI_MIN..=NOTE_BLOCK_MIDI_MAX, 1u32..24, 0.05f32..1.0),
        1..40,
    )
    .prop_map(|raw| {
        let mut onset = 0;
        let notes = raw
            .into_iter()
            .map(|(midi, gap, velocity)| {
                let note = Note::from_midi(midi, onset, gap, velocity);
                onset += gap;
                note
            })
            .collect();
        NoteSequence::from_notes(notes)
    })
}

/// Arbitrary note lists, including out-of-range pitches and onset collisions.
fn raw_sequence() -> impl Strategy<Value = NoteSequence> {
    prop::collection::vec((0i32..128, 0u32..200, 1u32..16, 0.0f32..1.0), 0..60).prop_map(|raw| {
        NoteSequence::from_notes(
            raw.into_iter()
                .map(|(midi, onset, dur, vel)| Note::from_midi(midi, onset, dur, vel))
                .collect(),
        )
    })
}

fn transform_params() -> impl Strategy<Value = TransformParameters> {
    (-24i32..=24, -4i32..=4, 1usize..300, any::<bool>()).prop_map(
        |(pitch_shift, octave_shift, max_notes, auto_tune)| TransformParameters {
            pitch_shift,
            octave_shift,
            max_notes,
            auto_tune,
            ..Default::default()
        },
    )
}

proptest! {
    #[test]
    fn traced_delay_matches_onset(seq in playable_sequence()) {
        let mapped = map_circuit(&seq).unwrap();
        let traced = trace_delays(&mapped.layout);

        prop_assert_eq!(mapped.taps.len(), seq.len());
        prop_assert_eq!(traced.len(), seq.len());
        for (tap, note) in mapped.taps.iter().zip(seq.iter()) {
            prop_assert_eq!(tap.delay, note.onset_ticks);
            prop_assert_eq!(traced.get(&tap.note_block).copied(), Some(note.onset_ticks));
        }
    }

    #[test]
    fn every_component_is_supported(seq in playable_sequence()) {
        let mapped = map_circuit(&seq).unwrap();
        prop_assert!(mapped.layout.unsupported_cells().is_empty());
    }

    #[test]
    fn repeater_delays_are_legal(seq in playable_sequence()) {
        let mapped = map_circuit(&seq).unwrap();
        for (_, cell) in mapped.layout.iter() {
            if let BlockCell::Repeater { delay, .. } = cell {
                prop_assert!((1..=4).contains(&delay));
            }
        }
    }

    #[test]
    fn note_blocks_match_sequence(seq in playable_sequence()) {
        let mapped = map_circuit(&seq).unwrap();
        prop_assert_eq!(mapped.stats.note_blocks, seq.len());
        prop_assert_eq!(mapped.stats.duration_ticks, seq.duration_ticks());
        for (_, pitch, _) in mapped.layout.note_blocks() {
            prop_assert!(pitch <= 24);
        }
    }

    #[test]
    fn transform_then_map_never_panics(seq in raw_sequence(), params in transform_params()) {
        match transform(&seq, &params) {
            Ok(out) => {
                prop_assert!(out.len() <= params.max_notes);
                for note in out.iter() {
                    prop_assert!((NOTE_BLOCK_MIDI_MIN..=NOTE_BLOCK_MIDI_MAX).contains(&note.midi()));
                }
                prop_assert!(map_circuit(&out).is_ok());
            }
            Err(err) => prop_assert!(matches!(err, CircuitError::EmptySequence)),
        }
    }
}
