//! Property-based tests for the sequence transform and schematic output.
//!
//! These tests verify the laws every transformed sequence obeys for
//! arbitrary input and the full parameter space, and that generated
//! circuits survive a trip through both containers.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p redstone-tests --test proptest_transform
//! ```

use proptest::prelude::*;

use redstone_backend_circuit::transform::shift_pitch;
use redstone_backend_circuit::{map_circuit, transform};
use redstone_backend_schematic::{read, serialize, SerializeOptions};
use redstone_spec::timing::{NOTE_BLOCK_MIDI_MAX, NOTE_BLOCK_MIDI_MIN};
use redstone_spec::{Density, Note, NoteSequence, SchematicFormat, TransformParameters};

// ============================================================================
// Strategies
// ============================================================================

fn any_density() -> impl Strategy<Value = Density> {
    prop_oneof![Just(Density::Low), Just(Density::Medium), Just(Density::High)]
}

/// Non-empty note lists with any pitch and colliding onsets.
fn raw_sequence() -> impl Strategy<Value = NoteSequence> {
    prop::collection::vec((0i32..128, 0u32..300, 1u32..20, 0.0f32..1.0), 1..80).prop_map(|raw| {
        NoteSequence::from_notes(
            raw.into_iter()
                .map(|(midi, onset, dur, vel)| Note::from_midi(midi, onset, dur, vel))
                .collect(),
        )
    })
}

/// In-range notes with strictly increasing onsets.
fn playable_sequence() -> impl Strategy<Value = NoteSequence> {
    prop::collection::vec((NOTE_BLOCK_MIDI_MIN..=NOTE_BLOCK_MIDI_MAX, 1u32..12), 1..30).prop_map(
        |raw| {
            let mut onset = 0;
            let notes = raw
                .into_iter()
                .map(|(midi, gap)| {
                    let note = Note::from_midi(midi, onset, gap, 0.8);
                    onset += gap;
                    note
                })
                .collect();
            NoteSequence::from_notes(notes)
        },
    )
}

fn any_params() -> impl Strategy<Value = TransformParameters> {
    (
        -12i32..=12,
        -2i32..=2,
        0.1f64..8.0,
        any_density(),
        1usize..200,
        any::<bool>(),
    )
        .prop_map(
            |(pitch_shift, octave_shift, speed_factor, density, max_notes, auto_tune)| {
                TransformParameters {
                    pitch_shift,
                    octave_shift,
                    speed_factor,
                    density,
                    max_notes,
                    auto_tune,
                }
            },
        )
}

// ============================================================================
// Transform laws
// ============================================================================

proptest! {
    /// Output never exceeds max_notes and stays inside the note-block range.
    #[test]
    fn output_is_bounded(seq in raw_sequence(), params in any_params()) {
        let out = transform(&seq, &params).unwrap();
        prop_assert!(!out.is_empty());
        prop_assert!(out.len() <= params.max_notes);
        for note in out.iter() {
            prop_assert!(
                (NOTE_BLOCK_MIDI_MIN..=NOTE_BLOCK_MIDI_MAX).contains(&note.midi()),
                "pitch {} out of range", note.midi()
            );
            prop_assert!(note.duration_ticks >= 1);
        }
    }

    /// Onsets are strictly increasing after every transform.
    #[test]
    fn onsets_strictly_increase(seq in raw_sequence(), params in any_params()) {
        let out = transform(&seq, &params).unwrap();
        let onsets = out.onsets();
        prop_assert!(onsets.windows(2).all(|w| w[0] < w[1]), "{:?}", onsets);
    }

    /// Default parameters leave a playable sequence untouched.
    #[test]
    fn defaults_are_identity(seq in playable_sequence()) {
        let out = transform(&seq, &TransformParameters::default()).unwrap();
        prop_assert_eq!(out, seq);
    }

    /// Lower densities never keep more notes.
    #[test]
    fn density_is_monotonic(seq in raw_sequence()) {
        let count = |density| {
            let params = TransformParameters {
                density,
                max_notes: 10_000,
                ..Default::default()
            };
            transform(&seq, &params).unwrap().len()
        };
        let (low, medium, high) = (count(Density::Low), count(Density::Medium), count(Density::High));
        prop_assert!(low <= medium && medium <= high, "{} {} {}", low, medium, high);
    }

    /// Shifting up then down restores every note that was not clamped.
    #[test]
    fn pitch_shift_round_trips(seq in playable_sequence(), shift in -12i32..=12) {
        for note in seq.iter() {
            let back = shift_pitch(&shift_pitch(note, shift), -shift);
            let target = note.midi() + shift;
            if (NOTE_BLOCK_MIDI_MIN..=NOTE_BLOCK_MIDI_MAX).contains(&target) {
                prop_assert_eq!(back, *note);
            } else {
                prop_assert!((NOTE_BLOCK_MIDI_MIN..=NOTE_BLOCK_MIDI_MAX).contains(&back.midi()));
            }
        }
    }

    /// MIDI numbers survive the pitch-class/octave split.
    #[test]
    fn midi_round_trips(midi in 0i32..128, onset in 0u32..1000) {
        let note = Note::from_midi(midi, onset, 1, 0.5);
        prop_assert_eq!(note.midi(), midi);
        prop_assert!(note.pitch_class < 12);
        prop_assert_eq!(note.with_midi(midi), note);
    }
}

// ============================================================================
// Containers
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Both containers decode to the mapped note blocks and pitches.
    #[test]
    fn containers_keep_note_blocks(seq in playable_sequence()) {
        let mapped = map_circuit(&seq).unwrap();
        let mut expected: Vec<u8> = mapped.layout.note_blocks().into_iter().map(|(_, p, _)| p).collect();
        expected.sort_unstable();

        for format in SchematicFormat::ALL {
            let file = serialize(&mapped.layout, format, &SerializeOptions::named("prop")).unwrap();
            let decoded = read(&file.bytes).unwrap();
            prop_assert_eq!(decoded.cell_count(), mapped.layout.cell_count());

            let mut pitches: Vec<u8> = decoded.to_layout().note_blocks().into_iter().map(|(_, p, _)| p).collect();
            pitches.sort_unstable();
            prop_assert_eq!(&pitches, &expected);
        }
    }
}
