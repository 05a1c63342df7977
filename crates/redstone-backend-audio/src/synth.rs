//! Preview re-synthesis.
//!
//! Renders a note sequence roughly the way the machine will sound: each note
//! is a plucked sine that rings out regardless of its written duration, the
//! way a note block does.

use redstone_spec::timing::{midi_to_frequency, TICKS_PER_SECOND};
use redstone_spec::NoteSequence;

use crate::error::AudioResult;
use crate::wav::encode_wav;

/// Seconds a note keeps ringing after its onset.
const RING_SECONDS: f32 = 0.8;
/// Attack ramp length in seconds.
const ATTACK_SECONDS: f32 = 0.005;
/// Exponential decay rate per second.
const DECAY_RATE: f32 = 5.0;
/// Peak level after normalization.
const PEAK: f32 = 0.9;

/// Renders `seq` to mono samples at `sample_rate`.
pub fn render_preview(seq: &NoteSequence, sample_rate: u32) -> Vec<f32> {
    if seq.is_empty() || sample_rate == 0 {
        return Vec::new();
    }
    let rate = sample_rate as f32;
    let samples_per_tick = rate / TICKS_PER_SECOND as f32;
    let ring = (RING_SECONDS * rate).round() as usize;
    let attack = (ATTACK_SECONDS * rate).max(1.0);

    let total = (seq.duration_ticks() as f32 * samples_per_tick).round() as usize + ring;
    let mut out = vec![0.0f32; total];

    for note in seq {
        let start = (note.onset_ticks as f32 * samples_per_tick).round() as usize;
        let freq = midi_to_frequency(note.midi()) as f32;
        let step = 2.0 * std::f32::consts::PI * freq / rate;
        for (i, slot) in out.iter_mut().skip(start).take(ring).enumerate() {
            let t = i as f32;
            let env = (t / attack).min(1.0) * (-DECAY_RATE * t / rate).exp();
            let tone = (step * t).sin() + 0.3 * (2.0 * step * t).sin();
            *slot += note.velocity * env * tone;
        }
    }

    let peak = out.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 0.0 {
        let gain = PEAK / peak;
        out.iter_mut().for_each(|s| *s *= gain);
    }
    out
}

/// Renders `seq` as a WAV file.
pub fn render_preview_wav(seq: &NoteSequence, sample_rate: u32) -> AudioResult<Vec<u8>> {
    encode_wav(&render_preview(seq, sample_rate), sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use redstone_spec::Note;

    fn melody() -> NoteSequence {
        NoteSequence::from_notes(vec![
            Note::from_midi(60, 0, 4, 1.0),
            Note::from_midi(64, 4, 4, 0.5),
            Note::from_midi(67, 8, 4, 0.8),
        ])
    }

    #[test]
    fn test_length_covers_ring_out() {
        let samples = render_preview(&melody(), 22_050);
        assert_eq!(samples.len(), 12 * 2205 + 17_640);
    }

    #[test]
    fn test_normalized_peak() {
        let samples = render_preview(&melody(), 22_050);
        let peak = samples.iter().fold(0.0f32, |a, s| a.max(s.abs()));
        assert!((peak - 0.9).abs() < 1e-4);
    }

    #[test]
    fn test_empty_sequence() {
        assert!(render_preview(&NoteSequence::new(), 22_050).is_empty());
    }

    #[test]
    fn test_wav_is_deterministic() {
        let a = render_preview_wav(&melody(), 22_050).unwrap();
        let b = render_preview_wav(&melody(), 22_050).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[0..4], b"RIFF");
    }
}
