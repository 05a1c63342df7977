//! Timing and range constants.
//!
//! One music tick is one redstone tick: 2 game ticks, 100 ms. Every time value
//! past the decoder is expressed in these ticks.

/// Internal sample rate after decode, in Hz.
pub const SAMPLE_RATE: u32 = 22_050;

/// Redstone ticks per second.
pub const TICKS_PER_SECOND: u32 = 10;

/// Game ticks per redstone tick.
pub const GAME_TICKS_PER_REDSTONE_TICK: u32 = 2;

/// Samples covered by one music tick.
pub const SAMPLES_PER_TICK: usize = (SAMPLE_RATE / TICKS_PER_SECOND) as usize;

/// Blocks a dust line carries a full-strength signal before it dies out.
pub const MAX_DUST_RUN: u32 = 15;

/// Shortest repeater delay, in redstone ticks.
pub const MIN_REPEATER_DELAY: u8 = 1;

/// Longest repeater delay, in redstone ticks.
pub const MAX_REPEATER_DELAY: u8 = 4;

/// MIDI number of note-block pitch 0 (F#3).
pub const NOTE_BLOCK_MIDI_MIN: i32 = 54;

/// MIDI number of note-block pitch 24 (F#5).
pub const NOTE_BLOCK_MIDI_MAX: i32 = 78;

/// Number of distinct note-block pitches.
pub const NOTE_BLOCK_PITCHES: u8 = 25;

/// Default cap on repeaters along a single lane's trigger path.
pub const DEFAULT_MAX_REPEATERS_PER_LANE: u32 = 4096;

/// Reference tuning for A4.
pub const A4_FREQUENCY: f64 = 440.0;

/// Converts a tick count to seconds.
pub fn ticks_to_seconds(ticks: u32) -> f64 {
    f64::from(ticks) / f64::from(TICKS_PER_SECOND)
}

/// Converts a sample offset to the tick that contains it.
pub fn sample_to_tick(sample: usize) -> u32 {
    (sample / SAMPLES_PER_TICK) as u32
}

/// First sample of analysis frame `frame` at `sample_rate`.
///
/// Frames start on half-tick boundaries (50% overlap). The start is computed
/// from the frame index directly so an odd per-tick sample count never
/// accumulates into drift.
pub fn frame_start_sample(frame: usize, sample_rate: u32) -> usize {
    let half_ticks_per_second = u64::from(TICKS_PER_SECOND) * 2;
    (frame as u64 * u64::from(sample_rate) / half_ticks_per_second) as usize
}

/// Tick an analysis frame is attributed to.
///
/// Frame `k` starts on half-tick `k`; the nearest tick boundary wins,
/// rounding up.
pub fn frame_to_tick(frame: usize) -> u32 {
    ((frame + 1) / 2) as u32
}

/// Clamps a MIDI number into the playable note-block range.
pub fn clamp_midi(midi: i32) -> i32 {
    midi.clamp(NOTE_BLOCK_MIDI_MIN, NOTE_BLOCK_MIDI_MAX)
}

/// Returns the note-block pitch (0..=24) for a MIDI number, if playable.
pub fn midi_to_block_pitch(midi: i32) -> Option<u8> {
    if (NOTE_BLOCK_MIDI_MIN..=NOTE_BLOCK_MIDI_MAX).contains(&midi) {
        Some((midi - NOTE_BLOCK_MIDI_MIN) as u8)
    } else {
        None
    }
}

/// Returns the MIDI number for a note-block pitch.
pub fn block_pitch_to_midi(pitch: u8) -> i32 {
    NOTE_BLOCK_MIDI_MIN + i32::from(pitch)
}

/// Equal-tempered frequency of a MIDI number.
pub fn midi_to_frequency(midi: i32) -> f64 {
    A4_FREQUENCY * 2f64.powf(f64::from(midi - 69) / 12.0)
}

/// Nearest MIDI number for a frequency, or `None` for non-positive input.
pub fn frequency_to_midi(freq: f64) -> Option<i32> {
    if !(freq.is_finite() && freq > 0.0) {
        return None;
    }
    Some((69.0 + 12.0 * (freq / A4_FREQUENCY).log2()).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_per_tick() {
        assert_eq!(SAMPLES_PER_TICK, 2205);
    }

    #[test]
    fn test_frame_start_has_no_drift() {
        assert_eq!(frame_start_sample(0, SAMPLE_RATE), 0);
        assert_eq!(frame_start_sample(1, SAMPLE_RATE), 1102);
        assert_eq!(frame_start_sample(2, SAMPLE_RATE), 2205);
        assert_eq!(frame_start_sample(3, SAMPLE_RATE), 3307);
        // 240 s in: the frame on tick 2400 starts exactly on that tick's first sample.
        assert_eq!(frame_start_sample(4800, SAMPLE_RATE), 2400 * SAMPLES_PER_TICK);
        assert_eq!(sample_to_tick(frame_start_sample(4800, SAMPLE_RATE)), 2400);
        assert_eq!(frame_to_tick(4800), 2400);
        assert_eq!(frame_start_sample(20, 44_100), 44_100);
    }

    #[test]
    fn test_frame_to_tick() {
        assert_eq!(frame_to_tick(0), 0);
        assert_eq!(frame_to_tick(1), 1);
        assert_eq!(frame_to_tick(2), 1);
        assert_eq!(frame_to_tick(3), 2);
        assert_eq!(frame_to_tick(7), 4);
    }

    #[test]
    fn test_block_pitch_range() {
        assert_eq!(midi_to_block_pitch(54), Some(0));
        assert_eq!(midi_to_block_pitch(60), Some(6));
        assert_eq!(midi_to_block_pitch(78), Some(24));
        assert_eq!(midi_to_block_pitch(53), None);
        assert_eq!(midi_to_block_pitch(79), None);
        assert_eq!(block_pitch_to_midi(24), 78);
    }

    #[test]
    fn test_frequency_conversion() {
        assert_eq!(frequency_to_midi(440.0), Some(69));
        assert_eq!(frequency_to_midi(261.63), Some(60));
        assert_eq!(frequency_to_midi(0.0), None);
        assert_eq!(frequency_to_midi(f64::NAN), None);
        assert!((midi_to_frequency(69) - 440.0).abs() < 1e-9);
        assert!((midi_to_frequency(54) - 185.0).abs() < 0.01);
    }

    #[test]
    fn test_ticks_to_seconds() {
        assert_eq!(ticks_to_seconds(12), 1.2);
        assert_eq!(sample_to_tick(2204), 0);
        assert_eq!(sample_to_tick(2205), 1);
    }
}
