//! Lane instrument selection.

use redstone_spec::timing::{block_pitch_to_midi, midi_to_frequency};
use redstone_spec::Instrument;
use serde::{Deserialize, Serialize};

/// How lanes are assigned instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentStrategy {
    /// Every lane plays harp.
    #[default]
    Harp,
    /// Lanes pick an instrument by their frequency band.
    Frequency,
}

impl InstrumentStrategy {
    /// Instrument for a lane tuned to note-block `pitch`.
    pub fn select(&self, pitch: u8) -> Instrument {
        match self {
            InstrumentStrategy::Harp => Instrument::Harp,
            InstrumentStrategy::Frequency => by_frequency(midi_to_frequency(block_pitch_to_midi(pitch))),
        }
    }
}

impl std::str::FromStr for InstrumentStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "harp" => Ok(InstrumentStrategy::Harp),
            "frequency" => Ok(InstrumentStrategy::Frequency),
            other => Err(format!("unknown instrument strategy '{}'", other)),
        }
    }
}

fn by_frequency(freq: f64) -> Instrument {
    match freq {
        f if f < 250.0 => Instrument::Bass,
        f if f < 350.0 => Instrument::Guitar,
        f if f < 450.0 => Instrument::Harp,
        f if f < 550.0 => Instrument::Bell,
        f if f < 650.0 => Instrument::Flute,
        _ => Instrument::Pling,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harp_strategy() {
        assert_eq!(InstrumentStrategy::Harp.select(0), Instrument::Harp);
        assert_eq!(InstrumentStrategy::Harp.select(24), Instrument::Harp);
    }

    #[test]
    fn test_frequency_bands() {
        let s = InstrumentStrategy::Frequency;
        // F#3, 185 Hz
        assert_eq!(s.select(0), Instrument::Bass);
        // C4, 261.6 Hz
        assert_eq!(s.select(6), Instrument::Guitar);
        // A4, 440 Hz
        assert_eq!(s.select(15), Instrument::Harp);
        // C5, 523 Hz
        assert_eq!(s.select(18), Instrument::Bell);
        // F#5, 740 Hz
        assert_eq!(s.select(24), Instrument::Pling);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Frequency".parse::<InstrumentStrategy>(), Ok(InstrumentStrategy::Frequency));
        assert!("random".parse::<InstrumentStrategy>().is_err());
    }
}
