//! Synthetic audio fixtures.

use std::io::Cursor;

use redstone_spec::timing::SAMPLE_RATE;

/// Builds a 16-bit mono WAV from a sequence of sine tones.
///
/// ```rust,ignore
/// let wav = ToneWav::new()
///     .tone(261.63, 0.4)
///     .rest(0.2)
///     .tone(392.0, 0.4)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ToneWav {
    sample_rate: u32,
    amplitude: f32,
    samples: Vec<f32>,
}

impl Default for ToneWav {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneWav {
    pub fn new() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            amplitude: 0.6,
            samples: Vec::new(),
        }
    }

    /// Sets the sample rate. Call before adding tones.
    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Appends a sine at `freq` Hz.
    pub fn tone(mut self, freq: f32, seconds: f32) -> Self {
        let rate = self.sample_rate as f32;
        let n = (rate * seconds).round() as usize;
        let amplitude = self.amplitude;
        self.samples.extend(
            (0..n).map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / rate).sin()),
        );
        self
    }

    /// Appends a sine at the equal-tempered frequency of `midi`.
    pub fn midi(self, midi: i32, seconds: f32) -> Self {
        let freq = 440.0 * 2f32.powf((midi - 69) as f32 / 12.0);
        self.tone(freq, seconds)
    }

    /// Appends silence.
    pub fn rest(mut self, seconds: f32) -> Self {
        let n = (self.sample_rate as f32 * seconds).round() as usize;
        self.samples.extend(std::iter::repeat(0.0).take(n));
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Encodes the samples as WAV bytes.
    pub fn build(&self) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer =
                hound::WavWriter::new(&mut cursor, spec).expect("Failed to create WAV writer");
            for &s in &self.samples {
                let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer.write_sample(v).expect("Failed to write sample");
            }
            writer.finalize().expect("Failed to finalize WAV");
        }
        cursor.into_inner()
    }
}

/// C4, E4, G4 for 0.4 s each.
pub fn c_major_arpeggio() -> Vec<u8> {
    ToneWav::new()
        .tone(261.63, 0.4)
        .tone(329.63, 0.4)
        .tone(392.0, 0.4)
        .build()
}

/// `seconds` of digital silence.
pub fn silence(seconds: f32) -> Vec<u8> {
    ToneWav::new().rest(seconds).build()
}
