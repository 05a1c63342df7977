//! 16-bit mono WAV encoding.
//!
//! Output carries no timestamps or extra chunks, so equal samples always
//! encode to equal bytes.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::AudioResult;

/// WAV parameters for mono 16-bit PCM at `sample_rate`.
pub fn mono_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Converts a sample in [-1, 1] to 16-bit PCM, clipping out-of-range values.
pub fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

/// Encodes mono samples as a complete WAV file.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> AudioResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, mono_spec(sample_rate))?;
        for &s in samples {
            writer.write_sample(to_pcm16(s))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_size() {
        let bytes = encode_wav(&[0.0, 0.5, -0.5, 1.0], 22_050).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(bytes.len(), 44 + 8);
    }

    #[test]
    fn test_pcm_clipping() {
        assert_eq!(to_pcm16(2.0), 32767);
        assert_eq!(to_pcm16(-2.0), -32767);
        assert_eq!(to_pcm16(0.0), 0);
    }

    #[test]
    fn test_deterministic() {
        let samples: Vec<f32> = (0..100).map(|i| (i as f32 * 0.1).sin()).collect();
        assert_eq!(encode_wav(&samples, 22_050).unwrap(), encode_wav(&samples, 22_050).unwrap());
    }
}
