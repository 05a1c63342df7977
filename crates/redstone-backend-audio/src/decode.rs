//! Container decoding to a mono sample buffer.
//!
//! Symphonia probes the container (MP3, WAV, OGG/Vorbis, M4A/AAC, FLAC),
//! decodes the first audio track, down-mixes to mono and hands the result
//! to rubato when the source rate differs from the internal rate.

use std::io::Cursor;

use redstone_spec::timing::SAMPLE_RATE;
use redstone_spec::SampleBuffer;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::SampleBuffer as PacketBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::{AudioError, AudioResult};

/// Decodes audio containers into [`SampleBuffer`]s at a fixed rate.
#[derive(Debug, Clone, Copy)]
pub struct WaveformDecoder {
    target_rate: u32,
}

impl Default for WaveformDecoder {
    fn default() -> Self {
        Self {
            target_rate: SAMPLE_RATE,
        }
    }
}

impl WaveformDecoder {
    /// Creates a decoder targeting the internal sample rate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decoder targeting an explicit sample rate.
    pub fn with_target_rate(target_rate: u32) -> Self {
        Self { target_rate }
    }

    /// Decodes `bytes` into a mono buffer.
    ///
    /// `hint` is a file extension ("mp3", ".wav") or a MIME type
    /// ("audio/mpeg"); without it the container is sniffed.
    pub fn decode(&self, bytes: &[u8], hint: Option<&str>) -> AudioResult<SampleBuffer> {
        if bytes.is_empty() {
            return Err(AudioError::EmptyAudio);
        }
        if self.target_rate == 0 {
            return Err(AudioError::invalid_param("target_rate", "must be positive"));
        }

        let (mono, source_rate) = decode_mono(bytes, hint)?;
        if mono.is_empty() {
            return Err(AudioError::EmptyAudio);
        }

        let samples = resample(&mono, source_rate, self.target_rate)?;
        if samples.is_empty() {
            return Err(AudioError::EmptyAudio);
        }

        debug!(
            source_rate,
            target_rate = self.target_rate,
            samples = samples.len(),
            "decoded audio"
        );
        Ok(SampleBuffer::with_rate(samples, self.target_rate))
    }
}

/// Decodes with the default decoder.
pub fn decode(bytes: &[u8], hint: Option<&str>) -> AudioResult<SampleBuffer> {
    WaveformDecoder::default().decode(bytes, hint)
}

fn build_hint(hint: Option<&str>) -> Hint {
    let mut h = Hint::new();
    if let Some(raw) = hint.map(str::trim).filter(|s| !s.is_empty()) {
        if raw.contains('/') {
            h.mime_type(raw);
        } else {
            let ext = raw.trim_start_matches('.').to_ascii_lowercase();
            h.with_extension(&ext);
        }
    }
    h
}

fn decode_mono(bytes: &[u8], hint: Option<&str>) -> AudioResult<(Vec<f32>, u32)> {
    let source = Cursor::new(bytes.to_vec());
    let stream = MediaSourceStream::new(Box::new(source), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &build_hint(hint),
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::unsupported(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::unsupported("no decodable audio track"))?;
    let track_id = track.id;
    let mut source_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::unsupported(e.to_string()))?;

    let mut mono = Vec::new();
    let mut bad_packets = 0usize;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::decode(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                source_rate.get_or_insert(spec.rate);
                let channels = spec.channels.count().max(1);
                let mut buf = PacketBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                mono.extend(
                    buf.samples()
                        .chunks(channels)
                        .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                );
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                bad_packets += 1;
                warn!(error = msg, "skipping corrupt audio packet");
            }
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(AudioError::decode(e.to_string())),
        }
    }

    if mono.is_empty() && bad_packets > 0 {
        return Err(AudioError::decode(format!(
            "all {} packets failed to decode",
            bad_packets
        )));
    }

    let rate = source_rate.ok_or_else(|| AudioError::unsupported("unknown sample rate"))?;
    Ok((mono, rate))
}

/// Converts `samples` from `from_rate` to `to_rate`.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> AudioResult<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(to_rate) / f64::from(from_rate),
        2.0,
        params,
        samples.len(),
        1,
    )
    .map_err(|e| AudioError::Resample {
        message: e.to_string(),
    })?;

    let output = resampler
        .process(&[samples], None)
        .map_err(|e| AudioError::Resample {
            message: e.to_string(),
        })?;

    Ok(output.into_iter().flatten().collect())
}
