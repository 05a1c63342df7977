//! Melody extraction from a sample buffer.
//!
//! Frames are one tick long with 50% overlap. Each frame gets an RMS level
//! and, when loud and periodic enough, a MIDI pitch. Runs of consecutive
//! frames with the same pitch become notes.

use redstone_spec::timing::{
    frame_start_sample, frame_to_tick, frequency_to_midi, TICKS_PER_SECOND,
};
use redstone_spec::validation::validate_unit_interval;
use redstone_spec::{Note, NoteSequence, SampleBuffer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AudioError, AudioResult};
use crate::pitch::PitchDetector;

/// Tunables for [`NoteExtractor`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Frames with RMS below this are silence.
    pub silence_threshold: f32,
    /// Lowest accepted fundamental, Hz.
    pub min_frequency: f32,
    /// Highest accepted fundamental, Hz.
    pub max_frequency: f32,
    /// Minimum NSDF clarity for a frame to count as voiced.
    pub clarity_threshold: f32,
    /// Runs shorter than this many frames are discarded.
    pub min_note_frames: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            silence_threshold: 0.01,
            min_frequency: 50.0,
            max_frequency: 2000.0,
            clarity_threshold: 0.5,
            min_note_frames: 2,
        }
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> AudioResult<()> {
        let unit = |name: &'static str, v: f32| {
            validate_unit_interval(name, f64::from(v))
                .map_err(|e| AudioError::invalid_param(name, e.to_string()))
        };
        unit("silence_threshold", self.silence_threshold)?;
        unit("clarity_threshold", self.clarity_threshold)?;

        if !(self.min_frequency.is_finite() && self.min_frequency > 0.0) {
            return Err(AudioError::invalid_param("min_frequency", "must be positive"));
        }
        if !(self.max_frequency.is_finite() && self.max_frequency > self.min_frequency) {
            return Err(AudioError::invalid_param(
                "max_frequency",
                "must be greater than min_frequency",
            ));
        }
        if self.min_note_frames == 0 {
            return Err(AudioError::invalid_param("min_note_frames", "must be at least 1"));
        }
        Ok(())
    }
}

/// Per-frame analysis result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAnalysis {
    pub index: usize,
    pub tick: u32,
    pub rms: f32,
    /// `None` for silent or unvoiced frames.
    pub midi: Option<i32>,
}

/// Converts sample buffers into note sequences.
#[derive(Debug, Clone, Default)]
pub struct NoteExtractor {
    config: ExtractorConfig,
}

impl NoteExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Frame length for a buffer's sample rate.
    fn frame_len(buffer: &SampleBuffer) -> usize {
        ((buffer.sample_rate() / TICKS_PER_SECOND) as usize).max(4)
    }

    /// Start offsets of every frame that fits in `len` samples (at least one).
    fn frame_starts(len: usize, frame_len: usize, sample_rate: u32) -> Vec<usize> {
        let mut starts = vec![0];
        loop {
            let next = frame_start_sample(starts.len(), sample_rate);
            if next + frame_len > len || next <= starts[starts.len() - 1] {
                break;
            }
            starts.push(next);
        }
        starts
    }

    /// Analyzes every frame of `buffer`.
    pub fn analyze_frames(&self, buffer: &SampleBuffer) -> AudioResult<Vec<FrameAnalysis>> {
        self.config.validate()?;
        let frame_len = Self::frame_len(buffer);
        let samples = buffer.samples();
        if samples.is_empty() {
            return Ok(Vec::new());
        }
        let starts = Self::frame_starts(samples.len(), frame_len, buffer.sample_rate());

        let mut detector = PitchDetector::new(
            frame_len,
            buffer.sample_rate(),
            self.config.min_frequency,
            self.config.max_frequency,
        );

        let mut frames = Vec::with_capacity(starts.len());
        for (index, &start) in starts.iter().enumerate() {
            let end = (start + frame_len).min(samples.len());
            let frame = &samples[start..end];

            let rms = (frame.iter().map(|s| s * s).sum::<f32>() / frame_len as f32).sqrt();
            let midi = if rms < self.config.silence_threshold {
                None
            } else {
                detector
                    .detect(frame)
                    .filter(|p| p.clarity >= self.config.clarity_threshold)
                    .filter(|p| {
                        p.frequency >= self.config.min_frequency
                            && p.frequency <= self.config.max_frequency
                    })
                    .and_then(|p| frequency_to_midi(f64::from(p.frequency)))
            };

            frames.push(FrameAnalysis {
                index,
                tick: frame_to_tick(index),
                rms,
                midi,
            });
        }
        Ok(frames)
    }

    /// Extracts the melody as a note sequence.
    pub fn extract(&self, buffer: &SampleBuffer) -> AudioResult<NoteSequence> {
        let frames = self.analyze_frames(buffer)?;
        let loudest = frames.iter().map(|f| f.rms).fold(0.0f32, f32::max);
        let voiced = frames.iter().filter(|f| f.midi.is_some()).count();
        debug!(frames = frames.len(), voiced, "analyzed frames");

        if voiced == 0 || loudest <= 0.0 {
            return Err(AudioError::NoMelodyDetected);
        }

        let mut notes = Vec::new();
        let mut run: Option<Run> = None;
        for frame in &frames {
            match (frame.midi, run.as_mut()) {
                (Some(midi), Some(r)) if r.midi == midi => r.extend(frame),
                (Some(midi), _) => {
                    if let Some(done) = run.take() {
                        notes.extend(done.finish(&self.config, loudest));
                    }
                    run = Some(Run::start(midi, frame));
                }
                (None, _) => {
                    if let Some(done) = run.take() {
                        notes.extend(done.finish(&self.config, loudest));
                    }
                }
            }
        }
        if let Some(done) = run.take() {
            notes.extend(done.finish(&self.config, loudest));
        }

        let seq = NoteSequence::from_notes(notes);
        if seq.is_empty() {
            return Err(AudioError::NoMelodyDetected);
        }
        info!(notes = seq.len(), frames = frames.len(), "extracted melody");
        Ok(seq)
    }
}

/// Extracts with the default configuration.
pub fn extract_notes(buffer: &SampleBuffer) -> AudioResult<NoteSequence> {
    NoteExtractor::default().extract(buffer)
}

struct Run {
    midi: i32,
    first_tick: u32,
    last_tick: u32,
    frames: usize,
    rms_sum: f32,
}

impl Run {
    fn start(midi: i32, frame: &FrameAnalysis) -> Self {
        Self {
            midi,
            first_tick: frame.tick,
            last_tick: frame.tick,
            frames: 1,
            rms_sum: frame.rms,
        }
    }

    fn extend(&mut self, frame: &FrameAnalysis) {
        self.last_tick = frame.tick;
        self.frames += 1;
        self.rms_sum += frame.rms;
    }

    fn finish(self, config: &ExtractorConfig, loudest: f32) -> Option<Note> {
        if self.frames < config.min_note_frames {
            return None;
        }
        let velocity = (self.rms_sum / self.frames as f32) / loudest;
        let duration = self.last_tick + 1 - self.first_tick;
        Some(Note::from_midi(self.midi, self.first_tick, duration, velocity))
    }
}
