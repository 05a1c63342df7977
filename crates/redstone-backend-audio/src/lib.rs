//! Redstone Music Audio Backend
//!
//! This crate turns audio recordings into note sequences:
//!
//! - [`decode`] - Container decoding (symphonia) and resampling (rubato) to a
//!   mono [`SampleBuffer`](redstone_spec::SampleBuffer)
//! - [`extract`] - Frame analysis and melody extraction to a
//!   [`NoteSequence`](redstone_spec::NoteSequence)
//! - [`pitch`] - NSDF fundamental frequency estimation
//! - [`synth`] - Preview re-synthesis of a sequence
//! - [`wav`] - Deterministic 16-bit WAV encoding
//!
//! # Example
//!
//! ```ignore
//! use redstone_backend_audio::{decode, extract_notes};
//!
//! let bytes = std::fs::read("song.mp3")?;
//! let buffer = decode(&bytes, Some("mp3"))?;
//! let notes = extract_notes(&buffer)?;
//! println!("{} notes", notes.len());
//! ```
//!
//! All analysis is CPU-bound and free of I/O; callers running inside an async
//! runtime should move it to a blocking worker.

pub mod decode;
pub mod error;
pub mod extract;
pub mod pitch;
pub mod synth;
pub mod wav;

pub use decode::{decode, resample, WaveformDecoder};
pub use error::{AudioError, AudioResult};
pub use extract::{extract_notes, ExtractorConfig, FrameAnalysis, NoteExtractor};
pub use pitch::{PitchDetector, PitchEstimate};
pub use synth::{render_preview, render_preview_wav};
pub use wav::encode_wav;
