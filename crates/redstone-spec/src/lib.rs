//! Redstone Music Shared Model
//!
//! This crate holds the types every stage of the audio-to-circuit pipeline
//! agrees on. Backends depend on it; it depends on no backend.
//!
//! # Overview
//!
//! The pipeline compiles an audio recording into a Minecraft redstone machine:
//!
//! - **Samples**: [`SampleBuffer`], mono audio at [`timing::SAMPLE_RATE`]
//! - **Notes**: [`Note`] and [`NoteSequence`], timed in music ticks
//! - **Parameters**: [`TransformParameters`] applied to the extracted sequence
//! - **Layout**: [`CircuitLayout`], a sparse grid of [`BlockCell`]s
//! - **Output**: [`SchematicFile`] metadata for a serialized container
//!
//! # Example
//!
//! ```
//! use redstone_spec::{Note, NoteSequence, TransformParameters, Density};
//!
//! let seq = NoteSequence::from_notes(vec![
//!     Note::from_midi(60, 0, 4, 0.8),
//!     Note::from_midi(64, 4, 4, 0.7),
//! ]);
//! assert_eq!(seq.len(), 2);
//!
//! let params = TransformParameters {
//!     density: Density::High,
//!     max_notes: 10,
//!     ..Default::default()
//! };
//! assert!(params.validate().is_ok());
//! ```
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and the [`BackendError`] trait
//! - [`timing`]: Tick, sample-rate and note-block range constants
//! - [`note`]: Notes and note sequences
//! - [`params`]: Transform parameters and validation
//! - [`layout`]: Block cells and circuit layouts
//! - [`output`]: Schematic formats and generation statistics
//! - [`progress`]: Progress events, reporters and the incremental line parser

pub mod audio;
pub mod error;
pub mod layout;
pub mod note;
pub mod output;
pub mod params;
pub mod progress;
pub mod timing;
pub mod validation;

// Re-export commonly used types at the crate root
pub use audio::SampleBuffer;
pub use error::{BackendError, ErrorKind, ParameterError, PipelineError};
pub use layout::{BlockCell, BlockPos, CircuitLayout, CircuitStats, Dimensions, Direction, Instrument};
pub use note::{Note, NoteSequence};
pub use output::{SchematicFile, SchematicFormat};
pub use params::{Density, TransformParameters};
pub use progress::{
    Cancelled, GenerationStats, NoopReporter, ProgressEvent, ProgressLineParser,
    ProgressParseError, ProgressReporter, Projection,
};
