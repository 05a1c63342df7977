//! Redstone Music Circuit Backend
//!
//! Turns note sequences into redstone circuits:
//!
//! - [`transform`] - Pitch, octave, speed, density, max-note and auto-tune
//!   transforms over a [`NoteSequence`](redstone_spec::NoteSequence)
//! - [`key`] - Key inference and scale snapping used by auto-tune
//! - [`mapper`] - Layout of note blocks, dust and repeaters with exact
//!   repeater timing
//! - [`instrument`] - Lane instrument selection
//! - [`trace`] - Logical signal tracing for checking a layout's timing
//!
//! # Timing
//!
//! One music tick equals one redstone tick. The delay from the trigger to a
//! note block is the sum of the repeater delays on its path and always equals
//! the note's onset exactly: gaps are covered by 4-tick repeaters with 1-tick
//! repeaters for the remainder.
//!
//! # Example
//!
//! ```
//! use redstone_backend_circuit::{map_circuit, transform};
//! use redstone_spec::{Note, NoteSequence, TransformParameters};
//!
//! let seq = NoteSequence::from_notes(vec![
//!     Note::from_midi(60, 0, 4, 0.8),
//!     Note::from_midi(64, 4, 4, 0.8),
//! ]);
//! let seq = transform(&seq, &TransformParameters::default()).unwrap();
//! let circuit = map_circuit(&seq).unwrap();
//! assert_eq!(circuit.stats.note_blocks, 2);
//! ```

pub mod error;
pub mod instrument;
pub mod key;
pub mod mapper;
pub mod trace;
pub mod transform;

pub use error::{CircuitError, CircuitResult};
pub use instrument::InstrumentStrategy;
pub use key::{infer_key, Key, Mode};
pub use mapper::{map_circuit, CircuitMapper, Lane, MappedCircuit, MapperConfig, Side, Tap};
pub use trace::trace_delays;
pub use transform::transform;
