//! Redstone Music End-to-End Test Infrastructure
//!
//! This crate provides integration tests across the whole pipeline:
//!
//! - Generation: audio bytes -> schematic files -> decoded block counts
//! - **Determinism**: identical input and parameters give byte-identical files
//! - Transform laws under arbitrary sequences (proptest)
//! - Result store and HTTP service
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p redstone-tests
//! ```

pub mod determinism;
pub mod fixtures;

pub use determinism::{compute_hash, verify_determinism, DeterminismResult};
pub use fixtures::{c_major_arpeggio, silence, ToneWav};
