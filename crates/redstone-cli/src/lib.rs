//! Redstone Music CLI library.
//!
//! This crate provides the orchestration shared by the `redstone` binary and
//! the HTTP service: configuration loading, the five-stage pipeline with
//! progress reporting, the on-disk result store and the command
//! implementations.

pub mod commands;
pub mod config;
pub mod logging;
pub mod pipeline;
pub mod reporter;
pub mod store;

pub use config::{LongAudioPolicy, Preset, RedstoneConfig};
pub use pipeline::{Analysis, Generated, Pipeline, Previewed};
pub use reporter::ConsoleReporter;
pub use store::{EntryMetadata, ResultStore, StoreError};
