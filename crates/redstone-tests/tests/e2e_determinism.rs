//! End-to-End Determinism Tests for Redstone Music
//!
//! Same audio, parameters and timestamp must give byte-identical schematics.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p redstone-tests --test e2e_determinism
//! ```

use redstone_cli::pipeline::AudioInput;
use redstone_cli::{Pipeline, RedstoneConfig};
use redstone_spec::{NoopReporter, SchematicFormat, TransformParameters};
use redstone_tests::{c_major_arpeggio, compute_hash, verify_determinism, ToneWav};

fn generate_file(wav: &[u8], params: &TransformParameters, format: SchematicFormat) -> Vec<u8> {
    let mut config = RedstoneConfig::default();
    config.output.formats = vec![format];
    let generated = Pipeline::new(&config)
        .unwrap()
        .with_timestamp(1_700_000_000_000)
        .generate(AudioInput::new(wav, Some("wav")), "determinism", params, &NoopReporter)
        .unwrap();
    generated.files.into_iter().next().unwrap().bytes
}

#[test]
fn test_litematic_determinism() {
    let wav = c_major_arpeggio();
    verify_determinism(
        || generate_file(&wav, &TransformParameters::default(), SchematicFormat::Litematic),
        3,
    )
    .assert_deterministic();
}

#[test]
fn test_schematic_determinism() {
    let wav = c_major_arpeggio();
    verify_determinism(
        || generate_file(&wav, &TransformParameters::default(), SchematicFormat::Schematic),
        3,
    )
    .assert_deterministic();
}

#[test]
fn test_auto_tune_determinism() {
    let wav = ToneWav::new()
        .tone(261.63, 0.3)
        .tone(277.18, 0.3)
        .tone(311.13, 0.3)
        .tone(349.23, 0.3)
        .build();
    let params = TransformParameters {
        auto_tune: true,
        ..Default::default()
    };
    verify_determinism(|| generate_file(&wav, &params, SchematicFormat::Litematic), 3)
        .assert_deterministic();
}

#[test]
fn test_reported_hash_matches_bytes() {
    let wav = c_major_arpeggio();
    let generated = Pipeline::new(&RedstoneConfig::default())
        .unwrap()
        .with_timestamp(0)
        .generate(
            AudioInput::new(&wav, Some("wav")),
            "hashes",
            &TransformParameters::default(),
            &NoopReporter,
        )
        .unwrap();
    for file in &generated.files {
        assert_eq!(file.hash, compute_hash(&file.bytes));
    }
}

#[test]
fn test_different_parameters_change_output() {
    let wav = c_major_arpeggio();
    let plain = generate_file(&wav, &TransformParameters::default(), SchematicFormat::Litematic);
    let shifted = generate_file(
        &wav,
        &TransformParameters {
            pitch_shift: 1,
            ..Default::default()
        },
        SchematicFormat::Litematic,
    );
    assert_ne!(compute_hash(&plain), compute_hash(&shifted));
}
