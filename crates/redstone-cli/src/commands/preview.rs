//! Preview command implementation
//!
//! Renders the transformed note sequence as a WAV file so the result can be
//! heard before building the machine.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use super::json_output::{error_codes, print_json, JsonError, PreviewOutput, PreviewResult};
use super::{describe_params, AudioFile, ConfigSource};
use crate::pipeline::{AudioInput, Pipeline};
use crate::reporter::ConsoleReporter;

/// Options for `redstone preview`.
#[derive(Debug, Clone, Default)]
pub struct PreviewOptions {
    pub input: PathBuf,
    /// WAV file to write.
    pub output: PathBuf,
    pub source: ConfigSource,
    pub json: bool,
}

/// Run the preview command
///
/// # Returns
/// Exit code: 0 success, 1 input or config error, 2 pipeline error
pub fn run(options: &PreviewOptions) -> Result<ExitCode> {
    let (output, code) = preview(options);
    if options.json {
        print_json(&output)?;
        return Ok(ExitCode::from(code));
    }

    match (&output.result, output.errors.first()) {
        (Some(result), _) => {
            println!("{} {}", "Preview:".cyan().bold(), result.path);
            println!(
                "  {} {} notes, {:.1}s at {} Hz",
                "Rendered".green(),
                result.notes,
                result.duration,
                result.sample_rate
            );
        }
        (None, Some(error)) => {
            eprintln!("{} [{}] {}", "FAILED".red().bold(), error.code, error.message);
        }
        (None, None) => {}
    }
    Ok(ExitCode::from(code))
}

fn preview(options: &PreviewOptions) -> (PreviewOutput, u8) {
    let setup = options
        .source
        .load()
        .and_then(|config| Ok((config, AudioFile::read(&options.input)?)));
    let (config, audio) = match setup {
        Ok(loaded) => loaded,
        Err(e) => return (PreviewOutput::failure(e.to_json_errors()), 1),
    };

    let reporter = if options.json {
        ConsoleReporter::quiet()
    } else {
        eprintln!("{} {}", "Parameters:".dimmed(), describe_params(&config.transform));
        ConsoleReporter::new()
    };

    let previewed = Pipeline::new(&config).and_then(|pipeline| {
        let input = AudioInput::new(&audio.bytes, audio.hint.as_deref());
        pipeline.preview(input, &config.transform, &reporter)
    });
    let previewed = match previewed {
        Ok(p) => p,
        Err(e) => return (PreviewOutput::failure(vec![JsonError::from_pipeline(&e)]), 2),
    };

    if let Err(e) = write_wav(&options.output, &previewed.wav) {
        let error = JsonError::new(error_codes::FILE_WRITE, format!("{:#}", e))
            .with_file(options.output.display().to_string());
        return (PreviewOutput::failure(vec![error]), 1);
    }

    let result = PreviewResult {
        path: options.output.display().to_string(),
        notes: previewed.sequence.len(),
        duration: previewed.duration_seconds,
        sample_rate: previewed.sample_rate,
    };
    (PreviewOutput::success(result), 0)
}

fn write_wav(path: &std::path::Path, wav: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, wav).with_context(|| format!("Failed to write {}", path.display()))
}
