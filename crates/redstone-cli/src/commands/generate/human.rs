//! Human-readable (colored) output mode for the generate command.

use anyhow::{Context, Result};
use colored::Colorize;
use std::process::ExitCode;
use std::time::Instant;

use super::{prepare, write_outputs, GenerateOptions};
use crate::commands::describe_params;
use crate::pipeline::{AudioInput, Pipeline};
use crate::reporter::ConsoleReporter;

/// Run generate with human-readable (colored) output.
pub fn run_human(options: &GenerateOptions) -> Result<ExitCode> {
    let start = Instant::now();

    println!("{} {}", "Generating from:".cyan().bold(), options.input.display());
    println!("{} {}", "Output dir:".cyan().bold(), options.out_dir.display());

    let job = match prepare(options) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            return Ok(ExitCode::from(1));
        }
    };
    println!("{} {}", "Name:".dimmed(), job.name);
    println!("{} {}", "Parameters:".dimmed(), describe_params(&job.params));

    let pipeline = Pipeline::new(&job.config).context("Failed to build pipeline")?;
    let input = AudioInput::new(&job.audio.bytes, job.audio.hint.as_deref());
    let generated = match pipeline.generate(input, &job.name, &job.params, &ConsoleReporter::new()) {
        Ok(generated) => generated,
        Err(e) => {
            println!("\n{} [{}] {}", "FAILED".red().bold(), e.code, e.client_message());
            return Ok(ExitCode::from(2));
        }
    };

    let paths = write_outputs(&options.out_dir, &generated.files).with_context(|| {
        format!("Failed to write outputs to {}", options.out_dir.display())
    })?;

    let stats = generated.stats();
    let projection = generated.projection();
    println!("\n{}", "Generated:".green().bold());
    println!("  {} {}", "Notes:".dimmed(), stats.notes);
    println!("  {} {:.1}s", "Duration:".dimmed(), stats.duration);
    println!("  {} {} blocks", "Trigger line:".dimmed(), stats.redstone_length);
    println!("  {} {}", "Dimensions:".dimmed(), projection.dimensions);
    println!(
        "  {} {} note blocks, {} dust, {} repeaters",
        "Components:".dimmed(),
        projection.note_blocks,
        projection.redstone_dust,
        projection.repeaters
    );
    for (path, file) in paths.iter().zip(&generated.files) {
        println!(
            "  {} {} ({} bytes)",
            "Wrote".green(),
            path.display(),
            file.byte_size
        );
    }
    println!(
        "\n{} in {}ms",
        "SUCCESS".green().bold(),
        start.elapsed().as_millis()
    );

    Ok(ExitCode::SUCCESS)
}
