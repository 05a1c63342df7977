//! Inspect command implementation
//!
//! Reads a `.litematic` or `.schematic` file back and summarizes what it
//! contains.

use anyhow::Result;
use colored::Colorize;
use redstone_backend_schematic::DecodedSchematic;
use redstone_spec::BlockCell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::json_output::{error_codes, print_json, InspectOutput, InspectResult, JsonError};

/// Options for `redstone inspect`.
#[derive(Debug, Clone, Default)]
pub struct InspectOptions {
    pub path: PathBuf,
    pub json: bool,
}

/// Run the inspect command
///
/// # Returns
/// Exit code: 0 success, 1 unreadable file
pub fn run(options: &InspectOptions) -> Result<ExitCode> {
    let output = inspect(&options.path);
    let code = if output.success { 0 } else { 1 };

    if options.json {
        print_json(&output)?;
        return Ok(ExitCode::from(code));
    }

    match (&output.result, output.errors.first()) {
        (Some(result), _) => print_human(result),
        (None, Some(error)) => {
            eprintln!("{} [{}] {}", "error:".red().bold(), error.code, error.message)
        }
        (None, None) => {}
    }
    Ok(ExitCode::from(code))
}

/// Reads and summarizes a schematic file.
pub fn inspect(path: &Path) -> InspectOutput {
    let file = path.display().to_string();
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            let error = JsonError::new(error_codes::FILE_READ, e.to_string()).with_file(file);
            return InspectOutput::failure(vec![error]);
        }
    };

    match redstone_backend_schematic::read(&bytes) {
        Ok(decoded) => InspectOutput::success(summarize(file, &decoded)),
        Err(e) => {
            let error = JsonError::new(error_codes::SCHEMATIC_READ, e.to_string()).with_file(file);
            InspectOutput::failure(vec![error])
        }
    }
}

fn summarize(path: String, decoded: &DecodedSchematic) -> InspectResult {
    let pitches: BTreeSet<u8> = decoded
        .cells
        .values()
        .filter_map(|cell| match cell {
            BlockCell::NoteBlock { pitch, .. } => Some(*pitch),
            _ => None,
        })
        .collect();

    InspectResult {
        path,
        format: decoded.format,
        name: decoded.name.clone(),
        dimensions: decoded.dimensions,
        blocks: decoded.cell_count(),
        note_blocks: decoded.note_block_count(),
        redstone_dust: decoded.dust_count(),
        repeaters: decoded.repeater_count(),
        pitches: pitches.into_iter().collect(),
    }
}

fn print_human(result: &InspectResult) {
    println!("{} {}", "Schematic:".cyan().bold(), result.path);
    println!("  {} {}", "Format:".dimmed(), result.format);
    if let Some(name) = &result.name {
        println!("  {} {}", "Name:".dimmed(), name);
    }
    println!("  {} {}", "Dimensions:".dimmed(), result.dimensions);
    println!("  {} {}", "Blocks:".dimmed(), result.blocks);
    println!("  {} {}", "Note blocks:".dimmed(), result.note_blocks);
    println!("  {} {}", "Redstone dust:".dimmed(), result.redstone_dust);
    println!("  {} {}", "Repeaters:".dimmed(), result.repeaters);
    let pitches: Vec<String> = result.pitches.iter().map(|p| p.to_string()).collect();
    println!("  {} {}", "Pitches:".dimmed(), pitches.join(" "));
}
