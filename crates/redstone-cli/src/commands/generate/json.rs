//! JSON output mode for the generate command.

use anyhow::Result;
use std::process::ExitCode;
use std::time::Instant;

use super::{prepare, write_outputs, GenerateOptions};
use crate::commands::json_output::{
    error_codes, print_json, GenerateOutput, GenerateResult, GeneratedFile, JsonError,
};
use crate::pipeline::{AudioInput, Pipeline};
use crate::reporter::ConsoleReporter;

/// Run generate with machine-readable JSON output.
pub fn run_json(options: &GenerateOptions) -> Result<ExitCode> {
    let (output, code) = generate_json(options);
    print_json(&output)?;
    Ok(ExitCode::from(code))
}

/// Runs the command and builds its output record with the exit code.
pub(super) fn generate_json(options: &GenerateOptions) -> (GenerateOutput, u8) {
    let start = Instant::now();

    let job = match prepare(options) {
        Ok(job) => job,
        Err(e) => return (GenerateOutput::failure(e.to_json_errors()), 1),
    };

    let generated = Pipeline::new(&job.config).and_then(|pipeline| {
        let input = AudioInput::new(&job.audio.bytes, job.audio.hint.as_deref());
        pipeline.generate(input, &job.name, &job.params, &ConsoleReporter::quiet())
    });
    let generated = match generated {
        Ok(generated) => generated,
        Err(e) => return (GenerateOutput::failure(vec![JsonError::from_pipeline(&e)]), 2),
    };

    let paths = match write_outputs(&options.out_dir, &generated.files) {
        Ok(paths) => paths,
        Err(e) => {
            let error = JsonError::new(error_codes::FILE_WRITE, e.to_string())
                .with_file(options.out_dir.display().to_string());
            return (GenerateOutput::failure(vec![error]), 1);
        }
    };

    let files = paths
        .iter()
        .zip(&generated.files)
        .map(|(path, file)| GeneratedFile {
            format: file.format,
            path: path.display().to_string(),
            byte_size: file.byte_size,
            hash: file.hash.clone(),
        })
        .collect();

    let result = GenerateResult {
        name: generated.name.clone(),
        stats: generated.stats(),
        projection: generated.projection(),
        files,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    (GenerateOutput::success(result), 0)
}
