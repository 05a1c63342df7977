//! Redstone Music CLI - turns recorded melodies into note-block circuits
//!
//! This binary converts audio files into Minecraft schematics, renders
//! previews of what the circuit will play, inspects schematic files and
//! serves the same pipeline over HTTP.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use redstone_cli::commands::{self, ConfigSource};
use redstone_cli::config::TransformOverrides;
use redstone_cli::logging;
use redstone_spec::Density;

/// Redstone Music - melody to note-block circuit converter
#[derive(Parser)]
#[command(name = "redstone")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log debug detail (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command that runs the transform.
#[derive(Args, Debug, Default)]
struct TransformArgs {
    /// Semitones to shift every note by (-24..=24)
    #[arg(long, allow_hyphen_values = true)]
    pitch: Option<i32>,

    /// Octaves to shift every note by (-4..=4)
    #[arg(long, allow_hyphen_values = true)]
    octave: Option<i32>,

    /// Playback speed multiplier (above 0, at most 16)
    #[arg(long)]
    speed: Option<f64>,

    /// Note density: low, medium or high
    #[arg(long)]
    density: Option<Density>,

    /// Keep at most this many notes
    #[arg(long)]
    max_notes: Option<usize>,

    /// Snap notes to the inferred key
    #[arg(long)]
    auto_tune: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Parameter preset (basic, advanced)
    #[arg(long)]
    preset: Option<String>,
}

impl TransformArgs {
    fn into_source(self) -> ConfigSource {
        ConfigSource {
            path: self.config,
            preset: self.preset,
            overrides: TransformOverrides {
                pitch: self.pitch,
                octave: self.octave,
                speed: self.speed,
                density: self.density,
                max_notes: self.max_notes,
                auto_tune: self.auto_tune,
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an audio file into schematic files
    Generate {
        /// Audio file (mp3, wav, ogg, flac, m4a, aac)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Schematic format to write (default: the configured formats)
        #[arg(long, value_parser = ["litematic", "schematic", "both"])]
        format: Option<String>,

        /// Schematic name (default: derived from the input file name)
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        transform: TransformArgs,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Render the transformed melody as a WAV preview
    Preview {
        /// Audio file (mp3, wav, ogg, flac, m4a, aac)
        #[arg(short, long)]
        input: PathBuf,

        /// WAV file to write
        #[arg(short, long, default_value = "preview.wav")]
        output: PathBuf,

        #[command(flatten)]
        transform: TransformArgs,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Print the dimensions and block counts of a schematic file
    Inspect {
        /// Path to a .litematic or .schematic file
        file: PathBuf,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Serve the pipeline over HTTP
    #[cfg(feature = "serve")]
    Serve {
        /// Port to listen on (default: 5000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (default: 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Directory for generated files
        #[arg(long)]
        store: Option<PathBuf>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Parameter preset (basic, advanced)
        #[arg(long)]
        preset: Option<String>,
    },
}

#[cfg(feature = "serve")]
fn serve(
    port: Option<u16>,
    host: Option<String>,
    store: Option<PathBuf>,
    config: Option<PathBuf>,
    preset: Option<String>,
) -> anyhow::Result<ExitCode> {
    let mut config = redstone_cli::RedstoneConfig::load(config.as_deref(), preset.as_deref())?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(store) = store {
        config.server.store_dir = store;
    }

    let problems = config.validate();
    if !problems.is_empty() {
        anyhow::bail!("invalid configuration:\n  - {}", problems.join("\n  - "));
    }
    commands::serve::run(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            input,
            out_dir,
            format,
            name,
            transform,
            json,
        } => format
            .as_deref()
            .map(commands::generate::parse_formats)
            .transpose()
            .and_then(|formats| {
                commands::generate::run(&commands::generate::GenerateOptions {
                    input,
                    out_dir: out_dir.unwrap_or_else(|| PathBuf::from(".")),
                    formats,
                    name,
                    source: transform.into_source(),
                    json,
                })
            }),
        Commands::Preview {
            input,
            output,
            transform,
            json,
        } => commands::preview::run(&commands::preview::PreviewOptions {
            input,
            output,
            source: transform.into_source(),
            json,
        }),
        Commands::Inspect { file, json } => {
            commands::inspect::run(&commands::inspect::InspectOptions { path: file, json })
        }
        #[cfg(feature = "serve")]
        Commands::Serve {
            port,
            host,
            store,
            config,
            preset,
        } => serve(port, host, store, config, preset),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
