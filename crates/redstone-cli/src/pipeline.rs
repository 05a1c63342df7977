//! The five-stage audio-to-schematic pipeline.
//!
//! One request runs decode, extract, transform, map and serialize in order on
//! the calling thread. Between stages the pipeline reports progress; a
//! reporter answering `Err(Cancelled)` stops it at that checkpoint and every
//! in-progress buffer is dropped. Nothing reaches the result store until all
//! stages have succeeded.

use chrono::Utc;
use redstone_backend_audio::{render_preview_wav, NoteExtractor, WaveformDecoder};
use redstone_backend_circuit::{transform, CircuitMapper, MappedCircuit};
use redstone_backend_schematic::{serialize, SerializeOptions};
use redstone_spec::timing::{ticks_to_seconds, SAMPLE_RATE};
use redstone_spec::{
    ErrorKind, GenerationStats, NoteSequence, PipelineError, ProgressEvent, ProgressReporter,
    Projection, SchematicFile, SchematicFormat, TransformParameters,
};
use tracing::{debug, error, info};

use crate::config::{LongAudioPolicy, RedstoneConfig};
use crate::store::{EntryMetadata, ResultStore, StoredFile};

/// Progress checkpoints, in pipeline order.
pub mod stages {
    pub const READING: (u8, &str) = (5, "reading audio");
    pub const DECODING: (u8, &str) = (15, "decoding");
    pub const EXTRACTING: (u8, &str) = (25, "extracting notes");
    pub const TRANSFORMING: (u8, &str) = (40, "transforming sequence");
    pub const MAPPING: (u8, &str) = (55, "mapping circuit");
    pub const SERIALIZING: (u8, &str) = (75, "serializing");
    pub const RENDERING: (u8, &str) = (75, "rendering preview");
    pub const STORING: (u8, &str) = (95, "storing");
}

/// Audio handed to the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct AudioInput<'a> {
    pub bytes: &'a [u8],
    /// File extension or MIME type, when the client sent one.
    pub hint: Option<&'a str>,
}

impl<'a> AudioInput<'a> {
    pub fn new(bytes: &'a [u8], hint: Option<&'a str>) -> Self {
        Self { bytes, hint }
    }
}

/// Transformed melody plus the note budget it was held to.
#[derive(Debug)]
pub struct Analysis {
    pub sequence: NoteSequence,
    /// Set when the long-audio policy lowered `max_notes`.
    pub applied_max_notes: Option<usize>,
}

/// Result of a full generation, before storage.
#[derive(Debug)]
pub struct Generated {
    pub name: String,
    pub sequence: NoteSequence,
    pub applied_max_notes: Option<usize>,
    pub circuit: MappedCircuit,
    pub files: Vec<SchematicFile>,
}

impl Generated {
    /// The container whose size is reported; litematic when present.
    pub fn primary_file(&self) -> Option<&SchematicFile> {
        self.files
            .iter()
            .find(|f| f.format == SchematicFormat::Litematic)
            .or_else(|| self.files.first())
    }

    pub fn stats(&self) -> GenerationStats {
        GenerationStats {
            notes: self.sequence.len(),
            redstone_length: self.circuit.stats.redstone_length,
            duration: self.circuit.stats.duration_seconds,
            file_size: self.primary_file().map_or(0, |f| f.byte_size),
            applied_max_notes: self.applied_max_notes,
        }
    }

    pub fn projection(&self) -> Projection {
        let stats = &self.circuit.stats;
        Projection {
            name: self.name.clone(),
            dimensions: stats.dimensions,
            note_blocks: stats.note_blocks,
            redstone_dust: stats.redstone_dust,
            repeaters: stats.repeaters,
        }
    }

    /// Store metadata for this result under `file_id`.
    pub fn metadata(&self, file_id: &str, parameters: &TransformParameters) -> EntryMetadata {
        EntryMetadata {
            file_id: file_id.to_string(),
            name: self.name.clone(),
            created_at: Utc::now(),
            parameters: parameters.clone(),
            stats: self.stats(),
            projection: self.projection(),
            files: self.files.iter().map(StoredFile::from).collect(),
        }
    }
}

/// Result of a preview run.
#[derive(Debug)]
pub struct Previewed {
    pub sequence: NoteSequence,
    pub applied_max_notes: Option<usize>,
    /// 16-bit mono WAV bytes.
    pub wav: Vec<u8>,
    pub duration_seconds: f64,
    pub sample_rate: u32,
}

/// Stateless pipeline; one instance serves any number of requests.
#[derive(Debug, Clone)]
pub struct Pipeline {
    decoder: WaveformDecoder,
    extractor: NoteExtractor,
    mapper: CircuitMapper,
    long_audio: LongAudioPolicy,
    formats: Vec<SchematicFormat>,
    author: String,
    description: String,
    timestamp_ms: Option<i64>,
}

fn checkpoint<R: ProgressReporter + ?Sized>(
    reporter: &R,
    (progress, message): (u8, &str),
) -> Result<(), PipelineError> {
    reporter.step(progress, message).map_err(|_| {
        debug!(progress, "pipeline cancelled");
        PipelineError::cancelled()
    })
}

impl Pipeline {
    /// Builds a pipeline from validated configuration.
    pub fn new(config: &RedstoneConfig) -> Result<Self, PipelineError> {
        config.extractor.validate().map_err(PipelineError::from_backend)?;
        config.mapper.validate().map_err(PipelineError::from_backend)?;
        if config.output.formats.is_empty() {
            return Err(PipelineError::new(
                ErrorKind::Parameter,
                "PIPELINE_003",
                "at least one output format is required",
            ));
        }

        let mut formats = config.output.formats.clone();
        formats.sort();
        formats.dedup();

        Ok(Self {
            decoder: WaveformDecoder::new(),
            extractor: NoteExtractor::new(config.extractor),
            mapper: CircuitMapper::new(config.mapper),
            long_audio: config.long_audio.clone(),
            formats,
            author: config.output.author.clone(),
            description: config.output.description.clone(),
            timestamp_ms: None,
        })
    }

    /// Pins the schematic timestamps, making output reproducible.
    pub fn with_timestamp(mut self, millis: i64) -> Self {
        self.timestamp_ms = Some(millis);
        self
    }

    pub fn formats(&self) -> &[SchematicFormat] {
        &self.formats
    }

    /// Decodes, extracts and transforms. Reports up to "transforming sequence".
    pub fn analyze<R: ProgressReporter + ?Sized>(
        &self,
        input: AudioInput<'_>,
        params: &TransformParameters,
        reporter: &R,
    ) -> Result<Analysis, PipelineError> {
        params.validate()?;

        checkpoint(reporter, stages::READING)?;
        debug!(bytes = input.bytes.len(), hint = ?input.hint, "read audio");

        checkpoint(reporter, stages::DECODING)?;
        let buffer = self
            .decoder
            .decode(input.bytes, input.hint)
            .map_err(PipelineError::from_backend)?;
        info!(
            samples = buffer.len(),
            seconds = buffer.duration_seconds(),
            "decoded audio"
        );

        let capped = self.long_audio.adjust(buffer.duration_seconds(), params);
        if let Some(capped) = &capped {
            info!(
                seconds = buffer.duration_seconds(),
                max_notes = capped.max_notes,
                requested = params.max_notes,
                density = %capped.density,
                "applied long-audio note budget"
            );
        }
        let applied_max_notes = capped.as_ref().map(|p| p.max_notes);
        let params = capped.as_ref().unwrap_or(params);

        checkpoint(reporter, stages::EXTRACTING)?;
        let extracted = self
            .extractor
            .extract(&buffer)
            .map_err(PipelineError::from_backend)?;
        drop(buffer);

        checkpoint(reporter, stages::TRANSFORMING)?;
        let sequence = transform(&extracted, params).map_err(PipelineError::from_backend)?;
        info!(
            extracted = extracted.len(),
            kept = sequence.len(),
            "transformed sequence"
        );
        Ok(Analysis {
            sequence,
            applied_max_notes,
        })
    }

    /// Runs every stage up to serialization.
    pub fn generate<R: ProgressReporter + ?Sized>(
        &self,
        input: AudioInput<'_>,
        name: &str,
        params: &TransformParameters,
        reporter: &R,
    ) -> Result<Generated, PipelineError> {
        let Analysis {
            sequence,
            applied_max_notes,
        } = self.analyze(input, params, reporter)?;

        checkpoint(reporter, stages::MAPPING)?;
        let circuit = self.mapper.map(&sequence).map_err(PipelineError::from_backend)?;

        checkpoint(reporter, stages::SERIALIZING)?;
        let now = self
            .timestamp_ms
            .unwrap_or_else(|| Utc::now().timestamp_millis());
        let options = SerializeOptions {
            name: name.to_string(),
            author: self.author.clone(),
            description: self.description.clone(),
            ..Default::default()
        }
        .at(now);
        let files = self
            .formats
            .iter()
            .map(|&format| serialize(&circuit.layout, format, &options))
            .collect::<Result<Vec<_>, _>>()
            .map_err(PipelineError::from_backend)?;

        Ok(Generated {
            name: name.to_string(),
            sequence,
            applied_max_notes,
            circuit,
            files,
        })
    }

    /// Generates, stores the result and sends the terminal event.
    ///
    /// On failure the reporter gets a `Failed` event with the client-safe
    /// message, unless the run was cancelled.
    pub fn generate_and_store<R: ProgressReporter + ?Sized>(
        &self,
        store: &ResultStore,
        input: AudioInput<'_>,
        name: &str,
        params: &TransformParameters,
        reporter: &R,
    ) -> Result<EntryMetadata, PipelineError> {
        match self.store_generation(store, input, name, params, reporter) {
            Ok(meta) => {
                let formats = meta.files.iter().map(|f| f.format.to_string()).collect();
                let _ = reporter.report(ProgressEvent::complete(
                    meta.stats.clone(),
                    meta.projection.clone(),
                    meta.file_id.clone(),
                    formats,
                ));
                Ok(meta)
            }
            Err(e) => {
                if e.kind != ErrorKind::Cancelled {
                    if e.kind == ErrorKind::Internal {
                        error!(code = e.code, error = %e, "generation failed");
                    } else {
                        info!(code = e.code, error = %e, "generation rejected");
                    }
                    let _ = reporter.report(ProgressEvent::failed(e.client_message()));
                }
                Err(e)
            }
        }
    }

    fn store_generation<R: ProgressReporter + ?Sized>(
        &self,
        store: &ResultStore,
        input: AudioInput<'_>,
        name: &str,
        params: &TransformParameters,
        reporter: &R,
    ) -> Result<EntryMetadata, PipelineError> {
        let generated = self.generate(input, name, params, reporter)?;

        checkpoint(reporter, stages::STORING)?;
        let file_id = store.new_file_id(input.bytes, params);
        let meta = generated.metadata(&file_id, params);
        store
            .save(&meta, &generated.files)
            .map_err(PipelineError::from_backend)?;
        Ok(meta)
    }

    /// Analyzes and renders the transformed sequence as a WAV preview.
    pub fn preview<R: ProgressReporter + ?Sized>(
        &self,
        input: AudioInput<'_>,
        params: &TransformParameters,
        reporter: &R,
    ) -> Result<Previewed, PipelineError> {
        let Analysis {
            sequence,
            applied_max_notes,
        } = self.analyze(input, params, reporter)?;

        checkpoint(reporter, stages::RENDERING)?;
        let wav = render_preview_wav(&sequence, SAMPLE_RATE).map_err(PipelineError::from_backend)?;
        let duration_seconds = ticks_to_seconds(sequence.duration_ticks());
        info!(notes = sequence.len(), bytes = wav.len(), "rendered preview");

        Ok(Previewed {
            sequence,
            applied_max_notes,
            wav,
            duration_seconds,
            sample_rate: SAMPLE_RATE,
        })
    }
}
