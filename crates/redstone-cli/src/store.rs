//! On-disk result store.
//!
//! Each generation is stored under a fresh 16-hex-digit file id:
//!
//! ```text
//! <root>/<file_id>.litematic
//! <root>/<file_id>.schematic
//! <root>/<file_id>.json        metadata, written last
//! <root>/<file_id>.wav         preview renders
//! ```
//!
//! Every file is written to a temp file in the same directory and moved into
//! place with `persist_noclobber`, so readers never see a partial file. An
//! entry only counts as present once its metadata file exists.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use redstone_spec::{
    BackendError, ErrorKind, GenerationStats, Projection, SchematicFile, SchematicFormat,
    TransformParameters,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extension of the metadata file.
const METADATA_EXT: &str = "json";

/// Extension of preview renders.
const PREVIEW_EXT: &str = "wav";

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Errors from the result store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The id is not 16 lowercase hex digits.
    #[error("invalid file id '{0}'")]
    InvalidId(String),

    /// Nothing (complete) is stored under the id.
    #[error("file not found: {file_id}")]
    NotFound { file_id: String },

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// The target already exists.
    #[error("failed to persist store file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl BackendError for StoreError {
    fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "STORE_001",
            StoreError::InvalidId(_) => "STORE_002",
            StoreError::Io(_) => "STORE_003",
            StoreError::Metadata(_) => "STORE_004",
            StoreError::Persist(_) => "STORE_005",
        }
    }

    fn category(&self) -> &'static str {
        "store"
    }

    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } | StoreError::InvalidId(_) => ErrorKind::NotFound,
            _ => ErrorKind::Internal,
        }
    }
}

/// One stored schematic of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub format: SchematicFormat,
    /// Name offered for download, e.g. "song.litematic".
    pub file_name: String,
    pub byte_size: usize,
    pub hash: String,
}

impl From<&SchematicFile> for StoredFile {
    fn from(file: &SchematicFile) -> Self {
        Self {
            format: file.format,
            file_name: file.file_name(),
            byte_size: file.byte_size,
            hash: file.hash.clone(),
        }
    }
}

/// Metadata file contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub file_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub parameters: TransformParameters,
    pub stats: GenerationStats,
    pub projection: Projection,
    pub files: Vec<StoredFile>,
}

impl EntryMetadata {
    pub fn file(&self, format: SchematicFormat) -> Option<&StoredFile> {
        self.files.iter().find(|f| f.format == format)
    }
}

/// A stored schematic read back for download.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// What a cleanup pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Complete entries removed.
    pub entries: usize,
    /// Files removed, including previews and orphans.
    pub files: usize,
}

/// Directory-backed store of generated results.
#[derive(Debug)]
pub struct ResultStore {
    root: PathBuf,
}

/// Whether `id` is a well-formed file id.
pub fn is_valid_id(id: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[0-9a-f]{16}$").expect("valid regex"))
        .is_match(id)
}

fn check_id(id: &str) -> Result<(), StoreError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

fn not_found(id: &str) -> StoreError {
    StoreError::NotFound {
        file_id: id.to_string(),
    }
}

impl ResultStore {
    /// Opens the store at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Derives a fresh id from the request and the current time.
    pub fn new_file_id(&self, input: &[u8], parameters: &TransformParameters) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(input);
        hasher.update(serde_json::to_string(parameters).unwrap_or_default().as_bytes());
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        hasher.update(&nanos.to_le_bytes());
        hasher.update(&ID_COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());
        hasher.finalize().to_hex().as_str()[..16].to_string()
    }

    fn path(&self, id: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{}.{}", id, ext))
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist_noclobber(path)?;
        Ok(())
    }

    /// Stores an entry's schematics, then its metadata.
    pub fn save(&self, meta: &EntryMetadata, files: &[SchematicFile]) -> Result<(), StoreError> {
        check_id(&meta.file_id)?;
        for file in files {
            self.write_atomic(&self.path(&meta.file_id, file.format.extension()), &file.bytes)?;
        }
        let json = serde_json::to_vec_pretty(meta)?;
        self.write_atomic(&self.path(&meta.file_id, METADATA_EXT), &json)?;
        info!(file_id = %meta.file_id, files = files.len(), "stored result");
        Ok(())
    }

    /// Reads an entry's metadata.
    pub fn metadata(&self, file_id: &str) -> Result<EntryMetadata, StoreError> {
        check_id(file_id)?;
        let bytes = read_or_not_found(&self.path(file_id, METADATA_EXT), file_id)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Reads one schematic of a complete entry.
    pub fn open_file(&self, file_id: &str, format: SchematicFormat) -> Result<Download, StoreError> {
        let meta = self.metadata(file_id)?;
        let stored = meta.file(format).ok_or_else(|| not_found(file_id))?;
        let bytes = read_or_not_found(&self.path(file_id, format.extension()), file_id)?;
        Ok(Download {
            file_name: stored.file_name.clone(),
            bytes,
        })
    }

    /// Stores a preview render.
    pub fn save_preview(&self, file_id: &str, wav: &[u8]) -> Result<(), StoreError> {
        check_id(file_id)?;
        self.write_atomic(&self.path(file_id, PREVIEW_EXT), wav)?;
        debug!(file_id, bytes = wav.len(), "stored preview");
        Ok(())
    }

    pub fn open_preview(&self, file_id: &str) -> Result<Vec<u8>, StoreError> {
        check_id(file_id)?;
        read_or_not_found(&self.path(file_id, PREVIEW_EXT), file_id)
    }

    /// Complete entries, newest first.
    pub fn list(&self) -> Result<Vec<EntryMetadata>, StoreError> {
        let mut entries = Vec::new();
        for path in self.files()? {
            let Some(id) = entry_id(&path, METADATA_EXT) else {
                continue;
            };
            match self.metadata(&id) {
                Ok(meta) => entries.push(meta),
                Err(e) => warn!(file_id = %id, error = %e, "skipping unreadable entry"),
            }
        }
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.file_id.cmp(&b.file_id))
        });
        Ok(entries)
    }

    /// Removes everything older than `max_age`.
    pub fn cleanup(&self, max_age: chrono::Duration) -> Result<CleanupReport, StoreError> {
        self.cleanup_before(Utc::now() - max_age)
    }

    /// Removes entries created before `cutoff`, plus previews and orphaned
    /// files last modified before it.
    pub fn cleanup_before(&self, cutoff: DateTime<Utc>) -> Result<CleanupReport, StoreError> {
        let mut report = CleanupReport::default();
        let mut expired = HashSet::new();
        let mut live = HashSet::new();

        for meta in self.list()? {
            if meta.created_at < cutoff {
                // Metadata goes first so the entry disappears before its data.
                if remove_if_present(&self.path(&meta.file_id, METADATA_EXT))? {
                    report.files += 1;
                    report.entries += 1;
                }
                expired.insert(meta.file_id);
            } else {
                live.insert(meta.file_id);
            }
        }

        for path in self.files()? {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            if live.contains(&stem) {
                continue;
            }
            let stale = expired.contains(&stem) || modified_before(&path, cutoff)?;
            if stale && remove_if_present(&path)? {
                report.files += 1;
            }
        }

        if report.files > 0 {
            info!(entries = report.entries, files = report.files, "cleaned up result store");
        }
        Ok(report)
    }

    fn files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                StoreError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "store walk failed")
                }))
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

fn entry_id(path: &Path, ext: &str) -> Option<String> {
    if path.extension()?.to_str()? != ext {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    is_valid_id(stem).then(|| stem.to_string())
}

fn read_or_not_found(path: &Path, file_id: &str) -> Result<Vec<u8>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found(file_id)),
        Err(e) => Err(e.into()),
    }
}

/// False for a file that has already been removed.
fn modified_before(path: &Path, cutoff: DateTime<Utc>) -> Result<bool, StoreError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    let modified: DateTime<Utc> = metadata.modified()?.into();
    Ok(modified < cutoff)
}

/// Removes `path`. A file that is already gone is not an error; another
/// cleanup pass may have taken it first.
fn remove_if_present(path: &Path) -> std::io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
