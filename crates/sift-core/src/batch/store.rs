//! On-disk chunk files and the combined output.
//!
//! Each chunk lives at `<dir>/<offset>.json` as a JSON array of records.
//! Files are written once via a temporary sibling and a rename, and never
//! modified afterwards; their presence is what the resume logic relies on.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::types::EnrichmentRecord;
use crate::error::BatchError;
use crate::output::{OutputFormat, OutputWriter};

/// Directory of per-chunk result files.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    dir: PathBuf,
}

impl ChunkStore {
    /// Open (creating if needed) the chunk directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BatchError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| BatchError::CreateOutputDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn chunk_path(&self, offset: usize) -> PathBuf {
        self.dir.join(format!("{offset}.json"))
    }

    /// Offsets of every `<digits>.json` file, ascending.
    pub fn existing_offsets(&self) -> Result<Vec<usize>, BatchError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| BatchError::ReadChunk {
            path: self.dir.clone(),
            message: e.to_string(),
        })?;

        let mut offsets: Vec<usize> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| parse_chunk_name(&entry.file_name().to_string_lossy()))
            .collect();
        offsets.sort_unstable();
        Ok(offsets)
    }

    /// Persist one chunk's records.
    pub fn write_chunk(
        &self,
        offset: usize,
        records: &[EnrichmentRecord],
    ) -> Result<PathBuf, BatchError> {
        let path = self.chunk_path(offset);
        let tmp = self.dir.join(format!("{offset}.json.tmp"));
        let to_err = |source| BatchError::WriteChunk {
            path: path.clone(),
            source,
        };

        let json = serde_json::to_vec_pretty(records).map_err(|e| to_err(e.into()))?;
        fs::write(&tmp, json).map_err(to_err)?;
        fs::rename(&tmp, &path).map_err(to_err)?;
        Ok(path)
    }

    pub fn read_chunk(&self, offset: usize) -> Result<Vec<EnrichmentRecord>, BatchError> {
        let path = self.chunk_path(offset);
        let content = fs::read_to_string(&path).map_err(|e| BatchError::ReadChunk {
            path: path.clone(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| BatchError::ReadChunk {
            path,
            message: e.to_string(),
        })
    }

    /// Concatenate every chunk in ascending offset order into `output`.
    ///
    /// Returns the number of records written.
    pub fn combine(&self, output: &Path, format: OutputFormat) -> Result<usize, BatchError> {
        let mut records = Vec::new();
        for offset in self.existing_offsets()? {
            records.extend(self.read_chunk(offset)?);
        }

        let to_err = |source| BatchError::WriteCombined {
            path: output.to_path_buf(),
            source,
        };

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(to_err)?;
        }
        let file = File::create(output).map_err(to_err)?;
        let mut writer = OutputWriter::new(BufWriter::new(file), format, true);
        writer.write_all(&records).map_err(to_err)?;
        writer.flush().map_err(to_err)?;

        tracing::info!(
            path = %output.display(),
            records = writer.items_written(),
            "Wrote combined output"
        );
        Ok(writer.items_written())
    }
}

/// `"150.json"` → `Some(150)`; anything else → `None`.
fn parse_chunk_name(name: &str) -> Option<usize> {
    let stem = name.strip_suffix(".json")?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}
